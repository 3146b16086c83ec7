use crate::adapters::{
    ConnectionContext, ConsoleSink, HttpSink, HttpSource, PrestoSource, SqlSource, TableSink,
};
use crate::config::job::{timeout, JobConfig, SinkConfig, SourceConfig, TransformConfig, TransformType};
use crate::core::etl::EtlEngine;
use crate::core::pipeline::EtlPipeline;
use crate::core::transforms::{Passthrough, UppercaseText};
use crate::core::{RecordSink, RecordSource, RunReport, Transform};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::redact;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Load,
    /// Print the transformed records instead of loading them.
    DryRun,
}

pub async fn build_source(
    config: &SourceConfig,
    connections: &mut ConnectionContext,
) -> Result<Box<dyn RecordSource>> {
    match config {
        SourceConfig::Sql { url, .. } => {
            let db = connections.open(url).await?;
            Ok(Box::new(SqlSource::new(db)))
        }
        SourceConfig::Presto { .. } => {
            let settings = config
                .presto_settings()?
                .ok_or_else(|| EtlError::MissingConfigError {
                    field: "source.host".to_string(),
                })?;
            Ok(Box::new(PrestoSource::new(settings)?))
        }
        SourceConfig::Http {
            endpoint,
            timeout_seconds,
        } => Ok(Box::new(HttpSource::new(endpoint.clone(), timeout(*timeout_seconds))?)),
    }
}

pub fn build_transform(config: &TransformConfig) -> Box<dyn Transform> {
    match config.kind {
        TransformType::ColumnMap => Box::new(config.column_mapper()),
        TransformType::Passthrough => Box::new(Passthrough),
        TransformType::Uppercase => Box::new(UppercaseText),
    }
}

pub async fn build_sink(
    config: &SinkConfig,
    connections: &mut ConnectionContext,
) -> Result<Box<dyn RecordSink>> {
    match config {
        SinkConfig::Http {
            headers,
            timeout_seconds,
            ..
        } => Ok(Box::new(HttpSink::new(headers, timeout(*timeout_seconds))?)),
        SinkConfig::Table {
            url,
            commit,
            column_list,
            ..
        } => {
            let db = connections.open(url).await?;
            Ok(Box::new(
                TableSink::new(db)
                    .with_commit_mode(*commit)
                    .with_column_list(*column_list),
            ))
        }
    }
}

/// Runs one job end to end. Pools opened for the job are closed before
/// returning, on success and on failure.
pub async fn run_job(config: &JobConfig, mode: RunMode, monitor: bool) -> Result<RunReport> {
    let mut connections = ConnectionContext::new();
    let result = execute(config, mode, monitor, &mut connections).await;
    connections.close().await;
    result
}

async fn execute(
    config: &JobConfig,
    mode: RunMode,
    monitor: bool,
    connections: &mut ConnectionContext,
) -> Result<RunReport> {
    tracing::info!("🚀 Running job '{}'", config.job.name);

    let source = build_source(&config.source, connections).await?;
    let transform = build_transform(&config.transform);
    let sink: Box<dyn RecordSink> = match mode {
        RunMode::Load => build_sink(&config.sink, connections).await?,
        RunMode::DryRun => {
            tracing::info!("🔍 DRY RUN MODE - nothing will be written");
            Box::new(ConsoleSink::stdout())
        }
    };

    let mut engine = EtlEngine::new_with_monitoring(EtlPipeline::new(source, transform, sink), monitor);
    engine
        .run(config.query(), config.destination(), &config.transform.options)
        .await
}

/// One-line-per-setting view of a job, secrets redacted.
pub fn describe(config: &JobConfig) -> Vec<String> {
    let mut lines = vec![format!("Job: {}", config.job.name)];
    if let Some(description) = &config.job.description {
        lines.push(format!("Description: {}", description));
    }

    lines.push(match &config.source {
        SourceConfig::Sql { url, .. } => format!("Source: sql {}", redact(url)),
        SourceConfig::Presto { host, .. } => format!(
            "Source: presto {}",
            host.as_deref().unwrap_or("(PRESTO_HOST)")
        ),
        SourceConfig::Http { endpoint, .. } => format!("Source: http {}", endpoint),
    });
    if !config.query().is_empty() {
        lines.push(format!("Query: {}", config.query()));
    }

    lines.push(format!("Transform: {:?}", config.transform.kind));
    let options = &config.transform.options;
    if !options.rename_columns.is_empty() {
        lines.push(format!("Rename columns: {:?}", options.rename_columns));
    }
    if !options.insert_columns.is_empty() {
        lines.push(format!(
            "Insert columns: {}",
            serde_json::Value::Object(options.insert_columns.clone())
        ));
    }

    lines.push(match &config.sink {
        SinkConfig::Http { url, .. } => format!("Sink: http POST {}", url),
        SinkConfig::Table {
            url, table, commit, ..
        } => format!("Sink: table {} at {} ({:?} commit)", table, redact(url), commit),
    });
    lines
}
