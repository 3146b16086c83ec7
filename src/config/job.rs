use crate::adapters::presto::PrestoSettings;
use crate::adapters::table_sink::CommitMode;
use crate::core::mapper::{BooleanRecast, ColumnMapper, ColumnRename};
use crate::core::TransformOptions;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_connection_url, validate_identifier, validate_non_empty_string, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub job: JobSection,
    pub source: SourceConfig,
    #[serde(default)]
    pub transform: TransformConfig,
    pub sink: SinkConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSection {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Relational database reached through a connection URL.
    Sql { url: String, query: String },
    /// Presto coordinator; unset fields fall back to `PRESTO_*` variables.
    Presto {
        query: String,
        host: Option<String>,
        port: Option<u16>,
        user: Option<String>,
        password: Option<String>,
        catalog: Option<String>,
        schema: Option<String>,
        http_scheme: Option<String>,
        verify_tls: Option<bool>,
        timeout_seconds: Option<u64>,
    },
    /// JSON GET endpoint.
    Http {
        endpoint: String,
        timeout_seconds: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformType {
    ColumnMap,
    #[default]
    Passthrough,
    Uppercase,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformConfig {
    #[serde(default, rename = "type")]
    pub kind: TransformType,
    #[serde(default)]
    pub columns: Vec<ColumnRename>,
    pub recast: Option<BooleanRecast>,
    #[serde(default)]
    pub options: TransformOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    Http {
        url: String,
        #[serde(default)]
        headers: BTreeMap<String, String>,
        timeout_seconds: Option<u64>,
    },
    Table {
        url: String,
        table: String,
        #[serde(default)]
        commit: CommitMode,
        #[serde(default)]
        column_list: bool,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl JobConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn query(&self) -> &str {
        match &self.source {
            SourceConfig::Sql { query, .. } | SourceConfig::Presto { query, .. } => query,
            SourceConfig::Http { .. } => "",
        }
    }

    /// Endpoint URL for the HTTP sink, table name for the table sink.
    pub fn destination(&self) -> &str {
        match &self.sink {
            SinkConfig::Http { url, .. } => url,
            SinkConfig::Table { table, .. } => table,
        }
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

/// Replaces `${VAR}` with the environment value; unknown variables stay as written.
pub fn substitute_env_vars(content: &str) -> String {
    static VAR: OnceLock<Regex> = OnceLock::new();
    let re = VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .into_owned()
}

impl SourceConfig {
    pub fn presto_settings(&self) -> Result<Option<PrestoSettings>> {
        self.presto_settings_with(|key| std::env::var(key).ok())
    }

    /// Explicit fields win over the `PRESTO_*` lookup.
    pub fn presto_settings_with<F>(&self, lookup: F) -> Result<Option<PrestoSettings>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let SourceConfig::Presto {
            host,
            port,
            user,
            password,
            catalog,
            schema,
            http_scheme,
            verify_tls,
            timeout_seconds,
            ..
        } = self
        else {
            return Ok(None);
        };

        let overrides: BTreeMap<&str, Option<String>> = [
            ("PRESTO_HOST", host.clone()),
            ("PRESTO_PORT", port.map(|p| p.to_string())),
            ("PRESTO_USERNAME", user.clone()),
            ("PRESTO_PASSWORD", password.clone()),
            ("PRESTO_CATALOG", catalog.clone()),
            ("PRESTO_SCHEMA", schema.clone()),
            ("PRESTO_HTTP_SCHEME", http_scheme.clone()),
            ("PRESTO_VERIFY_TLS", verify_tls.map(|v| v.to_string())),
        ]
        .into();

        let mut settings = PrestoSettings::from_lookup(|key| {
            overrides
                .get(key)
                .cloned()
                .flatten()
                .or_else(|| lookup(key))
        })?;
        settings.timeout_seconds = *timeout_seconds;
        Ok(Some(settings))
    }
}

impl TransformConfig {
    pub fn column_mapper(&self) -> ColumnMapper {
        ColumnMapper {
            columns: self.columns.clone(),
            recast: self.recast.clone(),
        }
    }
}

pub fn timeout(seconds: Option<u64>) -> Option<Duration> {
    seconds.map(Duration::from_secs)
}

impl Validate for JobConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("job.name", &self.job.name)?;

        match &self.source {
            SourceConfig::Sql { url, query } => {
                validate_connection_url("source.url", url)?;
                validate_non_empty_string("source.query", query)?;
            }
            SourceConfig::Presto { query, .. } => {
                validate_non_empty_string("source.query", query)?;
                self.source.presto_settings()?;
            }
            SourceConfig::Http { endpoint, .. } => validate_url("source.endpoint", endpoint)?,
        }

        let transform = &self.transform;
        if transform.kind == TransformType::ColumnMap {
            if transform.columns.is_empty() {
                return Err(EtlError::ConfigValidationError {
                    field: "transform.columns".to_string(),
                    message: "column_map needs at least one column".to_string(),
                });
            }
            for column in &transform.columns {
                validate_non_empty_string("transform.columns.from", &column.from)?;
                validate_non_empty_string("transform.columns.to", &column.to)?;
            }
            if let Some(recast) = &transform.recast {
                if !transform.columns.iter().any(|c| c.to == recast.field) {
                    return Err(EtlError::InvalidConfigValueError {
                        field: "transform.recast.field".to_string(),
                        value: recast.field.clone(),
                        reason: "Must be one of the mapped destination fields".to_string(),
                    });
                }
            }
        } else if !transform.columns.is_empty() || transform.recast.is_some() {
            tracing::warn!(
                "transform.columns and transform.recast are only used by type = \"column_map\""
            );
        }

        match &self.sink {
            SinkConfig::Http { url, .. } => validate_url("sink.url", url)?,
            SinkConfig::Table { url, table, .. } => {
                validate_connection_url("sink.url", url)?;
                validate_identifier("sink.table", table)?;
            }
        }

        Ok(())
    }
}
