use crate::core::{Pipeline, PipelineState, RunReport, TransformOptions};
use crate::utils::error::Result;
use crate::utils::monitor::StageMonitor;
use chrono::Utc;
use std::time::Instant;

/// Runs extract, transform and load in sequence and tracks where a run stopped.
///
/// There is no resume: every call to [`EtlEngine::run`] starts again from
/// [`PipelineState::Idle`].
pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    state: PipelineState,
    monitor: StageMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            state: PipelineState::Idle,
            monitor: StageMonitor::new(monitor_enabled),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn enter(&mut self, state: PipelineState) {
        tracing::debug!("Pipeline state {} -> {}", self.state, state);
        self.state = state;
    }

    fn fail<T>(&mut self, stage: PipelineState, result: Result<T>) -> Result<T> {
        result.inspect_err(|e| {
            tracing::error!(stage = %stage, "❌ Stage failed: {}", e);
            self.enter(PipelineState::Failed);
        })
    }

    pub async fn run(
        &mut self,
        query: &str,
        destination: &str,
        options: &TransformOptions,
    ) -> Result<RunReport> {
        let started_at = Utc::now();
        let timer = Instant::now();
        self.state = PipelineState::Idle;
        tracing::info!("Starting ETL process");

        // Extract
        self.enter(PipelineState::Extracting);
        let extracted = self.pipeline.extract(query).await;
        let raw_data = self.fail(PipelineState::Extracting, extracted)?;
        let records_extracted = raw_data.len();
        tracing::info!("Extracted {} records", records_extracted);
        self.monitor.record(PipelineState::Extracting);

        // Transform
        self.enter(PipelineState::Transforming);
        let transformed = self.pipeline.transform(raw_data, options).await;
        let transformed = self.fail(PipelineState::Transforming, transformed)?;
        tracing::info!("Transformed {} records", transformed.len());
        self.monitor.record(PipelineState::Transforming);

        // Load
        self.enter(PipelineState::Loading);
        let loaded = self.pipeline.load(destination, transformed).await;
        let report = self.fail(PipelineState::Loading, loaded)?;
        tracing::info!(
            "Loaded {} records into {}",
            report.records_written,
            report.destination
        );
        self.monitor.record(PipelineState::Loading);

        self.enter(PipelineState::Done);
        Ok(RunReport {
            destination: report.destination,
            records_extracted,
            records_loaded: report.records_written,
            response: report.response,
            started_at,
            duration: timer.elapsed(),
        })
    }
}
