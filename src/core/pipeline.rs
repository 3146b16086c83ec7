use crate::core::{LoadReport, Pipeline, Record, RecordSink, RecordSource, Transform, TransformOptions};
use crate::utils::error::Result;

/// Binds one source, one transform and one sink into a [`Pipeline`].
pub struct EtlPipeline<S: RecordSource, T: Transform, K: RecordSink> {
    source: S,
    transformer: T,
    sink: K,
}

impl<S: RecordSource, T: Transform, K: RecordSink> EtlPipeline<S, T, K> {
    pub fn new(source: S, transformer: T, sink: K) -> Self {
        Self {
            source,
            transformer,
            sink,
        }
    }
}

#[async_trait::async_trait]
impl<S: RecordSource, T: Transform, K: RecordSink> Pipeline for EtlPipeline<S, T, K> {
    async fn extract(&self, query: &str) -> Result<Vec<Record>> {
        tracing::debug!("Running source query: {}", query);
        self.source.fetch(query).await
    }

    async fn transform(&self, data: Vec<Record>, options: &TransformOptions) -> Result<Vec<Record>> {
        self.transformer.transform(data, options)
    }

    async fn load(&self, destination: &str, data: Vec<Record>) -> Result<LoadReport> {
        self.sink.write(destination, &data).await
    }
}
