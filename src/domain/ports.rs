use crate::domain::model::{LoadReport, Record, TransformOptions};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Runs a query and materializes the whole result set, in engine order.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(&self, query: &str) -> Result<Vec<Record>>;
}

/// Reshapes extracted records. Implementations apply `options` last.
pub trait Transform: Send + Sync {
    fn transform(&self, data: Vec<Record>, options: &TransformOptions) -> Result<Vec<Record>>;
}

/// Writes records to a destination (an endpoint URL or a table name).
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn write(&self, destination: &str, records: &[Record]) -> Result<LoadReport>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self, query: &str) -> Result<Vec<Record>>;
    async fn transform(&self, data: Vec<Record>, options: &TransformOptions) -> Result<Vec<Record>>;
    async fn load(&self, destination: &str, data: Vec<Record>) -> Result<LoadReport>;
}

#[async_trait]
impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    async fn fetch(&self, query: &str) -> Result<Vec<Record>> {
        (**self).fetch(query).await
    }
}

impl<T: Transform + ?Sized> Transform for Box<T> {
    fn transform(&self, data: Vec<Record>, options: &TransformOptions) -> Result<Vec<Record>> {
        (**self).transform(data, options)
    }
}

#[async_trait]
impl<K: RecordSink + ?Sized> RecordSink for Box<K> {
    async fn write(&self, destination: &str, records: &[Record]) -> Result<LoadReport> {
        (**self).write(destination, records).await
    }
}
