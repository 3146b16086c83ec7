use crate::core::{Record, RecordSource};
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// GETs a JSON endpoint that answers with an array of objects.
pub struct HttpSource {
    client: Client,
    endpoint: String,
}

impl HttpSource {
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait::async_trait]
impl RecordSource for HttpSource {
    async fn fetch(&self, query: &str) -> Result<Vec<Record>> {
        if !query.is_empty() {
            tracing::debug!("HTTP source ignores query text: {}", query);
        }

        tracing::debug!("Making API request to: {}", self.endpoint);
        let response = self.client.get(&self.endpoint).send().await?;
        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("HTTP error occurred: {} from {}", status, self.endpoint);
            return Err(EtlError::HttpStatusError {
                url: self.endpoint.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let json_data: Value = response.json().await?;
        json_to_records(json_data)
    }
}

/// 陣列中每個物件一筆；單一物件視為一筆
fn json_to_records(json_data: Value) -> Result<Vec<Record>> {
    match json_data {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(obj) => Ok(Record::from(obj)),
                other => Err(EtlError::ProcessingError {
                    message: format!("Item {} of the response is not an object: {}", i, other),
                }),
            })
            .collect(),
        Value::Object(obj) => Ok(vec![Record::from(obj)]),
        other => Err(EtlError::ProcessingError {
            message: format!("Expected a JSON array of objects, got: {}", other),
        }),
    }
}
