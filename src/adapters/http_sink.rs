use crate::core::{LoadReport, Record, RecordSink};
use crate::utils::error::{EtlError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// POSTs all records as one JSON array. No retries, no dedup: posting the
/// same batch twice creates it twice downstream.
pub struct HttpSink {
    client: Client,
    headers: HeaderMap,
}

impl HttpSink {
    pub fn new(headers: &BTreeMap<String, String>, timeout: Option<Duration>) -> Result<Self> {
        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            let invalid = |reason: String| EtlError::InvalidConfigValueError {
                field: format!("sink.headers.{}", name),
                value: value.clone(),
                reason,
            };
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
            let value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
            header_map.insert(name, value);
        }
        // JSON body, whatever the configured headers say
        header_map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            headers: header_map,
        })
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

#[async_trait::async_trait]
impl RecordSink for HttpSink {
    async fn write(&self, destination: &str, records: &[Record]) -> Result<LoadReport> {
        let payload = serde_json::to_vec(records)?;
        tracing::debug!(
            "POST {} records ({} bytes) to {}",
            records.len(),
            payload.len(),
            destination
        );

        let response = self
            .client
            .post(destination)
            .headers(self.headers.clone())
            .body(payload)
            .send()
            .await
            .inspect_err(|e| tracing::error!("Request to {} failed: {}", destination, e))?;

        let status = response.status();
        let body = response.text().await?;
        tracing::info!("Status Code: {}", status);

        if !status.is_success() {
            tracing::error!("HTTP error occurred: {} - {}", status, body);
            return Err(EtlError::HttpStatusError {
                url: destination.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let response = if body.trim().is_empty() {
            None
        } else {
            let parsed: Value = serde_json::from_str(&body)
                .inspect_err(|e| tracing::error!("JSON decoding error: {}", e))?;
            tracing::debug!("Response content: {}", parsed);
            Some(parsed)
        };

        Ok(LoadReport {
            destination: destination.to_string(),
            records_written: records.len(),
            response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                [
                    ("journal_transaction_id", json!(format!("T{}", i))),
                    ("transaction_amount", json!(i as f64 * 1.5)),
                    ("audit_control", json!(i % 2 == 0)),
                ]
                .into_iter()
                .collect()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_single_post_with_all_records() {
        let server = MockServer::start();
        let expected = serde_json::to_value(records(3)).unwrap();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/journal-records/")
                .header("content-type", "application/json")
                .header("x-api-key", "k1")
                .json_body(expected);
            then.status(201).json_body(json!({"created": 3}));
        });

        let headers: BTreeMap<String, String> = [("X-Api-Key".to_string(), "k1".to_string())].into();
        let sink = HttpSink::new(&headers, None).unwrap();
        let report = sink
            .write(&server.url("/journal-records/"), &records(3))
            .await
            .unwrap();

        api_mock.assert_hits(1);
        assert_eq!(report.records_written, 3);
        assert_eq!(report.response, Some(json!({"created": 3})));
    }

    #[test]
    fn test_configured_content_type_is_overridden() {
        let headers: BTreeMap<String, String> = [("Content-Type".to_string(), "text/plain".to_string())].into();
        let sink = HttpSink::new(&headers, None).unwrap();
        assert_eq!(sink.headers().get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[tokio::test]
    async fn test_non_2xx_reports_status_and_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/journal-records/");
            then.status(422).body(r#"{"detail":"audit_control must be bool"}"#);
        });

        let sink = HttpSink::new(&BTreeMap::new(), None).unwrap();
        let err = sink
            .write(&server.url("/journal-records/"), &records(1))
            .await
            .unwrap_err();

        match err {
            EtlError::HttpStatusError { status, body, .. } => {
                assert_eq!(status, 422);
                assert!(body.contains("audit_control"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_success_body_accepted() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/ingest");
            then.status(204);
        });

        let sink = HttpSink::new(&BTreeMap::new(), None).unwrap();
        let report = sink.write(&server.url("/ingest"), &[]).await.unwrap();
        assert_eq!(report.records_written, 0);
        assert_eq!(report.response, None);
    }

    #[tokio::test]
    async fn test_invalid_json_body_is_decode_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/ingest");
            then.status(200).body("<html>ok</html>");
        });

        let sink = HttpSink::new(&BTreeMap::new(), None).unwrap();
        let err = sink.write(&server.url("/ingest"), &records(1)).await.unwrap_err();
        assert!(matches!(err, EtlError::SerializationError(_)));
    }

    #[test]
    fn test_invalid_header_rejected() {
        let headers: BTreeMap<String, String> = [("bad header".to_string(), "v".to_string())].into();
        assert!(matches!(
            HttpSink::new(&headers, None),
            Err(EtlError::InvalidConfigValueError { .. })
        ));
    }
}
