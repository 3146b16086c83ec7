//! Presto source speaking the HTTP statement protocol: the query is POSTed to
//! `/v1/statement`, and each response may carry a page of `data` plus a
//! `nextUri` to follow until the result set is exhausted.

use crate::core::{Record, RecordSource};
use crate::utils::error::{EtlError, Result};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrestoSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub http_scheme: String,
    pub verify_tls: bool,
    pub timeout_seconds: Option<u64>,
}

impl PrestoSettings {
    pub fn new(host: impl Into<String>, port: u16, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: None,
            catalog: None,
            schema: None,
            http_scheme: "https".to_string(),
            verify_tls: true,
            timeout_seconds: None,
        }
    }

    /// Reads `PRESTO_HOST`, `PRESTO_PORT`, `PRESTO_USERNAME` and the optional
    /// `PRESTO_PASSWORD`, `PRESTO_CATALOG`, `PRESTO_SCHEMA`,
    /// `PRESTO_HTTP_SCHEME`, `PRESTO_VERIFY_TLS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| EtlError::MissingConfigError {
                    field: key.to_string(),
                })
        };

        let port_raw = required("PRESTO_PORT")?;
        let port = port_raw
            .trim()
            .parse::<u16>()
            .map_err(|e| EtlError::InvalidConfigValueError {
                field: "PRESTO_PORT".to_string(),
                value: port_raw.clone(),
                reason: e.to_string(),
            })?;

        let mut settings = Self::new(required("PRESTO_HOST")?, port, required("PRESTO_USERNAME")?);
        settings.password = lookup("PRESTO_PASSWORD");
        settings.catalog = lookup("PRESTO_CATALOG");
        settings.schema = lookup("PRESTO_SCHEMA");
        if let Some(scheme) = lookup("PRESTO_HTTP_SCHEME") {
            settings.http_scheme = scheme;
        }
        if let Some(verify) = lookup("PRESTO_VERIFY_TLS") {
            settings.verify_tls = !matches!(verify.trim(), "false" | "0" | "no");
        }
        Ok(settings)
    }

    pub fn statement_url(&self) -> String {
        format!("{}://{}:{}/v1/statement", self.http_scheme, self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResults {
    #[serde(default)]
    id: String,
    next_uri: Option<String>,
    columns: Option<Vec<PrestoColumn>>,
    data: Option<Vec<Vec<Value>>>,
    error: Option<PrestoQueryError>,
}

#[derive(Debug, Deserialize)]
struct PrestoColumn {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrestoQueryError {
    message: String,
    error_name: Option<String>,
}

pub struct PrestoSource {
    client: Client,
    settings: PrestoSettings,
}

impl PrestoSource {
    pub fn new(settings: PrestoSettings) -> Result<Self> {
        let mut builder = Client::builder().danger_accept_invalid_certs(!settings.verify_tls);
        if let Some(secs) = settings.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if !settings.verify_tls {
            tracing::warn!("TLS certificate verification disabled for {}", settings.host);
        }

        Ok(Self {
            client: builder.build()?,
            settings,
        })
    }

    pub fn settings(&self) -> &PrestoSettings {
        &self.settings
    }

    fn with_session(&self, request: RequestBuilder) -> RequestBuilder {
        let mut request = request.header("X-Presto-User", &self.settings.user);
        if let Some(catalog) = &self.settings.catalog {
            request = request.header("X-Presto-Catalog", catalog);
        }
        if let Some(schema) = &self.settings.schema {
            request = request.header("X-Presto-Schema", schema);
        }
        if let Some(password) = &self.settings.password {
            request = request.basic_auth(&self.settings.user, Some(password));
        }
        request
    }

    async fn send(&self, request: RequestBuilder) -> Result<QueryResults> {
        let response = self.with_session(request).send().await?;
        let status = response.status();
        let url = response.url().to_string();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Presto returned {} for {}: {}", status, url, body);
            return Err(EtlError::HttpStatusError {
                url,
                status: status.as_u16(),
                body,
            });
        }

        let mut results: QueryResults = response.json().await?;
        if let Some(error) = results.error.take() {
            let message = match error.error_name {
                Some(name) => format!("{} ({}): {}", name, results.id, error.message),
                None => error.message,
            };
            tracing::error!("Presto query failed: {}", message);
            return Err(EtlError::QueryError { message });
        }
        Ok(results)
    }
}

#[async_trait::async_trait]
impl RecordSource for PrestoSource {
    async fn fetch(&self, query: &str) -> Result<Vec<Record>> {
        let url = self.settings.statement_url();
        tracing::debug!("Submitting query to {}", url);

        let mut page = self
            .send(self.client.post(&url).body(query.to_string()))
            .await?;
        let mut columns: Option<Vec<String>> = None;
        let mut records = Vec::new();

        loop {
            if columns.is_none() {
                columns = page
                    .columns
                    .take()
                    .map(|cols| cols.into_iter().map(|c| c.name).collect());
            }

            if let Some(rows) = page.data.take() {
                let names = columns.as_ref().ok_or_else(|| EtlError::ProcessingError {
                    message: format!("Presto query {} sent data before columns", page.id),
                })?;
                for row in rows {
                    if row.len() != names.len() {
                        return Err(EtlError::ProcessingError {
                            message: format!(
                                "Presto query {} returned a row with {} values for {} columns",
                                page.id,
                                row.len(),
                                names.len()
                            ),
                        });
                    }
                    records.push(names.iter().cloned().zip(row).collect::<Record>());
                }
            }

            match page.next_uri.take() {
                Some(next) => page = self.send(self.client.get(&next)).await?,
                None => break,
            }
        }

        tracing::debug!("Presto returned {} rows", records.len());
        Ok(records)
    }
}
