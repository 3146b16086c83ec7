//! Connection pools for the SQL source and the table sink.
//!
//! Pools are opened explicitly through a [`ConnectionContext`] and closed by
//! it at the end of a job. Individual reads and writes borrow a scoped
//! connection (or transaction) from the pool, which goes back to the pool when
//! dropped, whether the statement succeeded or not.

use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{redact, validate_connection_url};
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use std::time::Duration;

/// Placeholder syntax differs between backends behind the Any driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    pub fn from_url(url: &str) -> Result<Self> {
        validate_connection_url("database url", url)?;
        let scheme = url.split(':').next().unwrap_or_default();
        match scheme {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            other => Err(EtlError::InvalidConfigValueError {
                field: "database url".to_string(),
                value: other.to_string(),
                reason: "Unsupported database scheme".to_string(),
            }),
        }
    }

    /// `index` is 1-based.
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            Dialect::MySql | Dialect::Sqlite => "?".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Database {
    pool: AnyPool,
    dialect: Dialect,
    url: String,
}

impl Database {
    pub async fn connect(url: &str) -> Result<Self> {
        let dialect = Dialect::from_url(url)?;
        sqlx::any::install_default_drivers();

        tracing::debug!("Opening {:?} pool at {}", dialect, redact(url));
        // 單線程流程，一條連線就夠
        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .connect(url)
            .await?;

        Ok(Self {
            pool,
            dialect,
            url: url.to_string(),
        })
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn close(&self) {
        if !self.pool.is_closed() {
            tracing::debug!("Closing pool at {}", redact(&self.url));
            self.pool.close().await;
        }
    }
}

/// Owns every pool opened for one job. Opening the same URL twice hands back
/// the pool that is already open.
#[derive(Debug, Default)]
pub struct ConnectionContext {
    databases: Vec<Database>,
}

impl ConnectionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn open(&mut self, url: &str) -> Result<Database> {
        if let Some(db) = self.databases.iter().find(|db| db.url == url) {
            return Ok(db.clone());
        }
        let db = Database::connect(url).await?;
        self.databases.push(db.clone());
        Ok(db)
    }

    pub fn len(&self) -> usize {
        self.databases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    pub async fn close(self) {
        for db in &self.databases {
            db.close().await;
        }
    }
}
