use crate::adapters::database::Database;
use crate::core::{Record, RecordSource};
use crate::utils::error::Result;
use serde_json::Value;
use sqlx::any::AnyRow;
use sqlx::{Column, Row, TypeInfo};

/// Reads rows from a relational database through the `sqlx` Any driver.
#[derive(Debug, Clone)]
pub struct SqlSource {
    db: Database,
}

impl SqlSource {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl RecordSource for SqlSource {
    async fn fetch(&self, query: &str) -> Result<Vec<Record>> {
        let mut conn = self.db.pool().acquire().await?;
        let rows: Vec<AnyRow> = sqlx::query(query)
            .fetch_all(&mut *conn)
            .await
            .inspect_err(|e| tracing::error!("Error reading from {:?} source: {}", self.db.dialect(), e))?;

        tracing::debug!("Fetched {} rows", rows.len());
        rows.iter()
            .enumerate()
            .map(|(index, row)| {
                row_to_record(row).inspect_err(|e| {
                    tracing::error!("Could not decode row {}: {}", index, e)
                })
            })
            .collect()
    }
}

fn row_to_record(row: &AnyRow) -> Result<Record> {
    let mut record = Record::new();
    for (i, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, i, column.type_info().name())?;
        record.insert(column.name(), value);
    }
    Ok(record)
}

/// A value that does not decode as its column type fails the fetch.
fn decode_column(row: &AnyRow, i: usize, type_name: &str) -> Result<Value> {
    let decoded: std::result::Result<Option<Value>, sqlx::Error> = match type_name {
        "BOOLEAN" | "BOOL" => row.try_get::<Option<bool>, _>(i).map(|v| v.map(Value::Bool)),
        "SMALLINT" | "INT2" => row.try_get::<Option<i16>, _>(i).map(|v| v.map(Value::from)),
        "INTEGER" | "INT4" => row.try_get::<Option<i32>, _>(i).map(|v| v.map(Value::from)),
        "BIGINT" | "INT8" => row.try_get::<Option<i64>, _>(i).map(|v| v.map(Value::from)),
        "REAL" | "FLOAT4" => row.try_get::<Option<f32>, _>(i).map(|v| v.map(Value::from)),
        "DOUBLE" | "FLOAT8" => row.try_get::<Option<f64>, _>(i).map(|v| v.map(Value::from)),
        "NULL" => Ok(None),
        "BLOB" | "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(i)
            .map(|v| v.map(|bytes| Value::String(String::from_utf8_lossy(&bytes).into_owned()))),
        _ => row.try_get::<Option<String>, _>(i).map(|v| v.map(Value::String)),
    };

    Ok(decoded?.unwrap_or(Value::Null))
}
