use crate::adapters::database::{Database, Dialect};
use crate::core::{LoadReport, Record, RecordSink};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::validate_identifier;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::any::AnyArguments;
use sqlx::query::Query;
use sqlx::{Any, AnyConnection};

/// How inserted rows become visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitMode {
    /// One transaction for the whole batch; a failing row rolls back every row.
    #[default]
    Batch,
    /// Every row commits on its own; a failing row stops the batch and the
    /// rows before it stay.
    Row,
}

/// Inserts each record with a positional `INSERT INTO <table> VALUES (...)`.
#[derive(Debug, Clone)]
pub struct TableSink {
    db: Database,
    commit: CommitMode,
    column_list: bool,
}

impl TableSink {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            commit: CommitMode::default(),
            column_list: false,
        }
    }

    pub fn with_commit_mode(mut self, commit: CommitMode) -> Self {
        self.commit = commit;
        self
    }

    /// Name the target columns after the record's field names instead of
    /// relying on table column order.
    pub fn with_column_list(mut self, column_list: bool) -> Self {
        self.column_list = column_list;
        self
    }

    pub fn commit_mode(&self) -> CommitMode {
        self.commit
    }

    async fn insert_all(
        &self,
        conn: &mut AnyConnection,
        table: &str,
        records: &[Record],
    ) -> Result<()> {
        for (row, record) in records.iter().enumerate() {
            let sql = insert_sql(self.db.dialect(), table, record, self.column_list)?;
            bind_record(sqlx::query(&sql), record)?
                .execute(&mut *conn)
                .await
                .inspect_err(|e| {
                    tracing::error!("Error inserting row {} into {}: {}", row, table, e)
                })?;
        }
        Ok(())
    }
}

fn insert_sql(dialect: Dialect, table: &str, record: &Record, column_list: bool) -> Result<String> {
    if record.is_empty() {
        return Err(EtlError::ProcessingError {
            message: format!("Cannot insert a record without fields into {}", table),
        });
    }

    let placeholders = (1..=record.len())
        .map(|i| dialect.placeholder(i))
        .collect::<Vec<_>>()
        .join(", ");

    if column_list {
        for field in record.field_names() {
            validate_identifier("record field", field)?;
        }
        let columns = record.field_names().collect::<Vec<_>>().join(", ");
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table, columns, placeholders
        ))
    } else {
        Ok(format!("INSERT INTO {} VALUES ({})", table, placeholders))
    }
}

fn bind_record<'q>(
    mut query: Query<'q, Any, AnyArguments<'q>>,
    record: &'q Record,
) -> Result<Query<'q, Any, AnyArguments<'q>>> {
    for (field, value) in &record.data {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => query.bind(i),
                // u64 above i64::MAX would lose digits as f64
                None if n.is_u64() => {
                    return Err(EtlError::ProcessingError {
                        message: format!(
                            "{} = {} does not fit a 64-bit signed integer",
                            field, n
                        ),
                    })
                }
                None => query.bind(n.as_f64()),
            },
            Value::String(s) => query.bind(s.as_str()),
            // 巢狀值以 JSON 文字寫入
            nested => query.bind(nested.to_string()),
        };
    }
    Ok(query)
}

#[async_trait::async_trait]
impl RecordSink for TableSink {
    async fn write(&self, destination: &str, records: &[Record]) -> Result<LoadReport> {
        validate_identifier("sink.table", destination)?;
        tracing::debug!(
            "Inserting {} records into {} ({:?} commit)",
            records.len(),
            destination,
            self.commit
        );

        match self.commit {
            CommitMode::Batch => {
                // Dropping the transaction on error rolls it back.
                let mut tx = self.db.pool().begin().await?;
                self.insert_all(&mut tx, destination, records).await?;
                tx.commit().await?;
            }
            CommitMode::Row => {
                let mut conn = self.db.pool().acquire().await?;
                self.insert_all(&mut conn, destination, records).await?;
            }
        }

        tracing::info!("Data posted to {} successfully", destination);
        Ok(LoadReport {
            destination: destination.to_string(),
            records_written: records.len(),
            response: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sql_source::SqlSource;
    use crate::core::RecordSource;
    use serde_json::json;
    use tempfile::TempDir;

    async fn products_db(dir: &TempDir) -> Database {
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("dest.db").display());
        let db = Database::connect(&url).await.unwrap();
        sqlx::query(
            "CREATE TABLE products (ProductName TEXT NOT NULL, Price REAL, Category TEXT)",
        )
        .execute(db.pool())
        .await
        .unwrap();
        db
    }

    fn product(name: Value, price: f64) -> Record {
        [
            ("ProductName", name),
            ("Price", json!(price)),
            ("Category", json!("ETL inserts")),
        ]
        .into_iter()
        .collect()
    }

    async fn stored(db: &Database) -> Vec<Record> {
        SqlSource::new(db.clone())
            .fetch("SELECT ProductName, Price, Category FROM products ORDER BY rowid")
            .await
            .unwrap()
    }

    #[test]
    fn test_insert_sql_by_dialect() {
        let record = product(json!("Widget"), 9.99);
        assert_eq!(
            insert_sql(Dialect::Postgres, "dbo.products", &record, false).unwrap(),
            "INSERT INTO dbo.products VALUES ($1, $2, $3)"
        );
        assert_eq!(
            insert_sql(Dialect::Sqlite, "products", &record, true).unwrap(),
            "INSERT INTO products (ProductName, Price, Category) VALUES (?, ?, ?)"
        );
        assert!(insert_sql(Dialect::MySql, "products", &Record::new(), false).is_err());
    }

    #[tokio::test]
    async fn test_insert_and_rerun_duplicates_rows() {
        let dir = tempfile::tempdir().unwrap();
        let db = products_db(&dir).await;
        let sink = TableSink::new(db.clone());
        let batch = vec![product(json!("Widget"), 9.99), product(json!("Gadget"), 4.5)];

        let report = sink.write("products", &batch).await.unwrap();
        assert_eq!(report.records_written, 2);
        sink.write("products", &batch).await.unwrap();

        let rows = stored(&db).await;
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], rows[2]);
        assert_eq!(rows[0].get("ProductName"), Some(&json!("Widget")));
        assert_eq!(rows[1].get("Price"), Some(&json!(4.5)));
    }

    #[tokio::test]
    async fn test_unsigned_overflow_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let db = products_db(&dir).await;
        let sink = TableSink::new(db.clone());
        let mut oversized = product(json!("Widget"), 9.99);
        oversized.insert("Price", json!(u64::MAX));

        let err = sink
            .write("products", &[product(json!("Gadget"), 4.5), oversized])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EtlError::ProcessingError { ref message } if message.contains("Price")
        ));
        assert!(stored(&db).await.is_empty());
    }

    #[tokio::test]
    async fn test_batch_mode_rolls_back_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let db = products_db(&dir).await;
        let sink = TableSink::new(db.clone()).with_commit_mode(CommitMode::Batch);
        let batch = vec![
            product(json!("Widget"), 9.99),
            product(Value::Null, 1.0),
            product(json!("Gadget"), 4.5),
        ];

        let err = sink.write("products", &batch).await.unwrap_err();
        assert!(matches!(err, EtlError::DatabaseError(_)));
        assert!(stored(&db).await.is_empty());
    }

    #[tokio::test]
    async fn test_row_mode_keeps_rows_before_failure() {
        let dir = tempfile::tempdir().unwrap();
        let db = products_db(&dir).await;
        let sink = TableSink::new(db.clone()).with_commit_mode(CommitMode::Row);
        let batch = vec![
            product(json!("Widget"), 9.99),
            product(Value::Null, 1.0),
            product(json!("Gadget"), 4.5),
        ];

        assert!(sink.write("products", &batch).await.is_err());
        let rows = stored(&db).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("ProductName"), Some(&json!("Widget")));
    }

    #[tokio::test]
    async fn test_column_list_insert() {
        let dir = tempfile::tempdir().unwrap();
        let db = products_db(&dir).await;
        let sink = TableSink::new(db.clone()).with_column_list(true);

        let record: Record = [("Category", json!("misc")), ("ProductName", json!("Bolt"))]
            .into_iter()
            .collect();
        sink.write("products", &[record]).await.unwrap();

        let rows = stored(&db).await;
        assert_eq!(rows[0].get("ProductName"), Some(&json!("Bolt")));
        assert_eq!(rows[0].get("Category"), Some(&json!("misc")));
        assert_eq!(rows[0].get("Price"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_rejects_unsafe_table_name() {
        let dir = tempfile::tempdir().unwrap();
        let db = products_db(&dir).await;
        let sink = TableSink::new(db);
        let err = sink
            .write("products; DROP TABLE products", &[product(json!("x"), 1.0)])
            .await
            .unwrap_err();
        assert!(matches!(err, EtlError::InvalidConfigValueError { .. }));
    }
}
