use relay_etl::adapters::{CommitMode, Database, SqlSource, TableSink};
use relay_etl::core::transforms::{Passthrough, UppercaseText};
use relay_etl::core::RecordSource;
use relay_etl::{EtlEngine, EtlPipeline, PipelineState, TransformOptions};
use serde_json::json;
use tempfile::TempDir;

async fn open(dir: &TempDir, name: &str) -> Database {
    let url = format!("sqlite://{}?mode=rwc", dir.path().join(name).display());
    Database::connect(&url).await.unwrap()
}

async fn seed_source(db: &Database) {
    sqlx::query("CREATE TABLE products (name TEXT, price REAL)")
        .execute(db.pool())
        .await
        .unwrap();
    sqlx::query("INSERT INTO products VALUES ('Widget', 9.99), ('Gadget', 4.5)")
        .execute(db.pool())
        .await
        .unwrap();
}

async fn create_destination(db: &Database) {
    sqlx::query("CREATE TABLE catalog (ProductName TEXT NOT NULL, Price REAL, Category TEXT)")
        .execute(db.pool())
        .await
        .unwrap();
}

fn product_options() -> TransformOptions {
    TransformOptions {
        rename_columns: [
            ("name".to_string(), "ProductName".to_string()),
            ("price".to_string(), "Price".to_string()),
        ]
        .into(),
        insert_columns: json!({"Category": "ETL inserts"})
            .as_object()
            .cloned()
            .unwrap(),
    }
}

async fn catalog_rows(db: &Database) -> serde_json::Value {
    let rows = SqlSource::new(db.clone())
        .fetch("SELECT ProductName, Price, Category FROM catalog ORDER BY rowid")
        .await
        .unwrap();
    serde_json::to_value(rows).unwrap()
}

#[tokio::test]
async fn test_rename_and_insert_columns_into_table() {
    let dir = tempfile::tempdir().unwrap();
    let source_db = open(&dir, "shop.db").await;
    let dest_db = open(&dir, "warehouse.db").await;
    seed_source(&source_db).await;
    create_destination(&dest_db).await;

    let pipeline = EtlPipeline::new(
        SqlSource::new(source_db.clone()),
        Passthrough,
        TableSink::new(dest_db.clone()),
    );
    let mut engine = EtlEngine::new(pipeline);

    let report = engine
        .run(
            "SELECT name, price FROM products ORDER BY rowid",
            "catalog",
            &product_options(),
        )
        .await
        .unwrap();

    assert_eq!(engine.state(), PipelineState::Done);
    assert_eq!(report.records_loaded, 2);
    assert_eq!(
        catalog_rows(&dest_db).await,
        json!([
            {"ProductName": "Widget", "Price": 9.99, "Category": "ETL inserts"},
            {"ProductName": "Gadget", "Price": 4.5, "Category": "ETL inserts"}
        ])
    );
}

#[tokio::test]
async fn test_rerun_inserts_duplicate_rows() {
    let dir = tempfile::tempdir().unwrap();
    let source_db = open(&dir, "shop.db").await;
    let dest_db = open(&dir, "warehouse.db").await;
    seed_source(&source_db).await;
    create_destination(&dest_db).await;

    let mut engine = EtlEngine::new(EtlPipeline::new(
        SqlSource::new(source_db.clone()),
        Passthrough,
        TableSink::new(dest_db.clone()),
    ));
    let query = "SELECT name, price FROM products ORDER BY rowid";

    engine.run(query, "catalog", &product_options()).await.unwrap();
    engine.run(query, "catalog", &product_options()).await.unwrap();

    let rows = catalog_rows(&dest_db).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], rows[2]);
    assert_eq!(rows[1], rows[3]);
}

#[tokio::test]
async fn test_failed_batch_leaves_table_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let source_db = open(&dir, "shop.db").await;
    let dest_db = open(&dir, "warehouse.db").await;
    seed_source(&source_db).await;
    sqlx::query("INSERT INTO products VALUES (NULL, 1.0)")
        .execute(source_db.pool())
        .await
        .unwrap();
    create_destination(&dest_db).await;

    let mut engine = EtlEngine::new(EtlPipeline::new(
        SqlSource::new(source_db.clone()),
        Passthrough,
        TableSink::new(dest_db.clone()).with_commit_mode(CommitMode::Batch),
    ));

    let result = engine
        .run(
            "SELECT name, price FROM products ORDER BY rowid",
            "catalog",
            &product_options(),
        )
        .await;

    assert!(result.is_err());
    assert_eq!(engine.state(), PipelineState::Failed);
    assert_eq!(catalog_rows(&dest_db).await, json!([]));
}

#[tokio::test]
async fn test_row_commit_keeps_rows_before_failure() {
    let dir = tempfile::tempdir().unwrap();
    let source_db = open(&dir, "shop.db").await;
    let dest_db = open(&dir, "warehouse.db").await;
    seed_source(&source_db).await;
    sqlx::query("INSERT INTO products VALUES (NULL, 1.0), ('Late', 2.0)")
        .execute(source_db.pool())
        .await
        .unwrap();
    create_destination(&dest_db).await;

    let mut engine = EtlEngine::new(EtlPipeline::new(
        SqlSource::new(source_db.clone()),
        Passthrough,
        TableSink::new(dest_db.clone()).with_commit_mode(CommitMode::Row),
    ));

    assert!(engine
        .run(
            "SELECT name, price FROM products ORDER BY rowid",
            "catalog",
            &product_options(),
        )
        .await
        .is_err());

    let rows = catalog_rows(&dest_db).await;
    let names: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["ProductName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Widget", "Gadget"]);
}

#[tokio::test]
async fn test_uppercase_transform_into_table() {
    let dir = tempfile::tempdir().unwrap();
    let source_db = open(&dir, "shop.db").await;
    let dest_db = open(&dir, "warehouse.db").await;
    seed_source(&source_db).await;
    create_destination(&dest_db).await;

    let mut engine = EtlEngine::new(EtlPipeline::new(
        SqlSource::new(source_db.clone()),
        UppercaseText,
        TableSink::new(dest_db.clone()),
    ));
    engine
        .run(
            "SELECT name, price FROM products ORDER BY rowid",
            "catalog",
            &product_options(),
        )
        .await
        .unwrap();

    let rows = catalog_rows(&dest_db).await;
    assert_eq!(rows[0]["ProductName"], json!("WIDGET"));
    assert_eq!(rows[0]["Category"], json!("ETL inserts"));
}
