use crate::db::tables::{PurchasePriceTable, PurchaseTable, SalesTable, VendorInvoiceTable};
use crate::db::{init_db_pool, DbPool, SummarySink, SummaryStore};
use crate::error::{AppError, Result};
use crate::models::summary::VendorSummary;
use crate::services::{PipelineReport, SummaryService};

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

const TABLE: &str = "vendorSalesSummary";

const WHISKEY: i64 = 100;
const GIN: i64 = 200;
const RUM: i64 = 300;

// Helper function to set up a test database with empty source tables
async fn setup_test_db() -> (PathBuf, DbPool) {
    let db_path = std::env::temp_dir().join(format!("vendor_summary_test_{}.db", Uuid::new_v4()));
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let pool = init_db_pool(&db_url, 1, Duration::from_secs(5))
        .await
        .expect("Failed to open test database");

    for statement in [
        VendorInvoiceTable::create_table(),
        PurchaseTable::create_table(),
        PurchasePriceTable::create_table(),
        SalesTable::create_table(),
    ] {
        sqlx::query(&statement)
            .execute(&pool)
            .await
            .expect("Failed to create source table");
    }

    (db_path, pool)
}

// Helper function to clean up test database
async fn teardown_test_db(db_path: PathBuf, pool: DbPool) {
    pool.close().await;
    let _ = std::fs::remove_file(db_path);
}

async fn insert_invoice(pool: &DbPool, vendor: i64, freight: f64) {
    sqlx::query("INSERT INTO vendor_invoice (VendorNumber, Freight) VALUES (?, ?)")
        .bind(vendor)
        .bind(freight)
        .execute(pool)
        .await
        .expect("Failed to insert invoice");
}

async fn insert_price(pool: &DbPool, brand: i64, price: f64, volume: &str) {
    sqlx::query("INSERT INTO purchase_prices (Brand, Price, Volume) VALUES (?, ?, ?)")
        .bind(brand)
        .bind(price)
        .bind(volume)
        .execute(pool)
        .await
        .expect("Failed to insert price reference");
}

async fn insert_purchase(
    pool: &DbPool,
    vendor: i64,
    brand: i64,
    purchase_price: f64,
    quantity: i64,
    dollars: f64,
) {
    sqlx::query(
        r#"
        INSERT INTO purchases
            (VendorNumber, VendorName, Brand, Description, PurchasePrice, Quantity, Dollars)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(vendor)
    .bind(format!("VENDOR {vendor}   "))
    .bind(brand)
    .bind(format!(" Brand {brand} "))
    .bind(purchase_price)
    .bind(quantity)
    .bind(dollars)
    .execute(pool)
    .await
    .expect("Failed to insert purchase");
}

async fn insert_sale(pool: &DbPool, vendor: i64, brand: i64, quantity: i64, dollars: f64, tax: f64) {
    sqlx::query(
        r#"
        INSERT INTO sales (VendorNo, Brand, SalesQuantity, SalesDollars, SalesPrice, ExciseTax)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(vendor)
    .bind(brand)
    .bind(quantity)
    .bind(dollars)
    .bind(dollars / quantity as f64)
    .bind(tax)
    .execute(pool)
    .await
    .expect("Failed to insert sale");
}

// Vendor 1 pays 100 freight over two invoices, buys whiskey and gin, and
// sells only whiskey.
async fn seed_worked_example(pool: &DbPool) {
    insert_invoice(pool, 1, 60.0).await;
    insert_invoice(pool, 1, 40.0).await;
    insert_price(pool, WHISKEY, 7.5, "750").await;
    insert_price(pool, GIN, 4.0, "1750").await;
    insert_purchase(pool, 1, WHISKEY, 5.0, 10, 50.0).await;
    insert_purchase(pool, 1, GIN, 4.0, 5, 20.0).await;
    insert_sale(pool, 1, WHISKEY, 8, 80.0, 2.0).await;
}

async fn run_pipeline(pool: &DbPool) -> Result<PipelineReport> {
    let store = Arc::new(SummaryStore::new(pool.clone()));
    SummaryService::new(store.clone(), store, 5).run(TABLE).await
}

async fn load_summary(pool: &DbPool) -> Vec<VendorSummary> {
    SummaryStore::new(pool.clone())
        .load_table(TABLE)
        .await
        .expect("Failed to load summary table")
}

/// Sink that keeps the rows in memory instead of writing them.
#[derive(Default)]
struct RecordingSink {
    writes: Mutex<Vec<(String, Vec<VendorSummary>)>>,
}

#[async_trait]
impl SummarySink for RecordingSink {
    async fn replace_table(&self, table_name: &str, rows: &[VendorSummary]) -> Result<u64> {
        self.writes
            .lock()
            .unwrap()
            .push((table_name.to_string(), rows.to_vec()));
        Ok(rows.len() as u64)
    }
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;

    #[tokio::test]
    async fn test_worked_example() {
        let (db_path, pool) = setup_test_db().await;
        seed_worked_example(&pool).await;

        let report = run_pipeline(&pool).await.unwrap();
        assert_eq!(report.rows_aggregated, 2);
        assert_eq!(report.rows_written, 2);

        let rows = load_summary(&pool).await;
        assert_eq!(rows.len(), 2);

        let whiskey = &rows[0];
        assert_eq!(whiskey.brand, WHISKEY);
        assert_eq!(whiskey.total_purchase_quantity, 10.0);
        assert_eq!(whiskey.total_purchase_dollars, 50.0);
        assert_eq!(whiskey.total_sales_quantity, 8.0);
        assert_eq!(whiskey.total_sales_dollars, 80.0);
        assert_eq!(whiskey.total_excise_tax, 2.0);
        assert_eq!(whiskey.freight_cost, 100.0);
        assert_eq!(whiskey.gross_profit, 30.0);
        assert_eq!(whiskey.profit_margin, Some(37.5));
        assert_eq!(whiskey.stock_turnover, Some(0.8));
        assert_eq!(whiskey.actual_price, 7.5);
        assert_eq!(whiskey.volume, 750.0);
        assert_eq!(whiskey.vendor_name, "VENDOR 1");
        assert_eq!(whiskey.description, "Brand 100");

        let gin = &rows[1];
        assert_eq!(gin.brand, GIN);
        assert_eq!(gin.total_sales_quantity, 0.0);
        assert_eq!(gin.total_sales_dollars, 0.0);
        assert_eq!(gin.freight_cost, 100.0);
        assert_eq!(gin.gross_profit, -20.0);
        assert_eq!(gin.stock_turnover, Some(0.0));
        assert_eq!(gin.sales_to_purchase_ratio, Some(0.0));
        assert_eq!(gin.profit_margin, None);

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_non_positive_price_lines_are_excluded() {
        let (db_path, pool) = setup_test_db().await;
        insert_price(&pool, WHISKEY, 7.5, "750").await;
        insert_purchase(&pool, 1, WHISKEY, 5.0, 10, 50.0).await;
        insert_purchase(&pool, 1, WHISKEY, 0.0, 99, 0.0).await;
        insert_purchase(&pool, 1, WHISKEY, -1.0, 7, -7.0).await;

        let report = run_pipeline(&pool).await.unwrap();
        assert_eq!(report.excluded_non_positive_price, 2);
        assert_eq!(report.excluded_unmatched_brand, 0);

        let rows = load_summary(&pool).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_purchase_quantity, 10.0);
        assert_eq!(rows[0].total_purchase_dollars, 50.0);

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_brand_without_price_reference_is_dropped() {
        let (db_path, pool) = setup_test_db().await;
        seed_worked_example(&pool).await;
        insert_purchase(&pool, 1, RUM, 3.0, 4, 12.0).await;

        let report = run_pipeline(&pool).await.unwrap();
        assert_eq!(report.excluded_unmatched_brand, 1);

        let rows = load_summary(&pool).await;
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.brand != RUM));

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_one_row_per_purchase_group_sorted_by_spend() {
        let (db_path, pool) = setup_test_db().await;
        insert_price(&pool, WHISKEY, 7.5, "750").await;
        insert_price(&pool, GIN, 4.0, "1750").await;
        insert_price(&pool, RUM, 9.0, "1000").await;
        insert_purchase(&pool, 1, WHISKEY, 5.0, 2, 10.0).await;
        insert_purchase(&pool, 1, WHISKEY, 5.0, 3, 15.0).await;
        insert_purchase(&pool, 1, GIN, 4.0, 10, 40.0).await;
        insert_purchase(&pool, 2, RUM, 6.0, 1, 6.0).await;
        insert_purchase(&pool, 2, WHISKEY, 5.0, 1, 5.0).await;

        run_pipeline(&pool).await.unwrap();
        let rows = load_summary(&pool).await;

        let keys: Vec<(i64, i64)> = rows.iter().map(|row| (row.vendor_number, row.brand)).collect();
        assert_eq!(keys, vec![(1, GIN), (1, WHISKEY), (2, RUM), (2, WHISKEY)]);
        assert_eq!(rows[1].total_purchase_quantity, 5.0);
        assert_eq!(rows[1].total_purchase_dollars, 25.0);

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_sales_totals_repeat_across_price_groups() {
        let (db_path, pool) = setup_test_db().await;
        insert_price(&pool, WHISKEY, 7.5, "750").await;
        insert_purchase(&pool, 1, WHISKEY, 5.0, 10, 50.0).await;
        insert_purchase(&pool, 1, WHISKEY, 6.0, 2, 12.0).await;
        insert_sale(&pool, 1, WHISKEY, 8, 80.0, 2.0).await;

        run_pipeline(&pool).await.unwrap();
        let rows = load_summary(&pool).await;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].purchase_price, 5.0);
        assert_eq!(rows[1].purchase_price, 6.0);
        for row in &rows {
            assert_eq!(row.total_sales_dollars, 80.0);
            assert_eq!(row.total_sales_quantity, 8.0);
            assert_eq!(row.gross_profit, 80.0 - row.total_purchase_dollars);
        }

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_freight_is_broadcast_per_vendor() {
        let (db_path, pool) = setup_test_db().await;
        seed_worked_example(&pool).await;
        insert_price(&pool, RUM, 9.0, "1000").await;
        insert_purchase(&pool, 1, RUM, 6.0, 3, 18.0).await;
        insert_purchase(&pool, 2, RUM, 6.0, 1, 6.0).await;

        run_pipeline(&pool).await.unwrap();
        let rows = load_summary(&pool).await;

        let vendor_one: Vec<&VendorSummary> = rows.iter().filter(|row| row.vendor_number == 1).collect();
        assert_eq!(vendor_one.len(), 3);
        assert!(vendor_one.iter().all(|row| row.freight_cost == 100.0));

        let vendor_two = rows.iter().find(|row| row.vendor_number == 2).unwrap();
        assert_eq!(vendor_two.freight_cost, 0.0);

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_rerun_produces_identical_table() {
        let (db_path, pool) = setup_test_db().await;
        seed_worked_example(&pool).await;

        run_pipeline(&pool).await.unwrap();
        let first = load_summary(&pool).await;
        run_pipeline(&pool).await.unwrap();
        let second = load_summary(&pool).await;

        assert_eq!(first, second);

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_replace_discards_previous_table() {
        let (db_path, pool) = setup_test_db().await;
        seed_worked_example(&pool).await;

        sqlx::query("CREATE TABLE vendorSalesSummary (Stale TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO vendorSalesSummary (Stale) VALUES ('old')")
            .execute(&pool)
            .await
            .unwrap();

        run_pipeline(&pool).await.unwrap();
        let rows = load_summary(&pool).await;
        assert_eq!(rows.len(), 2);

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_missing_source_table_is_schema_mismatch() {
        let (db_path, pool) = setup_test_db().await;
        seed_worked_example(&pool).await;
        sqlx::query("DROP TABLE sales").execute(&pool).await.unwrap();

        let store = Arc::new(SummaryStore::new(pool.clone()));
        let sink = Arc::new(RecordingSink::default());
        let result = SummaryService::new(store, sink.clone(), 5).run(TABLE).await;

        assert!(matches!(result, Err(AppError::SchemaMismatch(_))));
        assert!(sink.writes.lock().unwrap().is_empty());

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_missing_source_column_is_schema_mismatch() {
        let (db_path, pool) = setup_test_db().await;
        seed_worked_example(&pool).await;
        sqlx::query("ALTER TABLE sales RENAME COLUMN ExciseTax TO Tax")
            .execute(&pool)
            .await
            .unwrap();

        let store = Arc::new(SummaryStore::new(pool.clone()));
        let sink = Arc::new(RecordingSink::default());
        let result = SummaryService::new(store, sink.clone(), 5).run(TABLE).await;

        assert!(matches!(result, Err(AppError::SchemaMismatch(msg)) if msg.contains("ExciseTax")));
        assert!(sink.writes.lock().unwrap().is_empty());

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_previous_table() {
        let (db_path, pool) = setup_test_db().await;
        seed_worked_example(&pool).await;
        run_pipeline(&pool).await.unwrap();
        let before = load_summary(&pool).await;

        // NaN is stored as NULL and violates NOT NULL on the second insert.
        let broken = VendorSummary {
            gross_profit: f64::NAN,
            ..before[1].clone()
        };
        let store = SummaryStore::new(pool.clone());
        let result = store
            .replace_table(TABLE, &[before[0].clone(), broken])
            .await;
        assert!(matches!(result, Err(AppError::Write(msg)) if msg.contains("NOT NULL")));

        let after = load_summary(&pool).await;
        assert_eq!(before, after);

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_pipeline_with_in_memory_sink() {
        let (db_path, pool) = setup_test_db().await;
        seed_worked_example(&pool).await;

        let store = Arc::new(SummaryStore::new(pool.clone()));
        let sink = Arc::new(RecordingSink::default());
        let report = SummaryService::new(store.clone(), sink.clone(), 0)
            .run(TABLE)
            .await
            .unwrap();

        assert_eq!(report.rows_written, 2);
        let writes = sink.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, TABLE);
        assert_eq!(writes[0].1[0].gross_profit, 30.0);
        drop(writes);

        // Nothing was persisted to the database.
        assert!(matches!(
            store.load_table(TABLE).await,
            Err(AppError::SchemaMismatch(_))
        ));

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_invalid_table_name_is_rejected() {
        let (db_path, pool) = setup_test_db().await;
        let store = SummaryStore::new(pool.clone());

        let result = store.replace_table("summary; DROP TABLE sales", &[]).await;
        assert!(matches!(result, Err(AppError::InvalidTableName(_))));

        teardown_test_db(db_path, pool).await;
    }

    #[tokio::test]
    async fn test_unreachable_database_is_connectivity_error() {
        let db_url = format!("sqlite:///nonexistent_{}/inventory.db", Uuid::new_v4());

        let result = init_db_pool(&db_url, 1, Duration::from_secs(2)).await;
        assert!(matches!(result, Err(AppError::Connectivity(_))));
    }
}
