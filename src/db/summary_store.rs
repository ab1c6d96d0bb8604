use async_trait::async_trait;

use crate::{
    config::is_valid_identifier,
    db::{
        DbPool,
        tables::{
            PurchasePriceTable, PurchaseTable, SalesTable, VendorInvoiceTable,
            VendorSalesSummaryTable,
        },
    },
    error::{AppError, Result},
    models::summary::{ExclusionCounts, VendorSummary, VendorSummaryRecord},
};

/// Destination of the finalized summary.
#[async_trait]
pub trait SummarySink: Send + Sync {
    /// Replace `table_name` with exactly `rows`, returning the number of rows
    /// written. Any previous table of that name is dropped.
    async fn replace_table(&self, table_name: &str, rows: &[VendorSummary]) -> Result<u64>;
}

/// Store for the vendor summary queries
pub struct SummaryStore {
    pool: DbPool,
}

impl SummaryStore {
    /// Create a new SummaryStore with the provided database pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Run the aggregation query: one row per purchase group, sales and
    /// freight attached by left join, largest purchase spend first.
    pub async fn fetch_vendor_summary(&self) -> Result<Vec<VendorSummaryRecord>> {
        let records = sqlx::query_as::<_, VendorSummaryRecord>(&vendor_summary_query())
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Count the purchase lines the aggregation leaves out.
    pub async fn count_excluded_purchases(&self) -> Result<ExclusionCounts> {
        let query = format!(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN p.{price} > 0 THEN 0 ELSE 1 END), 0)
                    AS non_positive_price,
                COALESCE(SUM(CASE
                    WHEN p.{price} > 0 AND NOT EXISTS (
                        SELECT 1 FROM {prices} pp WHERE pp.{ref_brand} = p.{brand}
                    ) THEN 1
                    ELSE 0
                END), 0) AS unmatched_brand
            FROM {purchases} p
            "#,
            purchases = PurchaseTable::TABLE_NAME,
            prices = PurchasePriceTable::TABLE_NAME,
            price = PurchaseTable::COLUMN_PURCHASE_PRICE,
            brand = PurchaseTable::COLUMN_BRAND,
            ref_brand = PurchasePriceTable::COLUMN_BRAND,
        );

        let counts = sqlx::query_as::<_, ExclusionCounts>(&query)
            .fetch_one(&self.pool)
            .await?;

        Ok(counts)
    }

    /// Read a persisted summary table back, in stored order.
    pub async fn load_table(&self, table_name: &str) -> Result<Vec<VendorSummary>> {
        validate_table_name(table_name)?;

        let rows = sqlx::query_as::<_, VendorSummary>(&format!(
            "SELECT * FROM \"{}\" ORDER BY rowid",
            table_name
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl SummarySink for SummaryStore {
    async fn replace_table(&self, table_name: &str, rows: &[VendorSummary]) -> Result<u64> {
        validate_table_name(table_name)?;

        // Drop, create and load commit together, so a failed run leaves the
        // previous table in place.
        let mut tx = self.pool.begin().await?;

        sqlx::query(&VendorSalesSummaryTable::drop_table(table_name))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&VendorSalesSummaryTable::create_table(table_name))
            .execute(&mut *tx)
            .await?;

        let insert = VendorSalesSummaryTable::insert_row(table_name);
        let mut written = 0;
        for row in rows {
            written += sqlx::query(&insert)
                .bind(row.vendor_number)
                .bind(&row.vendor_name)
                .bind(row.brand)
                .bind(&row.description)
                .bind(row.purchase_price)
                .bind(row.actual_price)
                .bind(row.volume)
                .bind(row.total_sales_quantity)
                .bind(row.total_sales_dollars)
                .bind(row.total_purchase_quantity)
                .bind(row.total_purchase_dollars)
                .bind(row.total_sales_price)
                .bind(row.total_excise_tax)
                .bind(row.freight_cost)
                .bind(row.gross_profit)
                .bind(row.profit_margin)
                .bind(row.stock_turnover)
                .bind(row.sales_to_purchase_ratio)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit().await?;

        tracing::debug!(table_name, written, "Replaced summary table");

        Ok(written)
    }
}

fn validate_table_name(table_name: &str) -> Result<()> {
    if is_valid_identifier(table_name) {
        Ok(())
    } else {
        Err(AppError::InvalidTableName(table_name.to_string()))
    }
}

/// The vendor summary query.
///
/// Sales are joined on (vendor, brand) only, so several price groups of the
/// same vendor/brand each carry the full sales totals. Numeric outputs are
/// cast to REAL so they decode as `f64` whatever the source affinity.
fn vendor_summary_query() -> String {
    format!(
        r#"
        WITH FreightSummary AS (
            SELECT
                {inv_vendor} AS VendorNumber,
                CAST(SUM({inv_freight}) AS REAL) AS FreightCost
            FROM {invoices}
            GROUP BY {inv_vendor}
        ),
        PurchaseSummary AS (
            SELECT
                p.{p_vendor} AS VendorNumber,
                p.{p_vendor_name} AS VendorName,
                p.{p_brand} AS Brand,
                p.{p_description} AS Description,
                p.{p_price} AS PurchasePrice,
                pp.{pp_price} AS ActualPrice,
                pp.{pp_volume} AS Volume,
                SUM(p.{p_quantity}) AS TotalPurchaseQuantity,
                SUM(p.{p_dollars}) AS TotalPurchaseDollars
            FROM {purchases} p
            JOIN {prices} pp
                ON p.{p_brand} = pp.{pp_brand}
            WHERE p.{p_price} > 0
            GROUP BY p.{p_vendor}, p.{p_vendor_name}, p.{p_brand}, p.{p_description},
                     p.{p_price}, pp.{pp_price}, pp.{pp_volume}
        ),
        SalesSummary AS (
            SELECT
                {s_vendor} AS VendorNo,
                {s_brand} AS Brand,
                CAST(SUM({s_quantity}) AS REAL) AS TotalSalesQuantity,
                CAST(SUM({s_dollars}) AS REAL) AS TotalSalesDollars,
                CAST(SUM({s_price}) AS REAL) AS TotalSalesPrice,
                CAST(SUM({s_tax}) AS REAL) AS TotalExciseTax
            FROM {sales}
            GROUP BY {s_vendor}, {s_brand}
        )
        SELECT
            ps.VendorNumber,
            ps.VendorName,
            ps.Brand,
            ps.Description,
            CAST(ps.PurchasePrice AS REAL) AS PurchasePrice,
            CAST(ps.ActualPrice AS REAL) AS ActualPrice,
            CAST(ps.Volume AS TEXT) AS Volume,
            ss.TotalSalesQuantity,
            ss.TotalSalesDollars,
            CAST(ps.TotalPurchaseQuantity AS REAL) AS TotalPurchaseQuantity,
            CAST(ps.TotalPurchaseDollars AS REAL) AS TotalPurchaseDollars,
            ss.TotalSalesPrice,
            ss.TotalExciseTax,
            fs.FreightCost
        FROM PurchaseSummary ps
        LEFT JOIN SalesSummary ss
            ON ps.VendorNumber = ss.VendorNo
            AND ps.Brand = ss.Brand
        LEFT JOIN FreightSummary fs
            ON ps.VendorNumber = fs.VendorNumber
        ORDER BY ps.TotalPurchaseDollars DESC,
                 ps.VendorNumber, ps.Brand, ps.PurchasePrice,
                 ps.ActualPrice, ps.Volume, ps.Description, ps.VendorName
        "#,
        invoices = VendorInvoiceTable::TABLE_NAME,
        inv_vendor = VendorInvoiceTable::COLUMN_VENDOR_NUMBER,
        inv_freight = VendorInvoiceTable::COLUMN_FREIGHT,
        purchases = PurchaseTable::TABLE_NAME,
        p_vendor = PurchaseTable::COLUMN_VENDOR_NUMBER,
        p_vendor_name = PurchaseTable::COLUMN_VENDOR_NAME,
        p_brand = PurchaseTable::COLUMN_BRAND,
        p_description = PurchaseTable::COLUMN_DESCRIPTION,
        p_price = PurchaseTable::COLUMN_PURCHASE_PRICE,
        p_quantity = PurchaseTable::COLUMN_QUANTITY,
        p_dollars = PurchaseTable::COLUMN_DOLLARS,
        prices = PurchasePriceTable::TABLE_NAME,
        pp_brand = PurchasePriceTable::COLUMN_BRAND,
        pp_price = PurchasePriceTable::COLUMN_PRICE,
        pp_volume = PurchasePriceTable::COLUMN_VOLUME,
        sales = SalesTable::TABLE_NAME,
        s_vendor = SalesTable::COLUMN_VENDOR_NO,
        s_brand = SalesTable::COLUMN_BRAND,
        s_quantity = SalesTable::COLUMN_SALES_QUANTITY,
        s_dollars = SalesTable::COLUMN_SALES_DOLLARS,
        s_price = SalesTable::COLUMN_SALES_PRICE,
        s_tax = SalesTable::COLUMN_EXCISE_TAX,
    )
}
