use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of the aggregation query, before any cleaning.
///
/// Sales-side measures and freight come from left joins and are `None` when
/// the vendor/brand never sold or the vendor has no invoices.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "PascalCase")]
#[sqlx(rename_all = "PascalCase")]
pub struct VendorSummaryRecord {
    pub vendor_number: i64,
    pub vendor_name: Option<String>,
    pub brand: i64,
    pub description: Option<String>,
    pub purchase_price: Option<f64>,
    pub actual_price: Option<f64>,
    /// Raw package volume as stored in the price reference.
    pub volume: Option<String>,
    pub total_sales_quantity: Option<f64>,
    pub total_sales_dollars: Option<f64>,
    pub total_purchase_quantity: Option<f64>,
    pub total_purchase_dollars: Option<f64>,
    pub total_sales_price: Option<f64>,
    pub total_excise_tax: Option<f64>,
    pub freight_cost: Option<f64>,
}

/// Finalized summary row as persisted to the output table.
///
/// The three ratio columns are `None` when their denominator is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "PascalCase")]
#[sqlx(rename_all = "PascalCase")]
pub struct VendorSummary {
    pub vendor_number: i64,
    pub vendor_name: String,
    pub brand: i64,
    pub description: String,
    pub purchase_price: f64,
    pub actual_price: f64,
    pub volume: f64,
    pub total_sales_quantity: f64,
    pub total_sales_dollars: f64,
    pub total_purchase_quantity: f64,
    pub total_purchase_dollars: f64,
    pub total_sales_price: f64,
    pub total_excise_tax: f64,
    pub freight_cost: f64,
    pub gross_profit: f64,
    pub profit_margin: Option<f64>,
    pub stock_turnover: Option<f64>,
    pub sales_to_purchase_ratio: Option<f64>,
}

/// Purchase lines left out of the aggregation, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, FromRow)]
pub struct ExclusionCounts {
    /// Lines with a purchase price that is zero, negative or missing.
    pub non_positive_price: i64,
    /// Priced lines whose brand has no price reference row.
    pub unmatched_brand: i64,
}

impl ExclusionCounts {
    pub fn total(&self) -> i64 {
        self.non_positive_price + self.unmatched_brand
    }
}
