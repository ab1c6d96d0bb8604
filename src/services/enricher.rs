//! Cleaning and derived metrics for the aggregated vendor summary.
//!
//! The steps run in a fixed order per row: missing values become zero, text
//! is trimmed and volume is parsed, and only then are the ratios derived. A
//! ratio whose denominator is zero is `None`, which is persisted as NULL.

use crate::{
    error::{AppError, Result},
    models::summary::{VendorSummary, VendorSummaryRecord},
};

/// Clean every record and append the derived metric columns.
///
/// Fails only if a volume value is not numeric.
pub fn enrich(records: &[VendorSummaryRecord]) -> Result<Vec<VendorSummary>> {
    records
        .iter()
        .map(|record| finalize(fill_missing(record.clone())))
        .collect()
}

/// Replace every missing value with zero (empty text for the name columns).
pub fn fill_missing(record: VendorSummaryRecord) -> VendorSummaryRecord {
    let zero = Some(0.0);

    VendorSummaryRecord {
        vendor_name: record.vendor_name.or_else(|| Some(String::new())),
        description: record.description.or_else(|| Some(String::new())),
        purchase_price: record.purchase_price.or(zero),
        actual_price: record.actual_price.or(zero),
        volume: record.volume.or_else(|| Some("0".to_string())),
        total_sales_quantity: record.total_sales_quantity.or(zero),
        total_sales_dollars: record.total_sales_dollars.or(zero),
        total_purchase_quantity: record.total_purchase_quantity.or(zero),
        total_purchase_dollars: record.total_purchase_dollars.or(zero),
        total_sales_price: record.total_sales_price.or(zero),
        total_excise_tax: record.total_excise_tax.or(zero),
        freight_cost: record.freight_cost.or(zero),
        ..record
    }
}

/// Parse a stored volume such as `"750"`, `" 1750.0 "` or `"0"`.
pub fn parse_volume(raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|volume| volume.is_finite())
        .ok_or_else(|| AppError::InvalidValue {
            column: "Volume",
            value: raw.to_string(),
        })
}

/// `numerator / denominator`, or `None` when the denominator is zero.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

fn finalize(record: VendorSummaryRecord) -> Result<VendorSummary> {
    let volume = parse_volume(record.volume.as_deref().unwrap_or("0"))?;

    let total_sales_dollars = record.total_sales_dollars.unwrap_or_default();
    let total_sales_quantity = record.total_sales_quantity.unwrap_or_default();
    let total_purchase_dollars = record.total_purchase_dollars.unwrap_or_default();
    let total_purchase_quantity = record.total_purchase_quantity.unwrap_or_default();
    let gross_profit = total_sales_dollars - total_purchase_dollars;

    Ok(VendorSummary {
        vendor_number: record.vendor_number,
        vendor_name: record.vendor_name.unwrap_or_default().trim().to_string(),
        brand: record.brand,
        description: record.description.unwrap_or_default().trim().to_string(),
        purchase_price: record.purchase_price.unwrap_or_default(),
        actual_price: record.actual_price.unwrap_or_default(),
        volume,
        total_sales_quantity,
        total_sales_dollars,
        total_purchase_quantity,
        total_purchase_dollars,
        total_sales_price: record.total_sales_price.unwrap_or_default(),
        total_excise_tax: record.total_excise_tax.unwrap_or_default(),
        freight_cost: record.freight_cost.unwrap_or_default(),
        gross_profit,
        profit_margin: ratio(gross_profit, total_sales_dollars).map(|margin| margin * 100.0),
        stock_turnover: ratio(total_sales_quantity, total_purchase_quantity),
        sales_to_purchase_ratio: ratio(total_sales_dollars, total_purchase_dollars),
    })
}
