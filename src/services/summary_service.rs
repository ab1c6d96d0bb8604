use crate::db::{SummarySink, SummaryStore};
use crate::error::Result;
use crate::services::enricher;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of one summary run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
	pub table_name: String,
	pub rows_aggregated: usize,
	pub rows_written: u64,
	pub excluded_non_positive_price: i64,
	pub excluded_unmatched_brand: i64,
	pub elapsed: Duration,
}

pub struct SummaryService {
	store: Arc<SummaryStore>,
	sink: Arc<dyn SummarySink>,
	preview_rows: usize,
}

impl SummaryService {
	pub fn new(store: Arc<SummaryStore>, sink: Arc<dyn SummarySink>, preview_rows: usize) -> Self {
		Self {
			store,
			sink,
			preview_rows,
		}
	}

	/// Aggregate, enrich and persist the vendor summary into `table_name`.
	///
	/// Any error aborts the run before the sink is touched, or inside the
	/// sink's own replace.
	pub async fn run(&self, table_name: &str) -> Result<PipelineReport> {
		let started = Instant::now();

		tracing::info!("Creating vendor summary table...");
		let records = self.store.fetch_vendor_summary().await?;
		tracing::info!(rows = records.len(), "Aggregated vendor summary");
		self.log_preview("aggregated", &records)?;

		let excluded = self.store.count_excluded_purchases().await?;
		if excluded.total() > 0 {
			tracing::warn!(
				non_positive_price = excluded.non_positive_price,
				unmatched_brand = excluded.unmatched_brand,
				"Purchase lines excluded from the summary"
			);
		}

		tracing::info!("Cleaning data and adding derived metrics...");
		let summary = enricher::enrich(&records)?;
		self.log_preview("enriched", &summary)?;

		tracing::info!(table_name, "Ingesting data...");
		let rows_written = self.sink.replace_table(table_name, &summary).await?;
		tracing::info!(table_name, rows_written, "Completed");

		Ok(PipelineReport {
			table_name: table_name.to_string(),
			rows_aggregated: records.len(),
			rows_written,
			excluded_non_positive_price: excluded.non_positive_price,
			excluded_unmatched_brand: excluded.unmatched_brand,
			elapsed: started.elapsed(),
		})
	}

	fn log_preview<T: Serialize>(&self, stage: &str, rows: &[T]) -> Result<()> {
		for (position, row) in rows.iter().take(self.preview_rows).enumerate() {
			let row = serde_json::to_string(row)?;
			tracing::info!(stage, position, row = %row, "Sample row");
		}
		Ok(())
	}
}
