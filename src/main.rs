use std::sync::Arc;
use std::time::{Duration, Instant};

use vendor_summary::{
    config::Config,
    db::{init_db_pool, SummaryStore},
    logging,
    services::SummaryService,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let started = Instant::now();

    let config = Config::from_env()?;
    logging::init(&config)?;

    tracing::info!(
        database_url = %config.database_url,
        table = %config.summary_table,
        "Starting vendor summary"
    );

    let result = run(&config).await;
    if let Err(ref err) = result {
        tracing::error!(error = %err, "Vendor summary failed");
    }
    result?;

    let minutes = started.elapsed().as_secs_f64() / 60.0;
    println!("Total Time Elapsed : {} minutes", minutes);

    Ok(())
}

async fn run(config: &Config) -> anyhow::Result<()> {
    let pool = init_db_pool(
        &config.database_url,
        config.max_pool_size,
        Duration::from_secs(config.acquire_timeout_secs),
    )
    .await?;

    let store = Arc::new(SummaryStore::new(pool.clone()));
    let service = SummaryService::new(store.clone(), store, config.preview_rows);
    let report = service.run(&config.summary_table).await?;

    tracing::info!(
        rows_written = report.rows_written,
        excluded = report.excluded_non_positive_price + report.excluded_unmatched_brand,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Vendor summary written"
    );

    pool.close().await;
    Ok(())
}
