use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
	pub database_url: String,
	pub summary_table: String,
	pub log_dir: PathBuf,
	pub log_file: String,
	pub log_level: String,
	pub preview_rows: usize,
	pub max_pool_size: u32,
	pub acquire_timeout_secs: u64,
}

impl Config {
	/// Reads the job configuration from the environment.
	///
	/// A `.env` file in the working directory is loaded first if it exists.
	pub fn from_env() -> Result<Self, ConfigError> {
		let _ = dotenvy::dotenv();

		let summary_table =
			env::var("SUMMARY_TABLE").unwrap_or_else(|_| "vendorSalesSummary".to_string());
		if !is_valid_identifier(&summary_table) {
			return Err(ConfigError::InvalidTableName(summary_table));
		}

		Ok(Self {
			database_url: env::var("DATABASE_URL")
				.unwrap_or_else(|_| "sqlite://inventory.db".to_string()),
			summary_table,
			log_dir: env::var("LOG_DIR")
				.unwrap_or_else(|_| "logs".to_string())
				.into(),
			log_file: env::var("LOG_FILE")
				.unwrap_or_else(|_| "get_vendor_summary.log".to_string()),
			log_level: env::var("RUST_LOG")
				.or_else(|_| env::var("LOG_LEVEL"))
				.unwrap_or_else(|_| "debug,sqlx=warn".to_string()),
			preview_rows: env::var("PREVIEW_ROWS")
				.unwrap_or_else(|_| "5".to_string())
				.parse()
				.map_err(|_| ConfigError::InvalidNumber("PREVIEW_ROWS"))?,
			max_pool_size: env::var("MAX_POOL_SIZE")
				.unwrap_or_else(|_| "1".to_string())
				.parse()
				.map_err(|_| ConfigError::InvalidNumber("MAX_POOL_SIZE"))?,
			acquire_timeout_secs: env::var("ACQUIRE_TIMEOUT")
				.unwrap_or_else(|_| "30".to_string())
				.parse()
				.map_err(|_| ConfigError::InvalidNumber("ACQUIRE_TIMEOUT"))?,
		})
	}

	pub fn log_path(&self) -> PathBuf {
		self.log_dir.join(&self.log_file)
	}
}

/// Whether `name` can be interpolated into DDL as a bare table name.
pub fn is_valid_identifier(name: &str) -> bool {
	let mut chars = name.chars();
	match chars.next() {
		Some(first) if first.is_ascii_alphabetic() || first == '_' => {
			chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
		}
		_ => false,
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("Invalid table name: {0:?}")]
	InvalidTableName(String),

	#[error("{0} must be a non-negative number")]
	InvalidNumber(&'static str),
}
