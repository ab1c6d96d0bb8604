use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database connectivity error: {0}")]
    Connectivity(sqlx::Error),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Invalid value {value:?} in column {column}")]
    InvalidValue { column: &'static str, value: String },

    #[error("Invalid table name: {0:?}")]
    InvalidTableName(String),

    #[error("Failed to write summary table: {0}")]
    Write(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Missing tables/columns and undecodable columns point at the source schema,
// constraint violations at the rows being written, everything else at the
// connection or the statement itself.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err)
                if db_err.message().contains("no such table")
                    || db_err.message().contains("no such column") =>
            {
                AppError::SchemaMismatch(db_err.message().to_string())
            }
            sqlx::Error::Database(ref db_err) if !matches!(db_err.kind(), ErrorKind::Other) => {
                AppError::Write(db_err.message().to_string())
            }
            sqlx::Error::ColumnNotFound(column) => {
                AppError::SchemaMismatch(format!("column {column} not found in result"))
            }
            sqlx::Error::ColumnDecode { index, source } => {
                AppError::SchemaMismatch(format!("cannot decode column {index}: {source}"))
            }
            other => AppError::Connectivity(other),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
