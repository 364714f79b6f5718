use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;
use url::ParseError;
use zip::result::ZipError;

pub mod config;
pub mod storage;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Maximum retries exceeded")]
    MaxRetriesExceeded,

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Storage access error: {0}")]
    StorageAccess(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Malformed archive: {0}")]
    MalformedArchive(String),

    #[error("Zip error: {0}")]
    Zip(#[from] ZipError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Errors that make the whole run pointless rather than a single file.
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(self, Error::StorageAccess(_) | Error::Config(_))
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::InvalidInput(format!("URL parse error: {}", err))
    }
}

impl From<chrono::ParseError> for Error {
    fn from(err: chrono::ParseError) -> Self {
        Error::Parse(format!("date parse error: {}", err))
    }
}
