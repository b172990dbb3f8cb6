use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Scraping error: {0}")]
    Scraper(#[from] ScraperError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Usage error: {0}")]
    Usage(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required configuration: {0}")]
    MissingField(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to build client: {0}")]
    BuildError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Gave up on {url} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },
}

/// Outcome of a single failed fetch attempt.
///
/// A response with any HTTP status is not a failure; only the absence of a
/// response is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("transient network failure: {0}")]
    Transient(String),

    #[error("permanent fetch failure: {0}")]
    Permanent(String),

    #[error("gave up on {url} after {attempts} attempts: {last_error}")]
    Exhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Transient(msg) | FetchError::Permanent(msg) => {
                AppError::Client(ClientError::RequestFailed(msg))
            }
            FetchError::Exhausted {
                url,
                attempts,
                last_error,
            } => AppError::Client(ClientError::RetriesExhausted {
                url,
                attempts,
                last_error,
            }),
        }
    }
}

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("Selector error: {0}")]
    SelectorError(String),

    #[error("Expected markup not found: {0}")]
    MissingElement(String),

    #[error("Row {row} has {found} cells, expected {expected}")]
    MalformedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("No course level found on detail page")]
    CourseLevelMissing,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Destination folder {} already exists", .0.display())]
    DestinationExists(PathBuf),

    #[error("Enrollment data did not properly write to disk: wrote {expected} rows, read back {found}")]
    RowCountMismatch { expected: usize, found: usize },

    #[error("Row has {found} values but table has {expected} columns")]
    RaggedRow { expected: usize, found: usize },

    #[error("Checkpoint {} was already written in this run", .0.display())]
    DuplicateCheckpoint(PathBuf),

    #[error("Missing column: {0}")]
    MissingColumn(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
