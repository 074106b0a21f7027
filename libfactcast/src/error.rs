//! Error types for Factcast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FactcastError>;

#[derive(Error, Debug)]
pub enum FactcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Notify error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Signal handling error: {0}")]
    Signal(std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl FactcastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            FactcastError::InvalidInput(_) => 3,
            FactcastError::Config(_) => 2,
            FactcastError::Store(_) => 1,
            FactcastError::Generation(_) => 1,
            FactcastError::Publish(_) => 1,
            FactcastError::Notify(_) => 1,
            FactcastError::Signal(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("Invalid schedule period '{0}'")]
    InvalidPeriod(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("No fact stored under key '{0}'")]
    NotFound(String),
}

/// Failure to complete an HTTP exchange at all (no status to report)
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Failed to read response body: {0}")]
    Body(String),
}

#[derive(Error, Debug, Clone)]
pub enum GenerationError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("Completion response contained no text")]
    EmptyResponse,
}

#[derive(Error, Debug, Clone)]
pub enum PublishError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Request error: {status} {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("Failed to sign request: {0}")]
    Signing(String),
}

#[derive(Error, Debug, Clone)]
pub enum NotifyError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Message rejected: {0}")]
    Rejected(String),
}
