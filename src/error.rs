use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredstatError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
    #[error("Worker failed: {0}")]
    Worker(String),
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, PredstatError>;

// Helper conversions
impl From<config::ConfigError> for PredstatError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
