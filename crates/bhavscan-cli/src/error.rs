use thiserror::Error;

/// Errors that stop the CLI before or after the batch run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Scan(#[from] bhavscan_core::ScanError),

    #[error("logger initialisation failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Scan(error) => error.code(),
            Self::Logging(_) => "logging",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
        }
    }
}
