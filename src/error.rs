use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlClientError {
    #[cfg(feature = "mssql")]
    #[error(transparent)]
    MssqlError(#[from] tiberius::error::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Column access error: {0}")]
    ColumnError(String),
}

impl SqlClientError {
    /// Invalid options or a missing collaborator. Never retryable.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError(_))
    }

    /// Anything raised while opening, executing or reading.
    #[must_use]
    pub fn is_database_error(&self) -> bool {
        match self {
            #[cfg(feature = "mssql")]
            Self::MssqlError(_) => true,
            Self::ConnectionError(_) | Self::ExecutionError(_) => true,
            Self::ConfigError(_) | Self::ParameterError(_) | Self::ColumnError(_) => false,
        }
    }
}
