//! Error types for the OmniOut CLI

use color_eyre::eyre::Report;
use omniout_sdk::CrmError;
use thiserror::Error;

/// CLI error type with minimal variants
#[derive(Debug, Error)]
pub enum CliError {
    /// Anything the CRM SDK reports
    #[error(transparent)]
    Crm(#[from] CrmError),

    /// Terminal or socket failures
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output failures
    #[error("Failed to serialize output: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Bad command-line input
    #[error("{0}")]
    InvalidInput(String),

    /// Everything else (using color-eyre's Report for rich errors)
    #[error(transparent)]
    Internal(#[from] Report),
}

impl CliError {
    pub fn internal(message: impl Into<String>) -> Self {
        CliError::Internal(Report::msg(message.into()))
    }
}

impl From<dialoguer::Error> for CliError {
    fn from(err: dialoguer::Error) -> Self {
        CliError::Internal(err.into())
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crm_errors_display_unchanged() {
        let err: CliError = CrmError::NotAuthenticated.into();
        assert_eq!(err.to_string(), CrmError::NotAuthenticated.to_string());
    }

    #[test]
    fn test_internal_message() {
        assert_eq!(CliError::internal("boom").to_string(), "boom");
    }
}
