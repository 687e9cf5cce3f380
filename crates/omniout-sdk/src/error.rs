//! Error types for the OmniOut SDK

use crate::storage::StorageError;

/// Result type for SDK operations
pub type CrmResult<T> = Result<T, CrmError>;

/// Errors produced by authentication, session and API operations
#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    /// An operation needed a session and none is active
    #[error("Not authenticated. Run 'omniout login' to connect your org")]
    NotAuthenticated,

    /// OAuth client identifier or secret is unset or still a placeholder
    #[error("OAuth client is not configured: {0}")]
    MisconfiguredClient(String),

    /// Returned state nonce does not match the one stored at login start
    #[error("OAuth state mismatch: the callback does not belong to a login started here")]
    InvalidState,

    /// The OAuth provider reported an error
    #[error("OAuth Error: {error} - {}", .description.as_deref().unwrap_or("Unknown error"))]
    ProviderError {
        error: String,
        description: Option<String>,
    },

    /// Redirect arrived without an authorization code
    #[error("No authorization code received from the provider")]
    MissingCode,

    /// Network or HTTP transport failure
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The CRM REST API rejected the request
    #[error("CRM API error ({status}): {message}")]
    RemoteApi { status: u16, message: String },

    /// Response did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Local storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// JSON encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// The authorization URL could not be opened
    #[error("Failed to open authorization URL: {0}")]
    Navigation(String),

    /// A login was started and its redirect has not come back yet
    #[error("A login is already waiting for its redirect")]
    FlowInProgress,
}

impl CrmError {
    /// True for failures caused by the login flow rather than by API calls
    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            CrmError::NotAuthenticated
                | CrmError::MisconfiguredClient(_)
                | CrmError::InvalidState
                | CrmError::ProviderError { .. }
                | CrmError::MissingCode
        )
    }

    /// HTTP status reported by the remote side, when there is one
    pub fn status(&self) -> Option<u16> {
        match self {
            CrmError::RemoteApi { status, .. } => Some(*status),
            CrmError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
