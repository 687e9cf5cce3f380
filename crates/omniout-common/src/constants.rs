//! CRM connection defaults for OmniOut
//!
//! These values are compiled into the binary so a fresh install can talk to
//! the production login host without any configuration file.

/// Primary login host used when no instance URL is supplied
pub const DEFAULT_LOGIN_URL: &str = "https://login.salesforce.com";

/// REST API version targeted by every data request (without the leading `v`)
pub const DEFAULT_API_VERSION: &str = "58.0";

/// Redirect URI registered for the connected app when running locally
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/oauth/callback";

/// OAuth scopes requested by default
pub const DEFAULT_SCOPES: &[&str] = &["api"];

/// Client identifier shipped in unconfigured builds
pub const PLACEHOLDER_CLIENT_ID: &str = "YOUR_CONNECTED_APP_CLIENT_ID";

/// Client secret shipped in unconfigured builds
pub const PLACEHOLDER_CLIENT_SECRET: &str = "YOUR_CONNECTED_APP_CLIENT_SECRET";

/// Storage key holding the serialized session
pub const SESSION_STORAGE_KEY: &str = "sf_config";

/// Storage key holding the in-flight OAuth state nonce
pub const OAUTH_STATE_STORAGE_KEY: &str = "sf_oauth_state";

/// Storage key holding the in-flight PKCE code verifier
pub const PKCE_VERIFIER_STORAGE_KEY: &str = "sf_oauth_pkce";

/// Directory name used under the platform data directory
pub const APP_DIR_NAME: &str = "omniout";

/// Returns true when a configured credential is missing or still the shipped placeholder
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == PLACEHOLDER_CLIENT_ID || value == PLACEHOLDER_CLIENT_SECRET
}
