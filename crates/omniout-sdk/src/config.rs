//! Configuration for the OmniOut client
//!
//! Values are layered with figment: built-in defaults, then a TOML file
//! (`omniout.toml` unless a path is given), then `OMNIOUT_` environment
//! variables using `__` as the section separator, e.g.
//! `OMNIOUT_OAUTH__CLIENT_ID`.

use crate::error::{CrmError, CrmResult};
use etcetera::{choose_base_strategy, BaseStrategy};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use omniout_common::{
    is_placeholder, APP_DIR_NAME, DEFAULT_API_VERSION, DEFAULT_LOGIN_URL, DEFAULT_REDIRECT_URI,
    DEFAULT_SCOPES, PLACEHOLDER_CLIENT_ID, PLACEHOLDER_CLIENT_SECRET,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "omniout.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "OMNIOUT_";

/// Connected-app settings for the OAuth flows
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// Connected app consumer key
    pub client_id: String,
    /// Connected app consumer secret
    pub client_secret: String,
    /// Login host used to authorize and exchange codes
    pub login_url: String,
    /// Redirect URI registered with the connected app
    pub redirect_uri: String,
    /// Scopes requested at authorization time
    pub scopes: Vec<String>,
    /// Use PKCE instead of requiring the client secret for the code flow
    pub use_pkce: bool,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: PLACEHOLDER_CLIENT_ID.to_string(),
            client_secret: PLACEHOLDER_CLIENT_SECRET.to_string(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            use_pkce: false,
        }
    }
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("login_url", &self.login_url)
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("use_pkce", &self.use_pkce)
            .finish()
    }
}

impl OAuthConfig {
    /// Authorization endpoint on `host`
    pub fn authorize_endpoint(host: &str) -> String {
        format!("{}/services/oauth2/authorize", host.trim_end_matches('/'))
    }

    /// Token endpoint on `host`
    pub fn token_endpoint(host: &str) -> String {
        format!("{}/services/oauth2/token", host.trim_end_matches('/'))
    }

    /// True when a real secret has been configured
    pub fn has_secret(&self) -> bool {
        !is_placeholder(&self.client_secret)
    }

    /// Fail with `MisconfiguredClient` when credentials are missing
    pub fn ensure_configured(&self, require_secret: bool) -> CrmResult<()> {
        if is_placeholder(&self.client_id) {
            return Err(CrmError::MisconfiguredClient(
                "set oauth.client_id to your connected app consumer key".to_string(),
            ));
        }
        if require_secret && !self.has_secret() {
            return Err(CrmError::MisconfiguredClient(
                "set oauth.client_secret to your connected app consumer secret".to_string(),
            ));
        }
        Ok(())
    }
}

/// REST API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// REST API version stored in new sessions
    pub api_version: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Local storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for session files; platform data directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the storage directory (e.g. `~/.local/share/omniout` on Linux)
    pub fn resolve_data_dir(&self) -> CrmResult<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let strategy = choose_base_strategy().map_err(|e| {
            CrmError::Config(format!("Failed to determine base directories: {}", e))
        })?;
        Ok(strategy.data_dir().join(APP_DIR_NAME))
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OAuth connected app settings
    pub oauth: OAuthConfig,
    /// REST API settings
    pub api: ApiConfig,
    /// Local storage settings
    pub storage: StorageConfig,
    /// Serve built-in sample records instead of calling the CRM
    pub demo_mode: bool,
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// When `path` is `None`, `omniout.toml` in the working directory is used
    /// if it exists.
    pub fn load(path: Option<&Path>) -> CrmResult<Self> {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| CrmError::Config(e.to_string()))
    }

    /// Render the default configuration as TOML
    pub fn generate_example() -> CrmResult<String> {
        toml::to_string_pretty(&Self::default())
            .map_err(|e| CrmError::Config(format!("Failed to serialize config: {e}")))
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        self.api.timeout()
    }
}
