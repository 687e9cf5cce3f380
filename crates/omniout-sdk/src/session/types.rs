//! The authenticated session record

use serde::{Deserialize, Serialize};

/// One authenticated connection to a CRM organization
///
/// A session is only usable when all three fields are set; see
/// [`Session::is_complete`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Base URL of the org's API host
    pub instance_url: String,
    /// Bearer credential
    pub access_token: String,
    /// REST API version, without the leading `v`
    pub api_version: String,
}

impl Session {
    /// Create a session, normalizing the instance URL and version tag
    pub fn new(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            instance_url: normalize_instance_url(&instance_url.into()),
            access_token: access_token.into(),
            api_version: normalize_api_version(&api_version.into()),
        }
    }

    /// Normalize a session that came from storage
    pub(crate) fn normalized(self) -> Self {
        Self::new(self.instance_url, self.access_token, self.api_version)
    }

    /// True when every field is non-empty
    pub fn is_complete(&self) -> bool {
        !self.instance_url.trim().is_empty()
            && !self.access_token.trim().is_empty()
            && !self.api_version.trim().is_empty()
    }

    /// Root of the versioned REST API, e.g. `https://org.my.crm/services/data/v58.0`
    pub fn api_base(&self) -> String {
        format!(
            "{}/services/data/v{}",
            self.instance_url, self.api_version
        )
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish()
    }
}

fn normalize_instance_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

// Older builds persisted "v58.0"; paths already carry the `v`.
fn normalize_api_version(version: &str) -> String {
    let version = version.trim();
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version)
        .to_string()
}
