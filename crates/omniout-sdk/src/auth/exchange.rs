//! Token endpoint calls
//!
//! Both grants POST a form to `{host}/services/oauth2/token` and turn the
//! response into a [`Session`], which is persisted before being returned.
//! Failures are logged and returned; the stored session is never touched
//! on failure.

use crate::config::{Config, OAuthConfig};
use crate::error::{CrmError, CrmResult};
use crate::session::{Session, SessionStore};
use reqwest::Response;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Successful token endpoint payload
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: Option<String>,
    instance_url: Option<String>,
}

/// Token endpoint error payload
#[derive(Debug, Deserialize)]
struct TokenEndpointError {
    error: String,
    error_description: Option<String>,
}

/// Exchanges authorization codes or passwords for sessions
#[derive(Clone)]
pub struct TokenExchanger {
    http_client: reqwest::Client,
    oauth: OAuthConfig,
    api_version: String,
    sessions: Arc<SessionStore>,
}

impl std::fmt::Debug for TokenExchanger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenExchanger")
            .field("oauth", &self.oauth)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl TokenExchanger {
    /// Create an exchanger with explicit settings
    pub fn new(
        http_client: reqwest::Client,
        oauth: OAuthConfig,
        api_version: impl Into<String>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            http_client,
            oauth,
            api_version: api_version.into(),
            sessions,
        }
    }

    /// Create an exchanger from the application configuration
    pub fn from_config(config: &Config, sessions: Arc<SessionStore>) -> CrmResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::new(
            http_client,
            config.oauth.clone(),
            config.api.api_version.clone(),
            sessions,
        ))
    }

    /// Connected-app settings in use
    pub fn oauth_config(&self) -> &OAuthConfig {
        &self.oauth
    }

    /// Shared session store
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Exchange an authorization code for a session
    ///
    /// `state` must equal the nonce stored when the login started. The
    /// stored nonce is consumed whatever the outcome. `instance_url_hint`
    /// selects the host for the token request and defaults to the
    /// configured login host.
    pub async fn exchange_code(
        &self,
        code: &str,
        instance_url_hint: Option<&str>,
        state: Option<&str>,
    ) -> CrmResult<Session> {
        let result = self.exchange_code_inner(code, instance_url_hint, state).await;
        if let Err(e) = &result {
            error!("Authorization code exchange failed: {}", e);
        }
        result
    }

    async fn exchange_code_inner(
        &self,
        code: &str,
        instance_url_hint: Option<&str>,
        state: Option<&str>,
    ) -> CrmResult<Session> {
        let expected_state = self.sessions.take_nonce().await;
        let code_verifier = self.sessions.take_pkce_verifier().await;

        match (expected_state.as_deref(), state) {
            (Some(expected), Some(actual)) if expected == actual => {
                debug!("OAuth state verified");
            }
            (None, _) => {
                warn!("No login in progress; rejecting callback");
                return Err(CrmError::InvalidState);
            }
            _ => {
                warn!("OAuth state mismatch; rejecting callback");
                return Err(CrmError::InvalidState);
            }
        }

        self.oauth.ensure_configured(!self.oauth.use_pkce)?;

        let host = login_host(instance_url_hint, &self.oauth.login_url);

        let mut params: Vec<(&str, &str)> = vec![
            ("grant_type", "authorization_code"),
            ("client_id", self.oauth.client_id.as_str()),
            ("redirect_uri", self.oauth.redirect_uri.as_str()),
            ("code", code),
        ];
        if self.oauth.has_secret() {
            params.push(("client_secret", self.oauth.client_secret.as_str()));
        }
        if self.oauth.use_pkce {
            let verifier = code_verifier.as_deref().ok_or_else(|| {
                CrmError::InvalidResponse("PKCE verifier missing for this login".to_string())
            })?;
            params.push(("code_verifier", verifier));
        }

        let token = self.request_token(&host, &params).await?;
        self.finish(token, &host).await
    }

    /// Authenticate with the password grant
    ///
    /// The security token, when given, is appended to the password.
    pub async fn exchange_password(
        &self,
        username: &str,
        password: &str,
        instance_url: &str,
        security_token: Option<&str>,
    ) -> CrmResult<Session> {
        let result = self
            .exchange_password_inner(username, password, instance_url, security_token)
            .await;
        if let Err(e) = &result {
            error!("Authentication failed: {}", e);
        }
        result
    }

    async fn exchange_password_inner(
        &self,
        username: &str,
        password: &str,
        instance_url: &str,
        security_token: Option<&str>,
    ) -> CrmResult<Session> {
        self.oauth.ensure_configured(true)?;

        let host = login_host(Some(instance_url), &self.oauth.login_url);
        let password = format!("{}{}", password, security_token.unwrap_or_default());

        let params: [(&str, &str); 5] = [
            ("grant_type", "password"),
            ("client_id", self.oauth.client_id.as_str()),
            ("client_secret", self.oauth.client_secret.as_str()),
            ("username", username),
            ("password", password.as_str()),
        ];

        let token = self.request_token(&host, &params).await?;
        self.finish(token, &host).await
    }

    async fn request_token(
        &self,
        host: &str,
        params: &[(&str, &str)],
    ) -> CrmResult<TokenEndpointResponse> {
        let endpoint = OAuthConfig::token_endpoint(host);
        debug!("Requesting token from {}", endpoint);

        let response = self.http_client.post(&endpoint).form(params).send().await?;
        parse_token_response(response).await
    }

    async fn finish(&self, token: TokenEndpointResponse, host: &str) -> CrmResult<Session> {
        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                CrmError::InvalidResponse("Missing access_token in response".to_string())
            })?;
        let instance_url = token
            .instance_url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| host.to_string());

        let session = Session::new(instance_url, access_token, self.api_version.clone());
        self.sessions.save(session.clone()).await?;

        info!("Authenticated against {}", session.instance_url);
        Ok(session)
    }
}

async fn parse_token_response(response: Response) -> CrmResult<TokenEndpointResponse> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        if let Ok(err) = serde_json::from_str::<TokenEndpointError>(&body) {
            return Err(CrmError::ProviderError {
                error: err.error,
                description: err.error_description,
            });
        }
        return Err(CrmError::RemoteApi {
            status: status.as_u16(),
            message: if body.is_empty() {
                status.canonical_reason().unwrap_or("Unknown error").to_string()
            } else {
                body
            },
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        CrmError::InvalidResponse(format!("Failed to parse token response: {}", e))
    })
}

fn login_host(hint: Option<&str>, default: &str) -> String {
    hint.map(str::trim)
        .filter(|h| !h.is_empty())
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn oauth(server: &MockServer) -> OAuthConfig {
        OAuthConfig {
            client_id: "client-id".into(),
            client_secret: "client-secret".into(),
            login_url: server.uri(),
            redirect_uri: "http://localhost:8080/oauth/callback".into(),
            ..OAuthConfig::default()
        }
    }

    async fn exchanger(oauth: OAuthConfig) -> TokenExchanger {
        let sessions = Arc::new(SessionStore::open(Arc::new(MemoryStorage::new())).await);
        TokenExchanger::new(reqwest::Client::new(), oauth, "58.0", sessions)
    }

    #[tokio::test]
    async fn test_code_exchange_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=ABC123"))
            .and(body_string_contains("client_secret=client-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "T1",
                "instance_url": "https://org.my.crm",
                "token_type": "Bearer",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let exchanger = exchanger(oauth(&server)).await;
        exchanger.sessions().store_nonce("XYZ").await.unwrap();

        let session = exchanger
            .exchange_code("ABC123", Some(&server.uri()), Some("XYZ"))
            .await
            .unwrap();

        assert_eq!(session, Session::new("https://org.my.crm", "T1", "58.0"));
        assert_eq!(exchanger.sessions().current().await, Some(session));
    }

    #[tokio::test]
    async fn test_state_mismatch_skips_network_and_discards_nonce() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let exchanger = exchanger(oauth(&server)).await;
        exchanger.sessions().store_nonce("XYZ").await.unwrap();

        let result = exchanger
            .exchange_code("ABC123", None, Some("WRONG"))
            .await;
        assert!(matches!(result, Err(CrmError::InvalidState)));
        assert_eq!(exchanger.sessions().take_nonce().await, None);
        assert!(exchanger.sessions().current().await.is_none());
    }

    #[tokio::test]
    async fn test_missing_state_is_invalid() {
        let server = MockServer::start().await;
        let exchanger = exchanger(oauth(&server)).await;
        exchanger.sessions().store_nonce("XYZ").await.unwrap();

        let result = exchanger.exchange_code("ABC123", None, None).await;
        assert!(matches!(result, Err(CrmError::InvalidState)));
    }

    #[tokio::test]
    async fn test_misconfigured_client_fails_before_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = OAuthConfig {
            login_url: server.uri(),
            ..OAuthConfig::default()
        };
        let exchanger = exchanger(config).await;
        exchanger.sessions().store_nonce("XYZ").await.unwrap();

        let result = exchanger.exchange_code("ABC123", None, Some("XYZ")).await;
        assert!(matches!(result, Err(CrmError::MisconfiguredClient(_))));

        let result = exchanger
            .exchange_password("user@example.com", "pw", &server.uri(), None)
            .await;
        assert!(matches!(result, Err(CrmError::MisconfiguredClient(_))));
    }

    #[tokio::test]
    async fn test_missing_token_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "instance_url": "https://org.my.crm",
            })))
            .mount(&server)
            .await;

        let exchanger = exchanger(oauth(&server)).await;
        exchanger.sessions().store_nonce("XYZ").await.unwrap();

        let result = exchanger.exchange_code("ABC123", None, Some("XYZ")).await;
        assert!(matches!(result, Err(CrmError::InvalidResponse(_))));
        assert!(exchanger.sessions().current().await.is_none());
    }

    #[tokio::test]
    async fn test_provider_rejection_surfaces_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "expired authorization code",
            })))
            .mount(&server)
            .await;

        let exchanger = exchanger(oauth(&server)).await;
        exchanger.sessions().store_nonce("XYZ").await.unwrap();

        let err = exchanger
            .exchange_code("ABC123", None, Some("XYZ"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("expired authorization code"));
    }

    #[tokio::test]
    async fn test_password_grant_appends_security_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .and(body_string_contains("grant_type=password"))
            .and(body_string_contains("username=user%40example.com"))
            .and(body_string_contains("password=hunter2TOKEN"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "T2",
                "instance_url": "https://org.my.crm",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let exchanger = exchanger(oauth(&server)).await;
        let session = exchanger
            .exchange_password("user@example.com", "hunter2", &server.uri(), Some("TOKEN"))
            .await
            .unwrap();

        assert_eq!(session.access_token, "T2");
        assert!(exchanger.sessions().is_authenticated().await);
    }

    #[tokio::test]
    async fn test_pkce_exchange_sends_verifier_without_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .and(body_string_contains("code_verifier=the-verifier"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "T3",
                "instance_url": "https://org.my.crm",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = OAuthConfig {
            client_id: "client-id".into(),
            login_url: server.uri(),
            use_pkce: true,
            ..OAuthConfig::default()
        };
        let exchanger = exchanger(config).await;
        exchanger.sessions().store_nonce("XYZ").await.unwrap();
        exchanger
            .sessions()
            .store_pkce_verifier("the-verifier")
            .await
            .unwrap();

        let session = exchanger
            .exchange_code("ABC123", None, Some("XYZ"))
            .await
            .unwrap();
        assert_eq!(session.access_token, "T3");

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body).to_string();
        assert!(!body.contains("client_secret"));
    }

    #[test]
    fn test_login_host_selection() {
        assert_eq!(
            login_host(Some("https://org.my.crm/"), "https://login.salesforce.com"),
            "https://org.my.crm"
        );
        assert_eq!(
            login_host(Some("  "), "https://login.salesforce.com"),
            "https://login.salesforce.com"
        );
        assert_eq!(
            login_host(None, "https://login.salesforce.com"),
            "https://login.salesforce.com"
        );
    }
}
