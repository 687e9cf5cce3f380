//! Redirect-based login
//!
//! [`RedirectHandler::initiate`] stores a fresh state nonce, builds the
//! provider authorization URL and hands it to a [`Navigator`].
//! [`RedirectHandler::complete_from_redirect`] runs when the provider sends
//! the user back to the redirect URI. Because the nonce lives in local
//! storage, the redirect may be completed by a different process than the
//! one that initiated the login.
//!
//! ```text
//! Idle --initiate--> AwaitingRedirect --complete--> Completed | Failed
//! ```
//!
//! No timeout applies while waiting for the redirect.

use super::exchange::TokenExchanger;
use super::pkce::{generate_pkce_verifier, generate_state};
use crate::config::OAuthConfig;
use crate::error::{CrmError, CrmResult};
use crate::session::Session;
use oauth2::{
    basic::BasicClient, AuthUrl, ClientId, CsrfToken, PkceCodeChallenge, PkceCodeVerifier,
    RedirectUrl, Scope, TokenUrl,
};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

/// Sends the user to the provider's authorization page
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &Url) -> CrmResult<()>;
}

/// Where the redirect login currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    AwaitingRedirect,
    Completed,
    Failed(String),
}

impl FlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Completed | FlowState::Failed(_))
    }
}

/// Query parameters the provider appends to the redirect URI
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RedirectParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub instance_url: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl RedirectParams {
    /// Parse a raw query string, with or without the leading `?`
    ///
    /// Empty values are treated as absent.
    pub fn from_query(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        let mut params = Self::default();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = Some(value.into_owned()).filter(|v| !v.is_empty());
            match key.as_ref() {
                "code" => params.code = value,
                "state" => params.state = value,
                "instance_url" => params.instance_url = value,
                "error" => params.error = value,
                "error_description" => params.error_description = value,
                _ => {}
            }
        }

        params
    }

    /// Parameters of a full redirect URL
    pub fn from_url(url: &Url) -> Self {
        Self::from_query(url.query().unwrap_or_default())
    }

    /// Accept either a full redirect URL or a bare query string
    pub fn parse(input: &str) -> Self {
        match Url::parse(input.trim()) {
            Ok(url) => Self::from_url(&url),
            Err(_) => Self::from_query(input),
        }
    }
}

/// Drives the authorization code flow
#[derive(Debug)]
pub struct RedirectHandler {
    exchanger: TokenExchanger,
    state: FlowState,
}

impl RedirectHandler {
    pub fn new(exchanger: TokenExchanger) -> Self {
        Self {
            exchanger,
            state: FlowState::Idle,
        }
    }

    /// Current flow state
    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// Abandon any pending login and return to `Idle`
    pub fn reset(&mut self) {
        self.state = FlowState::Idle;
    }

    fn oauth(&self) -> &OAuthConfig {
        self.exchanger.oauth_config()
    }

    /// Build the provider authorization URL for `state`
    pub fn authorization_url(&self, state: &str, pkce_verifier: Option<&str>) -> CrmResult<Url> {
        let oauth = self.oauth();

        let client = BasicClient::new(
            ClientId::new(oauth.client_id.clone()),
            None,
            AuthUrl::new(OAuthConfig::authorize_endpoint(&oauth.login_url))
                .map_err(|e| CrmError::Config(format!("Invalid login URL: {}", e)))?,
            Some(
                TokenUrl::new(OAuthConfig::token_endpoint(&oauth.login_url))
                    .map_err(|e| CrmError::Config(format!("Invalid login URL: {}", e)))?,
            ),
        )
        .set_redirect_uri(
            RedirectUrl::new(oauth.redirect_uri.clone())
                .map_err(|e| CrmError::Config(format!("Invalid redirect URI: {}", e)))?,
        );

        let mut request = client.authorize_url(|| CsrfToken::new(state.to_string()));
        for scope in &oauth.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }
        if let Some(verifier) = pkce_verifier {
            let verifier = PkceCodeVerifier::new(verifier.to_string());
            request = request.set_pkce_challenge(PkceCodeChallenge::from_code_verifier_sha256(
                &verifier,
            ));
        }

        let (url, _csrf_token) = request.url();
        Ok(url)
    }

    /// Start a login: persist a nonce and navigate to the provider
    ///
    /// Allowed from `Idle` or after a previous attempt finished.
    pub async fn initiate(&mut self, navigator: &dyn Navigator) -> CrmResult<Url> {
        if !(self.state == FlowState::Idle || self.state.is_terminal()) {
            return Err(CrmError::FlowInProgress);
        }

        let oauth = self.oauth();
        oauth.ensure_configured(!oauth.use_pkce)?;

        let sessions = self.exchanger.sessions().clone();
        let nonce = generate_state();
        sessions.store_nonce(&nonce).await?;

        let verifier = if self.oauth().use_pkce {
            let verifier = generate_pkce_verifier();
            sessions.store_pkce_verifier(&verifier).await?;
            Some(verifier)
        } else {
            None
        };

        let url = self.authorization_url(&nonce, verifier.as_deref())?;
        debug!("Authorization URL built for {}", self.oauth().login_url);

        if let Err(e) = navigator.navigate(&url) {
            self.state = FlowState::Failed(e.to_string());
            return Err(e);
        }

        info!("Waiting for OAuth redirect");
        self.state = FlowState::AwaitingRedirect;
        Ok(url)
    }

    /// Finish a login from the provider's redirect parameters
    ///
    /// Provider errors win over a present code. Only a redirect carrying a
    /// code reaches the token exchange, which validates the state nonce.
    pub async fn complete_from_redirect(&mut self, params: &RedirectParams) -> CrmResult<Session> {
        let result = self.complete_inner(params).await;
        self.state = match &result {
            Ok(_) => FlowState::Completed,
            Err(e) => FlowState::Failed(e.to_string()),
        };
        result
    }

    async fn complete_inner(&self, params: &RedirectParams) -> CrmResult<Session> {
        if let Some(error) = &params.error {
            warn!("Provider returned an error on redirect: {}", error);
            self.discard_pending().await;
            return Err(CrmError::ProviderError {
                error: error.clone(),
                description: params.error_description.clone(),
            });
        }

        let Some(code) = params.code.as_deref() else {
            warn!("Redirect carried no authorization code");
            self.discard_pending().await;
            return Err(CrmError::MissingCode);
        };

        let hint = params
            .instance_url
            .as_deref()
            .unwrap_or(self.oauth().login_url.as_str());

        self.exchanger
            .exchange_code(code, Some(hint), params.state.as_deref())
            .await
    }

    async fn discard_pending(&self) {
        let sessions = self.exchanger.sessions();
        sessions.take_nonce().await;
        sessions.take_pkce_verifier().await;
    }
}
