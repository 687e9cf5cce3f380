//! Integration tests for the OmniOut SDK

use omniout_common::{OAUTH_STATE_STORAGE_KEY, SESSION_STORAGE_KEY};
use omniout_sdk::{
    Account, ClientBuilder, CrmClient, CrmError, CrmResult, FileStorage, LocalStorage,
    MemoryStorage, Navigator, OAuthConfig, RedirectHandler, RedirectParams, SObject, SessionStore,
    TokenExchanger,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::{Arc, Mutex};
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    storage: Arc<dyn LocalStorage>,
    sessions: Arc<SessionStore>,
    handler: RedirectHandler,
    client: CrmClient,
}

async fn harness(server: &MockServer, storage: Arc<dyn LocalStorage>) -> Harness {
    let sessions = Arc::new(SessionStore::open(storage.clone()).await);
    let oauth = OAuthConfig {
        client_id: "client-id".into(),
        client_secret: "client-secret".into(),
        login_url: server.uri(),
        ..OAuthConfig::default()
    };
    let exchanger = TokenExchanger::new(reqwest::Client::new(), oauth, "58.0", sessions.clone());
    let client = ClientBuilder::default()
        .sessions(sessions.clone())
        .build()
        .unwrap();

    Harness {
        storage,
        sessions,
        handler: RedirectHandler::new(exchanger),
        client,
    }
}

async fn mount_token_endpoint(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=ABC123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "instance_url": server.uri(),
            "id": "https://login.example.com/id/00D/005",
            "token_type": "Bearer",
            "issued_at": "1700000000000",
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// Remembers the authorization URLs it was asked to open
#[derive(Default)]
struct RecordingNavigator {
    visited: Mutex<Vec<Url>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, url: &Url) -> CrmResult<()> {
        self.visited.lock().unwrap().push(url.clone());
        Ok(())
    }
}

fn redirect(server: &MockServer, state: &str) -> RedirectParams {
    RedirectParams {
        code: Some("ABC123".into()),
        state: Some(state.into()),
        instance_url: Some(server.uri()),
        ..RedirectParams::default()
    }
}

#[tokio::test]
async fn test_login_then_query() {
    let server = MockServer::start().await;
    let mut h = harness(&server, Arc::new(MemoryStorage::new())).await;

    let navigator = RecordingNavigator::default();
    let url = h.handler.initiate(&navigator).await.unwrap();
    assert_eq!(navigator.visited.lock().unwrap().as_slice(), &[url.clone()]);

    let state = url
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .unwrap();
    assert_eq!(
        h.storage.get(OAUTH_STATE_STORAGE_KEY).await.unwrap(),
        Some(state.clone())
    );

    mount_token_endpoint(&server, "T1").await;
    let session = h
        .handler
        .complete_from_redirect(&redirect(&server, &state))
        .await
        .unwrap();
    assert_eq!(session.access_token, "T1");
    assert_eq!(session.api_version, "58.0");
    assert!(h.client.is_authenticated().await);
    assert_eq!(h.storage.get(OAUTH_STATE_STORAGE_KEY).await.unwrap(), None);

    Mock::given(method("GET"))
        .and(path("/services/data/v58.0/query/"))
        .and(query_param(
            "q",
            format!("{} LIMIT 50", Account::select_statement()),
        ))
        .and(header("Authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalSize": 2,
            "done": true,
            "records": [
                { "Id": "001A", "Name": "Acme", "Industry": "Manufacturing" },
                { "Id": "001B", "Name": "Globex" },
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let accounts = h.client.accounts(50).await;
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0].name.as_deref(), Some("Acme"));
    assert_eq!(accounts[1].id.as_deref(), Some("001B"));
}

#[tokio::test]
async fn test_state_mismatch_never_calls_token_endpoint() {
    let server = MockServer::start().await;
    let mut h = harness(&server, Arc::new(MemoryStorage::new())).await;

    h.storage.set(OAUTH_STATE_STORAGE_KEY, "XYZ").await.unwrap();
    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = h
        .handler
        .complete_from_redirect(&redirect(&server, "FORGED"))
        .await;

    assert!(matches!(result, Err(CrmError::InvalidState)));
    assert!(!h.sessions.is_authenticated().await);
    assert_eq!(h.storage.get(OAUTH_STATE_STORAGE_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_provider_error_never_calls_token_endpoint() {
    let server = MockServer::start().await;
    let mut h = harness(&server, Arc::new(MemoryStorage::new())).await;

    h.storage.set(OAUTH_STATE_STORAGE_KEY, "XYZ").await.unwrap();
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let params = RedirectParams::parse(
        "http://localhost:8080/oauth/callback?error=access_denied&error_description=end-user+denied+authorization&state=XYZ",
    );
    let err = h.handler.complete_from_redirect(&params).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "OAuth Error: access_denied - end-user denied authorization"
    );
}

#[tokio::test]
async fn test_create_error_message_is_surfaced() {
    let server = MockServer::start().await;
    let mut h = harness(&server, Arc::new(MemoryStorage::new())).await;

    h.storage.set(OAUTH_STATE_STORAGE_KEY, "XYZ").await.unwrap();
    mount_token_endpoint(&server, "T1").await;
    h.handler
        .complete_from_redirect(&redirect(&server, "XYZ"))
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/services/data/v58.0/sobjects/Account/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Name too long" })),
        )
        .mount(&server)
        .await;

    let err = h
        .client
        .create("Account", &json!({ "Name": "x".repeat(300) }))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("Name too long"));
}

#[tokio::test]
async fn test_logout_clears_everything() {
    let server = MockServer::start().await;
    let mut h = harness(&server, Arc::new(MemoryStorage::new())).await;

    h.storage.set(OAUTH_STATE_STORAGE_KEY, "XYZ").await.unwrap();
    mount_token_endpoint(&server, "T1").await;
    h.handler
        .complete_from_redirect(&redirect(&server, "XYZ"))
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/services/data/v58.0/query/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "records": [] })))
        .expect(0)
        .mount(&server)
        .await;

    h.storage.set(OAUTH_STATE_STORAGE_KEY, "LEFTOVER").await.unwrap();
    h.client.logout().await.unwrap();

    assert!(!h.client.is_authenticated().await);
    assert_eq!(h.storage.get(SESSION_STORAGE_KEY).await.unwrap(), None);
    assert_eq!(h.storage.get(OAUTH_STATE_STORAGE_KEY).await.unwrap(), None);
    assert!(h.client.accounts(50).await.is_empty());
}

#[tokio::test]
async fn test_create_without_session_sends_nothing() {
    let server = MockServer::start().await;
    let h = harness(&server, Arc::new(MemoryStorage::new())).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "001X" })))
        .expect(0)
        .mount(&server)
        .await;

    let result = h.client.create("Account", &json!({ "Name": "Acme" })).await;
    assert!(matches!(result, Err(CrmError::NotAuthenticated)));
}

#[tokio::test]
async fn test_session_survives_restart() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    {
        let mut h = harness(&server, Arc::new(FileStorage::new(dir.path()))).await;
        h.storage.set(OAUTH_STATE_STORAGE_KEY, "XYZ").await.unwrap();
        mount_token_endpoint(&server, "T1").await;
        h.handler
            .complete_from_redirect(&redirect(&server, "XYZ"))
            .await
            .unwrap();
    }

    let restarted = harness(&server, Arc::new(FileStorage::new(dir.path()))).await;
    let session = restarted.sessions.current().await.unwrap();

    assert_eq!(session.access_token, "T1");
    assert_eq!(session.instance_url, server.uri());
    assert_eq!(
        session.api_base(),
        format!("{}/services/data/v58.0", server.uri())
    );
}
