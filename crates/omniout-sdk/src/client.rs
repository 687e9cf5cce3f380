//! HTTP client for the CRM REST API
//!
//! Every request is authorized with the active session from the shared
//! [`SessionStore`] (`Authorization: Bearer {token}`) and addressed under
//! `{instance_url}/services/data/v{api_version}`.
//!
//! Failure handling differs by operation:
//! - queries soft-fail to an empty list (use [`CrmClient::try_query`] to see the error)
//! - creates hard-fail with a [`CrmError`]
//! - updates soft-fail to `false`
//!
//! There are no retries; each call is a single request.
//!
//! ```rust,no_run
//! use omniout_sdk::{ClientBuilder, MemoryStorage, SessionStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> omniout_sdk::CrmResult<()> {
//! let sessions = Arc::new(SessionStore::open(Arc::new(MemoryStorage::new())).await);
//! let client = ClientBuilder::default().sessions(sessions).build()?;
//!
//! let leads = client.leads(25).await;
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::demo;
use crate::error::{CrmError, CrmResult};
use crate::records::{Account, Contact, Lead, Opportunity, SObject};
use crate::session::{Session, SessionStore};
use reqwest::{header, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of rows fetched by list operations
pub const DEFAULT_LIMIT: u32 = 50;

/// Query endpoint payload
#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    records: Vec<T>,
}

/// Create endpoint payload
#[derive(Debug, Deserialize)]
struct CreateResponse {
    id: String,
}

/// One entry of a CRM error body
#[derive(Debug, Deserialize)]
struct ApiErrorItem {
    message: Option<String>,
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
}

/// CRM error bodies come either as a list or as a single object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiErrorBody {
    Many(Vec<ApiErrorItem>),
    One(ApiErrorItem),
}

impl ApiErrorBody {
    fn message(self) -> Option<String> {
        let items = match self {
            ApiErrorBody::Many(items) => items,
            ApiErrorBody::One(item) => vec![item],
        };

        let messages: Vec<String> = items
            .into_iter()
            .filter_map(|item| match (item.error_code, item.message) {
                (Some(code), Some(message)) => Some(format!("{code}: {message}")),
                (None, Some(message)) => Some(message),
                (Some(code), None) => Some(code),
                (None, None) => None,
            })
            .collect();

        (!messages.is_empty()).then(|| messages.join("; "))
    }
}

/// Authenticated client for CRM records
#[derive(Debug, Clone)]
pub struct CrmClient {
    http_client: reqwest::Client,
    sessions: Arc<SessionStore>,
    demo_mode: bool,
}

impl CrmClient {
    fn new(sessions: Arc<SessionStore>, timeout: Duration, demo_mode: bool) -> CrmResult<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            sessions,
            demo_mode,
        })
    }

    /// Build a client from the application configuration
    pub fn from_config(config: &Config, sessions: Arc<SessionStore>) -> CrmResult<Self> {
        ClientBuilder::default()
            .sessions(sessions)
            .timeout(config.request_timeout())
            .demo_mode(config.demo_mode)
            .build()
    }

    /// True when serving demo data instead of calling the CRM
    pub fn is_demo(&self) -> bool {
        self.demo_mode
    }

    /// Shared session store
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// True when a session is active
    pub async fn is_authenticated(&self) -> bool {
        self.sessions.is_authenticated().await
    }

    /// Drop the session and any pending login state
    pub async fn logout(&self) -> CrmResult<()> {
        self.sessions.clear().await
    }

    // ===== Queries =====

    /// Run `statement` with a `LIMIT` clause, returning an empty list on any failure
    pub async fn query<T: DeserializeOwned>(&self, statement: &str, limit: u32) -> Vec<T> {
        match self.try_query(statement, limit).await {
            Ok(records) => records,
            Err(CrmError::NotAuthenticated) => {
                debug!("Query skipped: no active session");
                Vec::new()
            }
            Err(e) => {
                error!("Failed to fetch records: {}", e);
                Vec::new()
            }
        }
    }

    /// Run `statement` with a `LIMIT` clause
    pub async fn try_query<T: DeserializeOwned>(
        &self,
        statement: &str,
        limit: u32,
    ) -> CrmResult<Vec<T>> {
        if self.demo_mode {
            return demo::query(statement, limit);
        }

        let statement = format!("{statement} LIMIT {limit}");
        let path = format!("/query/?q={}", urlencoding::encode(&statement));

        let request = self.authorized(Method::GET, &path).await?;
        let response = request.send().await?;
        let body: QueryResponse<T> = handle_response(response).await?;

        debug!("Fetched {} records", body.records.len());
        Ok(body.records)
    }

    /// Default listing for an object type
    pub async fn records<T: SObject>(&self, limit: u32) -> Vec<T> {
        self.query(&T::select_statement(), limit).await
    }

    pub async fn accounts(&self, limit: u32) -> Vec<Account> {
        self.records(limit).await
    }

    pub async fn contacts(&self, limit: u32) -> Vec<Contact> {
        self.records(limit).await
    }

    /// Leads that have not been converted
    pub async fn leads(&self, limit: u32) -> Vec<Lead> {
        self.records(limit).await
    }

    /// Opportunities that are still open
    pub async fn opportunities(&self, limit: u32) -> Vec<Opportunity> {
        self.records(limit).await
    }

    // ===== Writes =====

    /// Create a record and return its id
    ///
    /// Fails with `NotAuthenticated` before any request when logged out.
    pub async fn create<B: Serialize + ?Sized>(
        &self,
        object_type: &str,
        fields: &B,
    ) -> CrmResult<String> {
        if self.demo_mode {
            let id = demo::new_id(object_type);
            info!("Demo mode: pretending to create {} {}", object_type, id);
            return Ok(id);
        }

        let result = self.create_inner(object_type, fields).await;
        match &result {
            Ok(id) => info!("Created {} {}", object_type, id),
            Err(e) => error!("Failed to create {}: {}", object_type, e),
        }
        result
    }

    async fn create_inner<B: Serialize + ?Sized>(
        &self,
        object_type: &str,
        fields: &B,
    ) -> CrmResult<String> {
        let path = format!("/sobjects/{}/", urlencoding::encode(object_type));
        let request = self.authorized(Method::POST, &path).await?.json(fields);
        let response = request.send().await?;
        let created: CreateResponse = handle_response(response).await?;
        Ok(created.id)
    }

    /// Update fields of an existing record; returns whether it succeeded
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        object_type: &str,
        id: &str,
        fields: &B,
    ) -> bool {
        if self.demo_mode {
            info!("Demo mode: pretending to update {} {}", object_type, id);
            return true;
        }

        match self.update_inner(object_type, id, fields).await {
            Ok(()) => {
                info!("Updated {} {}", object_type, id);
                true
            }
            Err(CrmError::NotAuthenticated) => {
                warn!("Update of {} {} skipped: no active session", object_type, id);
                false
            }
            Err(e) => {
                error!("Failed to update {} {}: {}", object_type, id, e);
                false
            }
        }
    }

    async fn update_inner<B: Serialize + ?Sized>(
        &self,
        object_type: &str,
        id: &str,
        fields: &B,
    ) -> CrmResult<()> {
        let path = format!(
            "/sobjects/{}/{}",
            urlencoding::encode(object_type),
            urlencoding::encode(id)
        );
        let request = self.authorized(Method::PATCH, &path).await?.json(fields);
        let response = request.send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }

    /// Create a typed record
    pub async fn create_record<T: SObject>(&self, record: &T) -> CrmResult<String> {
        self.create(T::OBJECT_NAME, record).await
    }

    /// Update a typed record; only the set fields are sent
    pub async fn update_record<T: SObject>(&self, id: &str, record: &T) -> bool {
        self.update(T::OBJECT_NAME, id, record).await
    }

    pub async fn create_account(&self, account: &Account) -> CrmResult<String> {
        self.create_record(account).await
    }

    pub async fn create_lead(&self, lead: &Lead) -> CrmResult<String> {
        self.create_record(lead).await
    }

    pub async fn update_contact(&self, id: &str, contact: &Contact) -> bool {
        self.update_record(id, contact).await
    }

    // ===== Private Helper Methods =====

    async fn require_session(&self) -> CrmResult<Session> {
        self.sessions
            .current()
            .await
            .ok_or(CrmError::NotAuthenticated)
    }

    /// Request builder for `path` under the versioned API root, with auth headers
    async fn authorized(&self, method: Method, path: &str) -> CrmResult<RequestBuilder> {
        let session = self.require_session().await?;
        let url = format!("{}{}", session.api_base(), path);
        debug!("{} {}", method, url);

        Ok(self
            .http_client
            .request(method, url)
            .header(header::AUTHORIZATION, session.bearer())
            .header(header::CONTENT_TYPE, "application/json"))
    }
}

async fn handle_response<T: DeserializeOwned>(response: Response) -> CrmResult<T> {
    if response.status().is_success() {
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| CrmError::InvalidResponse(format!("Unexpected response body: {e}")))
    } else {
        Err(error_from_response(response).await)
    }
}

async fn error_from_response(response: Response) -> CrmError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(ApiErrorBody::message)
        .or_else(|| (!body.trim().is_empty()).then(|| body.clone()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    CrmError::RemoteApi {
        status: status.as_u16(),
        message,
    }
}

/// Builder for [`CrmClient`]
#[derive(Default)]
pub struct ClientBuilder {
    sessions: Option<Arc<SessionStore>>,
    timeout: Option<Duration>,
    demo_mode: bool,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session store shared with the login flow
    pub fn sessions(mut self, sessions: Arc<SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Serve demo data instead of calling the CRM
    pub fn demo_mode(mut self, enabled: bool) -> Self {
        self.demo_mode = enabled;
        self
    }

    pub fn build(self) -> CrmResult<CrmClient> {
        let sessions = self.sessions.ok_or_else(|| {
            CrmError::Config("a session store is required to build the client".into())
        })?;
        let timeout = self
            .timeout
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        CrmClient::new(sessions, timeout, self.demo_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_with_session(server: &MockServer) -> CrmClient {
        let sessions = Arc::new(SessionStore::open(Arc::new(MemoryStorage::new())).await);
        sessions
            .save(Session::new(server.uri(), "test-token", "58.0"))
            .await
            .unwrap();
        ClientBuilder::default().sessions(sessions).build().unwrap()
    }

    async fn client_without_session() -> CrmClient {
        let sessions = Arc::new(SessionStore::open(Arc::new(MemoryStorage::new())).await);
        ClientBuilder::default().sessions(sessions).build().unwrap()
    }

    #[tokio::test]
    async fn test_query_appends_limit_and_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/services/data/v58.0/query/"))
            .and(query_param(
                "q",
                "SELECT Id, Name, Email, Phone, Title, Account.Name FROM Contact LIMIT 10",
            ))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalSize": 1,
                "done": true,
                "records": [{
                    "attributes": { "type": "Contact" },
                    "Id": "003xx",
                    "Name": "Jane Doe",
                    "Email": "jane@example.com",
                    "Account": { "Name": "Acme" },
                }],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_session(&server).await;
        let contacts = client.contacts(10).await;

        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name.as_deref(), Some("Jane Doe"));
    }

    #[tokio::test]
    async fn test_query_soft_fails_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_with_session(&server).await;
        assert!(client.accounts(50).await.is_empty());

        let err = client
            .try_query::<Account>("SELECT Id FROM Account", 5)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_query_without_session_is_empty() {
        let client = client_without_session().await;
        assert!(client.opportunities(50).await.is_empty());
        assert!(matches!(
            client.try_query::<Lead>("SELECT Id FROM Lead", 5).await,
            Err(CrmError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_create_returns_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/data/v58.0/sobjects/Lead/"))
            .and(header("Authorization", "Bearer test-token"))
            .and(body_json(json!({ "LastName": "Becker", "Company": "Umbrella" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "00Qxx0000001",
                "success": true,
                "errors": [],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_session(&server).await;
        let lead = Lead {
            last_name: Some("Becker".into()),
            company: Some("Umbrella".into()),
            ..Lead::default()
        };

        assert_eq!(client.create_lead(&lead).await.unwrap(), "00Qxx0000001");
    }

    #[tokio::test]
    async fn test_create_surfaces_list_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!([{
                "message": "Required fields are missing: [Name]",
                "errorCode": "REQUIRED_FIELD_MISSING",
                "fields": ["Name"],
            }])))
            .mount(&server)
            .await;

        let client = client_with_session(&server).await;
        let err = client
            .create_account(&Account::default())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "CRM API error (400): REQUIRED_FIELD_MISSING: Required fields are missing: [Name]"
        );
    }

    #[tokio::test]
    async fn test_create_without_session_is_not_authenticated() {
        let client = client_without_session().await;
        let result = client.create("Account", &json!({ "Name": "Acme" })).await;
        assert!(matches!(result, Err(CrmError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_update_reports_bool() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/services/data/v58.0/sobjects/Contact/003ok"))
            .and(body_json(json!({ "Title": "CTO" })))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/services/data/v58.0/sobjects/Contact/003missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!([{
                "message": "Provided external ID field does not exist or is not accessible",
                "errorCode": "NOT_FOUND",
            }])))
            .mount(&server)
            .await;

        let client = client_with_session(&server).await;
        let contact = Contact {
            title: Some("CTO".into()),
            ..Contact::default()
        };

        assert!(client.update_contact("003ok", &contact).await);
        assert!(!client.update_contact("003missing", &contact).await);
    }

    #[tokio::test]
    async fn test_path_segments_are_escaped() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/services/data/v58.0/sobjects/Contact/003xx%3Ffields%3DName%2F..%2FAccount"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/services/data/v58.0/sobjects/Custom%2FObject/"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "a00xx" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_session(&server).await;
        assert!(
            client
                .update("Contact", "003xx?fields=Name/../Account", &json!({ "Title": "CTO" }))
                .await
        );
        assert_eq!(
            client.create("Custom/Object", &json!({})).await.unwrap(),
            "a00xx"
        );
    }

    #[tokio::test]
    async fn test_update_without_session_is_false() {
        let client = client_without_session().await;
        assert!(!client.update("Contact", "003xx", &json!({})).await);
    }

    #[tokio::test]
    async fn test_demo_mode_needs_no_session() {
        let sessions = Arc::new(SessionStore::open(Arc::new(MemoryStorage::new())).await);
        let client = ClientBuilder::default()
            .sessions(sessions)
            .demo_mode(true)
            .build()
            .unwrap();

        assert!(client.is_demo());
        assert_eq!(client.accounts(2).await.len(), 2);
        assert!(!client.leads(50).await.is_empty());
        assert!(client
            .create("Account", &json!({ "Name": "Acme" }))
            .await
            .unwrap()
            .starts_with("001DEMO"));
        assert!(client.update("Contact", "003xx", &json!({})).await);
    }

    #[test]
    fn test_builder_requires_sessions() {
        assert!(matches!(
            ClientBuilder::default().build(),
            Err(CrmError::Config(_))
        ));
    }

    #[test]
    fn test_error_body_shapes() {
        let single: ApiErrorBody = serde_json::from_str(r#"{"message":"Name too long"}"#).unwrap();
        assert_eq!(single.message().as_deref(), Some("Name too long"));

        let many: ApiErrorBody = serde_json::from_str(
            r#"[{"message":"a","errorCode":"X"},{"message":"b","errorCode":"Y"}]"#,
        )
        .unwrap();
        assert_eq!(many.message().as_deref(), Some("X: a; Y: b"));

        let empty: ApiErrorBody = serde_json::from_str("[]").unwrap();
        assert_eq!(empty.message(), None);
    }
}
