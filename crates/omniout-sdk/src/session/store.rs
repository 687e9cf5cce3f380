//! Session persistence with an in-memory mirror
//!
//! The SessionStore is the single owner of the active session. The API
//! client, token exchanger and redirect handler all share one store through
//! an `Arc`, so a login or logout performed by any of them is visible to the
//! others immediately. Concurrent writers are not coordinated: the last
//! write to storage wins.

use super::types::Session;
use crate::error::{CrmError, CrmResult};
use crate::storage::LocalStorage;
use omniout_common::{OAUTH_STATE_STORAGE_KEY, PKCE_VERIFIER_STORAGE_KEY, SESSION_STORAGE_KEY};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Owns the active session and its persisted copy
pub struct SessionStore {
    storage: Arc<dyn LocalStorage>,
    current: RwLock<Option<Session>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create a store with no active session; nothing is read yet
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            storage,
            current: RwLock::new(None),
        }
    }

    /// Create a store and restore any previously persisted session
    pub async fn open(storage: Arc<dyn LocalStorage>) -> Self {
        let store = Self::new(storage);
        store.load().await;
        store
    }

    /// Read the persisted session into memory
    ///
    /// Absent, unreadable or malformed blobs all yield `None`; malformed
    /// residue is removed. Never fails.
    pub async fn load(&self) -> Option<Session> {
        let loaded = self.read_persisted().await;
        *self.current.write().await = loaded.clone();
        loaded
    }

    async fn read_persisted(&self) -> Option<Session> {
        let raw = match self.storage.get(SESSION_STORAGE_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read stored session: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => {
                let session = session.normalized();
                if session.is_complete() {
                    debug!("Restored session for {}", session.instance_url);
                    return Some(session);
                }
                warn!("Stored session is incomplete, discarding it");
            }
            Err(e) => {
                warn!("Stored session is malformed, discarding it: {}", e);
            }
        }

        if let Err(e) = self.storage.remove(SESSION_STORAGE_KEY).await {
            warn!("Failed to remove malformed session: {}", e);
        }
        None
    }

    /// Persist `session` and make it the active one
    pub async fn save(&self, session: Session) -> CrmResult<()> {
        let session = session.normalized();
        if !session.is_complete() {
            return Err(CrmError::InvalidResponse(
                "refusing to store an incomplete session".to_string(),
            ));
        }

        let blob = serde_json::to_string(&session)?;
        self.storage.set(SESSION_STORAGE_KEY, &blob).await?;
        info!("Session stored for {}", session.instance_url);

        *self.current.write().await = Some(session);
        Ok(())
    }

    /// Forget the session along with any in-flight login state
    ///
    /// Memory is cleared even when a storage removal fails; the first
    /// failure is returned.
    pub async fn clear(&self) -> CrmResult<()> {
        *self.current.write().await = None;

        let mut first_error = None;
        for key in [
            SESSION_STORAGE_KEY,
            OAUTH_STATE_STORAGE_KEY,
            PKCE_VERIFIER_STORAGE_KEY,
        ] {
            if let Err(e) = self.storage.remove(key).await {
                warn!("Failed to remove {}: {}", key, e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => {
                info!("Session cleared");
                Ok(())
            }
        }
    }

    /// The active session, if any
    pub async fn current(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    /// True when a session is active
    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Persist the anti-forgery nonce for a login in progress
    pub(crate) async fn store_nonce(&self, nonce: &str) -> CrmResult<()> {
        self.storage.set(OAUTH_STATE_STORAGE_KEY, nonce).await?;
        Ok(())
    }

    /// Read and delete the stored nonce
    pub(crate) async fn take_nonce(&self) -> Option<String> {
        self.take(OAUTH_STATE_STORAGE_KEY).await
    }

    /// Persist the PKCE verifier for a login in progress
    pub(crate) async fn store_pkce_verifier(&self, verifier: &str) -> CrmResult<()> {
        self.storage.set(PKCE_VERIFIER_STORAGE_KEY, verifier).await?;
        Ok(())
    }

    /// Read and delete the stored PKCE verifier
    pub(crate) async fn take_pkce_verifier(&self) -> Option<String> {
        self.take(PKCE_VERIFIER_STORAGE_KEY).await
    }

    async fn take(&self, key: &str) -> Option<String> {
        let value = match self.storage.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                None
            }
        };
        if let Err(e) = self.storage.remove(key).await {
            warn!("Failed to remove {}: {}", key, e);
        }
        value.filter(|v| !v.is_empty())
    }
}
