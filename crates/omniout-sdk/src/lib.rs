//! # OmniOut SDK
//!
//! Core of the OmniOut CRM client: OAuth2 login against the CRM platform,
//! durable session persistence, and an authenticated REST client for
//! accounts, contacts, leads and opportunities.
//!
//! ```rust,no_run
//! use omniout_sdk::{Config, CrmClient, FileStorage, SessionStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> omniout_sdk::CrmResult<()> {
//! let config = Config::load(None)?;
//! let storage = Arc::new(FileStorage::new(config.storage.resolve_data_dir()?));
//! let sessions = Arc::new(SessionStore::open(storage).await);
//! let client = CrmClient::from_config(&config, sessions)?;
//!
//! for account in client.accounts(50).await {
//!     println!("{}", account.name.unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod demo;
pub mod error;
pub mod records;
pub mod session;
pub mod storage;

pub use auth::{FlowState, Navigator, RedirectHandler, RedirectParams, TokenExchanger};
pub use client::{ClientBuilder, CrmClient};
pub use config::{ApiConfig, Config, OAuthConfig, StorageConfig};
pub use error::{CrmError, CrmResult};
pub use records::{Account, Contact, Lead, Opportunity, RelatedAccount, SObject};
pub use session::{Session, SessionStore};
pub use storage::{FileStorage, LocalStorage, MemoryStorage, StorageError};
