//! Shared state built once per command invocation

use crate::error::Result;
use omniout_sdk::{
    Config, CrmClient, FileStorage, RedirectHandler, SessionStore, TokenExchanger,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Configuration plus the SDK objects every handler needs
///
/// The client and the token exchanger share one [`SessionStore`], so a
/// login performed through one is visible to the other.
pub struct AppContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub sessions: Arc<SessionStore>,
    pub client: CrmClient,
}

impl AppContext {
    /// Load configuration and restore any persisted session
    pub async fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load(config_path)?;
        let data_dir = config.storage.resolve_data_dir()?;
        debug!("Using data directory {}", data_dir.display());

        let storage = Arc::new(FileStorage::new(&data_dir));
        let sessions = Arc::new(SessionStore::open(storage).await);
        let client = CrmClient::from_config(&config, sessions.clone())?;

        Ok(Self {
            config,
            data_dir,
            sessions,
            client,
        })
    }

    pub fn exchanger(&self) -> Result<TokenExchanger> {
        Ok(TokenExchanger::from_config(
            &self.config,
            self.sessions.clone(),
        )?)
    }

    pub fn redirect_handler(&self) -> Result<RedirectHandler> {
        Ok(RedirectHandler::new(self.exchanger()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omniout_sdk::Session;
    use std::io::Write;

    fn write_config(dir: &Path) -> PathBuf {
        let path = dir.join("omniout.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[storage]\ndata_dir = {:?}\n",
            dir.join("data").display().to_string()
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn test_login_visible_across_contexts() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = write_config(dir.path());

        let first = AppContext::load(Some(config_path.as_path())).await.unwrap();
        assert!(!first.client.is_authenticated().await);
        first
            .sessions
            .save(Session::new("https://org.my.crm", "token", "58.0"))
            .await
            .unwrap();

        let second = AppContext::load(Some(config_path.as_path())).await.unwrap();
        assert_eq!(second.data_dir, dir.path().join("data"));
        assert!(second.client.is_authenticated().await);
    }
}
