//! Browser side of the redirect login

pub mod browser;
pub mod callback_server;

pub use browser::BrowserNavigator;
pub use callback_server::{CallbackServer, PendingRedirect};
