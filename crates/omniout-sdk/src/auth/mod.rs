//! OAuth 2.0 login for the CRM platform
//!
//! This module provides:
//! - Authorization code flow with anti-forgery state (and optional PKCE)
//! - Legacy username/password grant
//! - Redirect handling that ties the two halves of the code flow together

pub mod exchange;
pub mod pkce;
pub mod redirect;

pub use exchange::TokenExchanger;
pub use pkce::{generate_pkce_challenge, generate_pkce_verifier, generate_state};
pub use redirect::{FlowState, Navigator, RedirectHandler, RedirectParams};
