//! Random nonce and PKCE helpers

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Generate a random state parameter for CSRF protection
pub fn generate_state() -> String {
    let state_bytes: [u8; 32] = rand::thread_rng().gen();
    let state = URL_SAFE_NO_PAD.encode(state_bytes);

    debug!("State parameter generated: {} chars", state.len());
    state
}

/// Generate a cryptographically secure 32-byte PKCE code verifier
pub fn generate_pkce_verifier() -> String {
    let verifier_bytes: [u8; 32] = rand::thread_rng().gen();
    let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

    debug!("PKCE verifier generated: {} chars", verifier.len());
    verifier
}

/// S256 code challenge for `verifier`
pub fn generate_pkce_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}
