//! Session model and its durable store

pub mod store;
pub mod types;

pub use store::SessionStore;
pub use types::Session;
