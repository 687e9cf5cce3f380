//! # OmniOut CLI
//!
//! Command-line front end for the OmniOut CRM client:
//! - browser and password login against the CRM
//! - listing accounts, contacts, leads and opportunities
//! - creating accounts and leads, updating contacts
//!
//! ## Architecture
//!
//! - Clap-based argument parsing with derive macros
//! - Handler-based command processing over a shared [`context::AppContext`]
//! - All CRM work delegated to `omniout-sdk`

pub mod auth;
pub mod cli;
pub mod context;
pub mod error;
pub mod output;

pub use cli::*;
pub use error::*;
