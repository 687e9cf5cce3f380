//! # OmniOut Common
//!
//! Shared pieces used by the OmniOut SDK and CLI:
//! - CRM connection defaults (login host, API version, storage keys)
//! - Unified logging initialization

pub mod constants;
pub mod logging;

pub use constants::*;
