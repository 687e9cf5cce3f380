//! Command handlers for the OmniOut CLI

pub mod auth;
pub mod config;
pub mod records;
