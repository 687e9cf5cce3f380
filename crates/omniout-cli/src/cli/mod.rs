//! Command-line interface

pub mod args;
pub mod commands;
pub mod handlers;

pub use args::Args;
pub use commands::*;
