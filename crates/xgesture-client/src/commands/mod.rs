//! Subcommand implementations.

pub mod codec;
pub mod config;
