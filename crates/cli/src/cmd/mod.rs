//! Subcommand implementations

pub mod backup;
pub mod config;
pub mod status;
