//! Process-backed implementations of the backup collaborators
//!
//! This crate provides:
//! - `Mongodump`: full and oplog dumps
//! - `Bsondump`: timestamp extraction from captured oplog files
//! - `MongoShell`: latest oplog position query
//! - `S3Sync`: chain folder upload through the AWS CLI

pub mod bsondump;
pub mod connection;
pub mod mongodump;
mod process;
pub mod s3;
pub mod shell;

// Re-exports
pub use bsondump::Bsondump;
pub use connection::MongoConnection;
pub use mongodump::Mongodump;
pub use s3::{S3Sync, S3Target};
pub use shell::MongoShell;
