//! Library side of the `oplog-backup` binary
//!
//! Configuration, logging setup and presentation helpers live here so the
//! command modules stay thin.

pub mod config;
pub mod logging;
pub mod util;
