//! vault-sync - keep a notes vault in sync through the git CLI
//!
//! The library builds git command lines for a vault, runs them, and
//! classifies each outcome into a fixed set of user-facing statuses.

pub mod config;
pub mod git;
pub mod logging;
pub mod reporting;
