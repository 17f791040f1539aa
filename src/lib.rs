//! semrun core library.
//!
//! This crate exposes programmatic APIs for orchestrating the Semgrep
//! static-analysis engine: locating a working executable, installing it on
//! demand with verified retries, invoking it with a hard timeout, and
//! parsing its JSON output into a stable `{success, matches, errors, stats}`
//! result.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `error`: Failure taxonomy rendered into result error lists.
//! - `locate`: Engine discovery across candidate directories.
//! - `install`: pip installation with a process-wide gate and backoff.
//! - `invoke`: Subprocess invocation behind a swappable `ProcessRunner`.
//! - `parse`: Defensive JSON-to-`ScanResult` conversion.
//! - `runner`: Facade composing the above into one `run` call.
//! - `rules`: Rule file enumeration for humans; rules stay opaque.
//! - `models`: Data models for the consumer-facing result shape.
//! - `output`: Human/JSON printers for scan/rules/doctor.
//! - `utils`: Supporting console helpers.
//!
//! The engine performs all analysis; nothing in this crate parses source
//! code or evaluates rules.
pub mod cli;
pub mod config;
pub mod error;
pub mod install;
pub mod invoke;
pub mod locate;
pub mod models;
pub mod output;
pub mod parse;
pub mod rules;
pub mod runner;
pub mod utils;
