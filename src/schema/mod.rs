//! Log-store wire schema
//!
//! This module defines the nested JSON shape the log store writes for each
//! day, plus the adapter that parses batches (JSON array, request envelope, or
//! NDJSON) and reports malformed entries.

mod raw_log;
mod adapter;

pub use raw_log::*;
pub use adapter::*;
