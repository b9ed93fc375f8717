//! Display models for CLI output
//!
//! Converts analysis results and cache state into table rows, pretty text
//! and JSON.

pub mod display;

pub use display::{CacheEntryRow, CacheKeysView, CacheStatusView, SectionRow};
