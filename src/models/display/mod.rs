//! Display model implementations for table and JSON output

mod analysis;
mod cache;
mod common;

pub use analysis::SectionRow;
pub use cache::{CacheEntryRow, CacheKeysView, CacheStatusView};
