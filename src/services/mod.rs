//! Services - refresh cycle orchestration
//!
//! This module contains the core pipeline logic:
//! - `refresh` - fetch-parse cycles, interval and manual triggers, typed
//!   per-cycle outcomes for the presentation layer

pub mod refresh;

// Re-export commonly used types
pub use refresh::{RefreshHandle, RefreshOutcome, Refresher};
