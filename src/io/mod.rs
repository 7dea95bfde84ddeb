//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `station` - HTTP client for the station's series endpoint

pub mod station;

// Re-export commonly used types
pub use station::{FetchError, StationClient, StationConfig, DEFAULT_TIMEOUT_SECS};
