//! Type definitions for the data logger client

pub mod error;
pub mod line;
pub mod timestamp;

pub use error::{Error, Result};
pub use line::{ObserveLine, QueryLine, StoreLine, StressLine};
pub use timestamp::Timestamp;

/// Token matching any serial number or device type in queries
pub const WILDCARD: &str = "*";
