//! # datalogger
//!
//! Rust client for the data logger TLV stream protocol.
//!
//! ## Features
//!
//! - Store readings, query stored ones by device and age, observe live ones
//! - Async/await API using Tokio
//! - Incremental decoding that tolerates arbitrarily split reads
//! - Store load generator with throughput reporting
//!
//! ## Quick Start
//!
//! ```no_run
//! use datalogger::Client;
//!
//! #[tokio::main]
//! async fn main() -> datalogger::Result<()> {
//!     // Connect to server
//!     let mut client = Client::new("localhost", 12345);
//!     client.connect().await?;
//!     
//!     // Everything any device stored in the last minute
//!     let mut records = client.query_age("*", "*", 60).await?;
//!     while let Some(record) = records.next().await? {
//!         println!("{}", record);
//!     }
//!     
//!     // Disconnect
//!     client.disconnect().await?;
//!     
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod stream;
pub mod stress;

// Re-exports
pub use client::Client;
pub use error::{Error, Result};
pub use stream::RecordStream;
pub use stress::{Throughput, ThroughputMeter};

// Re-export types
pub use datalogger_core::{constants, Action, Record, Request, StreamEnd, Timestamp, DEFAULT_PORT};
pub use datalogger_types::{ObserveLine, QueryLine, StoreLine, StressLine};
