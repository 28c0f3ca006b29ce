//! # datalogger-core
//!
//! Wire codec for the data logger protocol.
//!
//! This crate provides the low-level protocol primitives:
//! - Field entry (TLV) encoding and header inspection
//! - Request frame construction for store, query and observe
//! - Incremental stream decoding with sentinel detection
//! - Protocol constants

pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod field;
pub mod record;
pub mod tlv;

pub use decoder::{decode_frame, DecodeResult, Event, RecordReader, StreamDecoder, StreamEnd};
pub use encoder::{encode_observe, encode_query_after, encode_store, Request};
pub use error::{Error, Result};
pub use field::{Action, FieldType};
pub use record::Record;

pub use constants::DEFAULT_PORT;
pub use datalogger_types::{Timestamp, WILDCARD};
