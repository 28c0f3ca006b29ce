//! Error types for datalogger-core

use crate::field::FieldType;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Codec errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Payload text is not valid hexadecimal
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] hex::FromHexError),

    /// Wildcard used where a concrete value is required
    #[error("{field} can't be a wildcard in this request")]
    InvalidWildcard {
        field: FieldType,
    },

    /// Required identifier is empty
    #[error("{field} must not be empty")]
    EmptyField {
        field: FieldType,
    },

    /// Value does not fit a 16-bit length prefix
    #[error("{field} too long: {len} bytes (max: {max} bytes)", max = crate::constants::MAX_FIELD_LEN)]
    FieldTooLong {
        field: FieldType,
        len: usize,
    },

    /// Timestamp can't be represented on the wire
    #[error("Timestamp out of range: {0}")]
    InvalidTimestamp(f64),

    /// Frame does not start with the start marker
    #[error("Start marker mismatch: expected 0x5A5A, found 0x{found:04X}")]
    StartMarkerMismatch {
        found: u16,
    },

    /// Stream ended in the middle of a frame
    #[error("Stream closed with {pending} bytes of an incomplete frame")]
    TruncatedFrame {
        pending: usize,
    },

    /// Field entry with a type code outside the known set
    #[error("Unknown field type: {0}")]
    UnknownFieldType(u16),

    /// Fixed-size field with the wrong length
    #[error("{field} length mismatch: expected {expected} bytes, got {actual} bytes")]
    FieldLengthMismatch {
        field: FieldType,
        expected: usize,
        actual: usize,
    },

    /// Same field type twice in one frame
    #[error("{0} defined twice in one frame")]
    DuplicateField(FieldType),

    /// Action value outside the known set
    #[error("Unknown action code: {0}")]
    UnknownAction(u16),

    /// Decoder already hit a fatal error
    #[error("Decoder stopped after a previous framing error")]
    DecoderPoisoned,

    /// I/O error from a blocking byte source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Caller input rejected before anything was sent
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedPayload(_)
                | Self::InvalidWildcard { .. }
                | Self::EmptyField { .. }
                | Self::FieldTooLong { .. }
                | Self::InvalidTimestamp(_)
        )
    }

    /// Peer sent bytes that can't be aligned to frames any more
    ///
    /// The session must be aborted; the buffer can't be trusted.
    pub fn is_framing_error(&self) -> bool {
        matches!(
            self,
            Self::StartMarkerMismatch { .. }
                | Self::TruncatedFrame { .. }
                | Self::UnknownFieldType(_)
                | Self::FieldLengthMismatch { .. }
                | Self::DuplicateField(_)
                | Self::UnknownAction(_)
                | Self::DecoderPoisoned
        )
    }
}
