//! Protocol constants

/// Marker opening every frame
pub const START_MARKER: u16 = 0x5A5A;

/// Size of the start marker in bytes
pub const MARKER_SIZE: usize = 2;

/// Field entries per frame, in both directions
pub const FIELDS_PER_FRAME: usize = 5;

/// Type + length header of one field entry
pub const FIELD_HEADER_SIZE: usize = 4;

/// Fixed value size of an action entry
pub const ACTION_VALUE_SIZE: usize = 2;

/// Fixed value size of a time entry (seconds + microseconds)
pub const TIME_VALUE_SIZE: usize = 8;

/// The decoder only attempts a frame once more than this many bytes are buffered
pub const MIN_DECODE_BYTES: usize = 10;

/// Largest value a field entry can carry
pub const MAX_FIELD_LEN: usize = u16::MAX as usize;

/// Default data logger server
pub const DEFAULT_SERVER: &str = "localhost";

/// Default data logger TCP port
pub const DEFAULT_PORT: u16 = 12345;

/// Default connection timeout (seconds)
pub const DEFAULT_TIMEOUT: u64 = 5;

/// Default read timeout (seconds)
pub const DEFAULT_READ_TIMEOUT: u64 = 5;

/// Field type codes
pub mod field_types {
    pub const PRM_ACTION: u16 = 0x0001;
    pub const PRM_SERNUM: u16 = 0x0002;
    pub const PRM_DEVTYPE: u16 = 0x0003;
    pub const PRM_DATA: u16 = 0x0004;
    pub const PRM_TIME: u16 = 0x0005;
}

/// Record action codes
pub mod actions {
    /// Sent by the server on records it returns
    pub const REC_ACT_REPLY: u16 = 0x0000;
    pub const REC_ACT_STORE: u16 = 0x0001;
    pub const REC_ACT_GET_AFTER: u16 = 0x0002;
    pub const REC_ACT_OBSERVE: u16 = 0x0003;
}
