//! Type-Length-Value primitives
//!
//! # Frame Structure
//!
//! ```text
//! ┌──────────┬──────────┬──────────┬─────────────┬─────┬─────────────────┐
//! │  Marker  │  Type    │  Length  │    Value    │ ... │ (5 entries)     │
//! │ 2 bytes  │ 2 bytes  │ 2 bytes  │ Length bytes│     │                 │
//! │ (0x5A5A) │ (BE u16) │ (BE u16) │             │     │                 │
//! └──────────┴──────────┴──────────┴─────────────┴─────┴─────────────────┘
//! ```
//!
//! All multi-byte values are big-endian.

use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, BytesMut};
use datalogger_types::Timestamp;

use crate::constants::{
    FIELD_HEADER_SIZE, MARKER_SIZE, MAX_FIELD_LEN, START_MARKER, TIME_VALUE_SIZE,
};
use crate::error::{Error, Result};
use crate::field::{Action, FieldType};

/// Type and length of one entry, read without consuming it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldHeader {
    /// Raw type code; may be outside [`FieldType`]
    pub raw_type: u16,

    /// Declared value length
    pub len: usize,
}

impl FieldHeader {
    /// Bytes the whole entry occupies
    pub fn entry_len(&self) -> usize {
        FIELD_HEADER_SIZE + self.len
    }
}

/// Read an entry header from the start of `buf`
///
/// Returns `None` while fewer than four bytes are available.
pub fn peek_header(buf: &[u8]) -> Option<FieldHeader> {
    if buf.len() < FIELD_HEADER_SIZE {
        return None;
    }

    Some(FieldHeader {
        raw_type: BigEndian::read_u16(&buf[0..2]),
        len: BigEndian::read_u16(&buf[2..4]) as usize,
    })
}

/// Read the start marker from the start of `buf`
pub fn peek_marker(buf: &[u8]) -> Option<u16> {
    (buf.len() >= MARKER_SIZE).then(|| BigEndian::read_u16(&buf[..MARKER_SIZE]))
}

/// Decode a time value (seconds, microseconds)
pub fn read_time(value: &[u8]) -> Timestamp {
    Timestamp::new(
        BigEndian::read_u32(&value[0..4]),
        BigEndian::read_u32(&value[4..8]),
    )
}

/// Decode an action value
pub fn read_action(value: &[u8]) -> Result<Action> {
    Action::try_from(BigEndian::read_u16(value))
}

/// Check that a variable-length value fits a 16-bit length prefix
pub fn check_len(field: FieldType, value: &[u8]) -> Result<()> {
    if value.len() > MAX_FIELD_LEN {
        return Err(Error::FieldTooLong {
            field,
            len: value.len(),
        });
    }
    Ok(())
}

/// Bytes a full frame with these variable values occupies
pub fn frame_len(serial: &[u8], dev_type: &[u8], data: &[u8]) -> usize {
    MARKER_SIZE
        + 5 * FIELD_HEADER_SIZE
        + 2
        + serial.len()
        + dev_type.len()
        + data.len()
        + TIME_VALUE_SIZE
}

/// Append one variable-length entry
///
/// The value length must already be checked with [`check_len`].
pub fn put_field(buf: &mut BytesMut, field: FieldType, value: &[u8]) {
    debug_assert!(value.len() <= MAX_FIELD_LEN);

    buf.put_u16(field.into());
    buf.put_u16(value.len() as u16);
    buf.put_slice(value);
}

/// Append an action entry
pub fn put_action(buf: &mut BytesMut, action: Action) {
    buf.put_u16(FieldType::Action.into());
    buf.put_u16(2);
    buf.put_u16(action.into());
}

/// Append a time entry
pub fn put_time(buf: &mut BytesMut, time: Timestamp) {
    buf.put_u16(FieldType::Time.into());
    buf.put_u16(TIME_VALUE_SIZE as u16);
    buf.put_u32(time.secs);
    buf.put_u32(time.micros);
}

/// Write a complete frame in canonical order: Action, Serial, DevType, Data, Time
pub fn put_frame(
    buf: &mut BytesMut,
    action: Action,
    serial: &[u8],
    dev_type: &[u8],
    data: &[u8],
    time: Timestamp,
) {
    buf.reserve(frame_len(serial, dev_type, data));

    buf.put_u16(START_MARKER);
    put_action(buf, action);
    put_field(buf, FieldType::Serial, serial);
    put_field(buf, FieldType::DevType, dev_type);
    put_field(buf, FieldType::Data, data);
    put_time(buf, time);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_put_field_layout() {
        let mut buf = BytesMut::new();
        put_field(&mut buf, FieldType::Serial, b"AB");

        assert_eq!(&buf[..], &[0x00, 0x02, 0x00, 0x02, b'A', b'B']);
    }

    #[test]
    fn test_put_time_layout() {
        let mut buf = BytesMut::new();
        put_time(&mut buf, Timestamp::new(1, 2));

        assert_eq!(
            &buf[..],
            &[0x00, 0x05, 0x00, 0x08, 0, 0, 0, 1, 0, 0, 0, 2]
        );
    }

    #[test]
    fn test_peek_header() {
        assert_eq!(peek_header(&[0x00, 0x04]), None);

        let header = peek_header(&[0x00, 0x04, 0x01, 0x00, 0xFF]).unwrap();
        assert_eq!(header.raw_type, 4);
        assert_eq!(header.len, 256);
        assert_eq!(header.entry_len(), 260);
    }

    #[test]
    fn test_peek_marker() {
        assert_eq!(peek_marker(&[0x5A]), None);
        assert_eq!(peek_marker(&[0x5A, 0x5A, 0x00]), Some(START_MARKER));
    }

    #[test]
    fn test_frame_len_matches_written() {
        let mut buf = BytesMut::new();
        put_frame(&mut buf, Action::Store, b"SN1", b"temp", &[1, 2, 3], Timestamp::EPOCH);

        assert_eq!(buf.len(), frame_len(b"SN1", b"temp", &[1, 2, 3]));
    }

    #[test]
    fn test_check_len() {
        assert!(check_len(FieldType::Data, &vec![0u8; MAX_FIELD_LEN]).is_ok());

        let result = check_len(FieldType::Data, &vec![0u8; MAX_FIELD_LEN + 1]);
        assert!(matches!(result, Err(Error::FieldTooLong { len, .. }) if len == MAX_FIELD_LEN + 1));
    }
}
