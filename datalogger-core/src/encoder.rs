//! Request frame construction
//!
//! Every request frame carries all five entries in the same order:
//!
//! | kind       | Data        | Time           |
//! |------------|-------------|----------------|
//! | Store      | raw payload | `(0, 0)`       |
//! | QueryAfter | empty       | lower bound    |
//! | Observe    | empty       | `(0, 0)`       |
//!
//! The server stamps stored records with its own arrival time, so a store
//! request's time entry is always zero.

use bytes::{Bytes, BytesMut};
use datalogger_types::{Timestamp, WILDCARD};
use tracing::trace;

use crate::{
    error::{Error, Result},
    field::{Action, FieldType},
    tlv,
};

/// Validated request ready to be encoded
///
/// # Examples
///
/// ```
/// use datalogger_core::{Action, Request};
///
/// let request = Request::store_hex("SN42", "temp", "0a0b").unwrap();
/// assert_eq!(request.action(), Action::Store);
///
/// let frame = request.encode();
/// assert_eq!(frame.len(), request.size());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    action: Action,
    serial: Bytes,
    dev_type: Bytes,
    data: Bytes,
    time: Timestamp,
}

impl Request {
    /// Store a raw payload
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidWildcard`] if serial or devtype is `*`.
    pub fn store(
        serial: impl Into<Bytes>,
        dev_type: impl Into<Bytes>,
        payload: impl Into<Bytes>,
    ) -> Result<Self> {
        let payload = payload.into();
        tlv::check_len(FieldType::Data, &payload)?;

        Ok(Self {
            action: Action::Store,
            serial: identifier(FieldType::Serial, serial.into(), false)?,
            dev_type: identifier(FieldType::DevType, dev_type.into(), false)?,
            data: payload,
            time: Timestamp::EPOCH,
        })
    }

    /// Store a payload given as hex text
    ///
    /// # Errors
    ///
    /// Fails with [`Error::MalformedPayload`] on invalid or odd-length hex.
    pub fn store_hex(
        serial: impl Into<Bytes>,
        dev_type: impl Into<Bytes>,
        hex_payload: &str,
    ) -> Result<Self> {
        let payload = hex::decode(hex_payload)?;
        Self::store(serial, dev_type, payload)
    }

    /// Fetch records newer than `since`
    ///
    /// [`Timestamp::EPOCH`] selects every stored record. Wildcards allowed.
    pub fn query_after(
        serial: impl Into<Bytes>,
        dev_type: impl Into<Bytes>,
        since: Timestamp,
    ) -> Result<Self> {
        Ok(Self {
            action: Action::GetAfter,
            serial: identifier(FieldType::Serial, serial.into(), true)?,
            dev_type: identifier(FieldType::DevType, dev_type.into(), true)?,
            data: Bytes::new(),
            time: since,
        })
    }

    /// Subscribe to matching records. Wildcards allowed.
    pub fn observe(serial: impl Into<Bytes>, dev_type: impl Into<Bytes>) -> Result<Self> {
        Ok(Self {
            action: Action::Observe,
            serial: identifier(FieldType::Serial, serial.into(), true)?,
            dev_type: identifier(FieldType::DevType, dev_type.into(), true)?,
            data: Bytes::new(),
            time: Timestamp::EPOCH,
        })
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn serial(&self) -> &Bytes {
        &self.serial
    }

    pub fn dev_type(&self) -> &Bytes {
        &self.dev_type
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn time(&self) -> Timestamp {
        self.time
    }

    /// Encoded frame size in bytes
    pub fn size(&self) -> usize {
        tlv::frame_len(&self.serial, &self.dev_type, &self.data)
    }

    /// Encode to a frame
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.size());
        self.encode_into(&mut buf);
        buf
    }

    /// Append the frame to an existing buffer
    pub fn encode_into(&self, buf: &mut BytesMut) {
        tlv::put_frame(
            buf,
            self.action,
            &self.serial,
            &self.dev_type,
            &self.data,
            self.time,
        );

        trace!(
            action = %self.action,
            serial = %String::from_utf8_lossy(&self.serial),
            data_len = self.data.len(),
            frame_len = self.size(),
            "Encoded request"
        );
    }
}

fn identifier(field: FieldType, value: Bytes, allow_wildcard: bool) -> Result<Bytes> {
    if value.is_empty() {
        return Err(Error::EmptyField { field });
    }
    if !allow_wildcard && value.as_ref() == WILDCARD.as_bytes() {
        return Err(Error::InvalidWildcard { field });
    }
    tlv::check_len(field, &value)?;
    Ok(value)
}

/// Build a store frame from a hex payload
pub fn encode_store(serial: &str, dev_type: &str, hex_data: &str) -> Result<BytesMut> {
    Ok(Request::store_hex(copy(serial), copy(dev_type), hex_data)?.encode())
}

/// Build a query frame for records newer than `since_epoch_seconds`
///
/// Converting an age to an absolute time is up to the caller; see
/// [`Timestamp::since_age`].
pub fn encode_query_after(
    serial: &str,
    dev_type: &str,
    since_epoch_seconds: f64,
) -> Result<BytesMut> {
    let since = Timestamp::from_secs_f64(since_epoch_seconds)
        .map_err(|_| Error::InvalidTimestamp(since_epoch_seconds))?;

    Ok(Request::query_after(copy(serial), copy(dev_type), since)?.encode())
}

/// Build an observe frame
pub fn encode_observe(serial: &str, dev_type: &str) -> Result<BytesMut> {
    Ok(Request::observe(copy(serial), copy(dev_type))?.encode())
}

fn copy(s: &str) -> Bytes {
    Bytes::copy_from_slice(s.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_store_frame_layout() {
        let frame = encode_store("AB", "t", "ff").unwrap();

        #[rustfmt::skip]
        let expected: &[u8] = &[
            0x5A, 0x5A,
            0x00, 0x01, 0x00, 0x02, 0x00, 0x01,
            0x00, 0x02, 0x00, 0x02, b'A', b'B',
            0x00, 0x03, 0x00, 0x01, b't',
            0x00, 0x04, 0x00, 0x01, 0xFF,
            0x00, 0x05, 0x00, 0x08, 0, 0, 0, 0, 0, 0, 0, 0,
        ];
        assert_eq!(&frame[..], expected);
    }

    #[test]
    fn test_store_empty_payload() {
        let request = Request::store_hex("SN", "t", "").unwrap();
        assert!(request.data().is_empty());
        assert_eq!(request.encode().len(), request.size());
    }

    #[test]
    fn test_store_rejects_wildcard() {
        let result = encode_store("*", "dev", "ab");
        assert!(matches!(
            result,
            Err(Error::InvalidWildcard { field: FieldType::Serial })
        ));

        let result = encode_store("SN", "*", "ab");
        assert!(matches!(
            result,
            Err(Error::InvalidWildcard { field: FieldType::DevType })
        ));
    }

    #[test]
    fn test_store_malformed_hex() {
        assert!(matches!(
            encode_store("SN", "t", "abc"),
            Err(Error::MalformedPayload(_))
        ));
        assert!(matches!(
            encode_store("SN", "t", "zz"),
            Err(Error::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_store_uppercase_hex() {
        let request = Request::store_hex("SN", "t", "DEADbeef").unwrap();
        assert_eq!(request.data().as_ref(), &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_empty_identifier() {
        assert!(matches!(
            encode_observe("", "t"),
            Err(Error::EmptyField { field: FieldType::Serial })
        ));
    }

    #[test]
    fn test_identifier_too_long() {
        let serial = Bytes::from(vec![b'x'; u16::MAX as usize + 1]);
        let result = Request::observe(serial, "t");
        assert!(matches!(result, Err(Error::FieldTooLong { field: FieldType::Serial, .. })));
    }

    #[test]
    fn test_query_zero_age_is_epoch() {
        let frame = encode_query_after("*", "*", 0.0).unwrap();
        let time_value = &frame[frame.len() - 8..];

        assert_eq!(time_value, &[0u8; 8]);
    }

    #[test]
    fn test_query_splits_seconds() {
        let frame = encode_query_after("SN", "t", 1_700_000_000.5).unwrap();
        let time_value = &frame[frame.len() - 8..];

        assert_eq!(&time_value[..4], &1_700_000_000u32.to_be_bytes());
        assert_eq!(&time_value[4..], &500_000u32.to_be_bytes());
    }

    #[test]
    fn test_query_invalid_time() {
        assert!(matches!(
            encode_query_after("SN", "t", -3.0),
            Err(Error::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_observe_shape() {
        let request = Request::observe("*", "temp").unwrap();
        assert_eq!(request.action(), Action::Observe);
        assert!(request.data().is_empty());
        assert!(request.time().is_epoch());

        let frame = request.encode();
        assert_eq!(&frame[4..8], &[0x00, 0x02, 0x00, 0x03]);
    }
}
