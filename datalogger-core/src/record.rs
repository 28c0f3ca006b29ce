//! Decoded data logger records

use std::borrow::Cow;
use std::fmt;

use bytes::{Bytes, BytesMut};
use datalogger_types::Timestamp;

use crate::{
    error::{Error, Result},
    field::{Action, FieldType},
    tlv,
};

/// One reading as carried by a frame
///
/// Fields missing from a frame keep their empty value: no action, empty
/// serial/devtype/data and a zero timestamp.
///
/// # Examples
///
/// ```
/// use datalogger_core::Record;
///
/// let record = Record::new("SN42", "temp", vec![0xDE, 0xAD]);
/// assert_eq!(record.data_hex(), "dead");
/// assert!(!record.is_sentinel());
/// assert!(Record::sentinel().is_sentinel());
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// Action code, when the frame carries one
    pub action: Option<Action>,

    /// Device serial number
    pub serial: Bytes,

    /// Device type
    pub dev_type: Bytes,

    /// Opaque payload
    pub data: Bytes,

    /// Time the server logged the reading
    pub time: Timestamp,
}

impl Record {
    /// Create a record with a zero timestamp and no action
    pub fn new(
        serial: impl Into<Bytes>,
        dev_type: impl Into<Bytes>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            action: None,
            serial: serial.into(),
            dev_type: dev_type.into(),
            data: data.into(),
            time: Timestamp::EPOCH,
        }
    }

    /// Set the timestamp
    pub fn with_time(mut self, time: Timestamp) -> Self {
        self.time = time;
        self
    }

    /// Set the action
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// The end-of-results marker a server sends after the last match
    pub fn sentinel() -> Self {
        Self::default().with_action(Action::Reply)
    }

    /// Empty serial and a timestamp of exactly zero
    pub fn is_sentinel(&self) -> bool {
        self.serial.is_empty() && self.time.is_epoch()
    }

    /// Payload as lowercase hex
    pub fn data_hex(&self) -> String {
        hex::encode(&self.data)
    }

    /// Serial number as text
    pub fn serial_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.serial)
    }

    /// Device type as text
    pub fn dev_type_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.dev_type)
    }

    /// Timestamp as floating-point epoch seconds
    pub fn time_secs(&self) -> f64 {
        self.time.as_secs_f64()
    }

    /// Encode as a frame
    ///
    /// A record without an action is written as [`Action::Reply`], since
    /// every frame carries all five entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldTooLong`] if a value exceeds the 16-bit length prefix.
    pub fn encode(&self) -> Result<BytesMut> {
        tlv::check_len(FieldType::Serial, &self.serial)?;
        tlv::check_len(FieldType::DevType, &self.dev_type)?;
        tlv::check_len(FieldType::Data, &self.data)?;

        let mut buf = BytesMut::new();
        tlv::put_frame(
            &mut buf,
            self.action.unwrap_or(Action::Reply),
            &self.serial,
            &self.dev_type,
            &self.data,
            self.time,
        );

        Ok(buf)
    }
}

/// Collects the entries of one frame, rejecting duplicates
#[derive(Debug, Default)]
pub(crate) struct RecordBuilder {
    record: Record,
    seen: [bool; 5],
}

impl RecordBuilder {
    /// Store one entry's value; fixed lengths are already checked
    pub(crate) fn set(&mut self, field: FieldType, value: &[u8]) -> Result<()> {
        let seen = &mut self.seen[field.index()];
        if *seen {
            return Err(Error::DuplicateField(field));
        }
        *seen = true;

        match field {
            FieldType::Action => self.record.action = Some(tlv::read_action(value)?),
            FieldType::Serial => self.record.serial = Bytes::copy_from_slice(value),
            FieldType::DevType => self.record.dev_type = Bytes::copy_from_slice(value),
            FieldType::Data => self.record.data = Bytes::copy_from_slice(value),
            FieldType::Time => self.record.time = tlv::read_time(value),
        }

        Ok(())
    }

    pub(crate) fn finish(self) -> Record {
        self.record
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("action", &self.action)
            .field("serial", &self.serial_lossy())
            .field("dev_type", &self.dev_type_lossy())
            .field("data", &self.data_hex())
            .field("time", &self.time_secs())
            .finish()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Record[serial={}, devtype={}, data={}, time={}]",
            self.serial_lossy(),
            self.dev_type_lossy(),
            self.data_hex(),
            self.time
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sentinel() {
        assert!(Record::sentinel().is_sentinel());
        assert!(Record::default().is_sentinel());
    }

    #[test]
    fn test_not_sentinel_with_time() {
        let record = Record::default().with_time(Timestamp::new(0, 1));
        assert!(!record.is_sentinel());
    }

    #[test]
    fn test_not_sentinel_with_serial() {
        let record = Record::new("SN", "", Bytes::new());
        assert!(!record.is_sentinel());
    }

    #[test]
    fn test_data_hex() {
        let record = Record::new("SN", "t", vec![0x00, 0xAB, 0x7F]);
        assert_eq!(record.data_hex(), "00ab7f");
    }

    #[test]
    fn test_builder_rejects_duplicate() {
        let mut builder = RecordBuilder::default();
        builder.set(FieldType::Serial, b"A").unwrap();

        let result = builder.set(FieldType::Serial, b"B");
        assert!(matches!(result, Err(Error::DuplicateField(FieldType::Serial))));
    }

    #[test]
    fn test_builder_unknown_action() {
        let mut builder = RecordBuilder::default();
        let result = builder.set(FieldType::Action, &[0x00, 0x09]);
        assert!(matches!(result, Err(Error::UnknownAction(9))));
    }

    #[test]
    fn test_encode_defaults_to_reply() {
        let encoded = Record::new("SN", "t", Bytes::new()).encode().unwrap();

        // Marker, then action entry header and value
        assert_eq!(&encoded[..8], &[0x5A, 0x5A, 0x00, 0x01, 0x00, 0x02, 0x00, 0x00]);
    }

    #[test]
    fn test_display() {
        let record = Record::new("SN1", "temp", vec![0x01])
            .with_time(Timestamp::new(10, 500_000));
        assert_eq!(
            record.to_string(),
            "Record[serial=SN1, devtype=temp, data=01, time=10.500000]"
        );
    }
}
