//! Record timestamps
//!
//! The wire carries a timestamp as two big-endian `u32` values (seconds and
//! microseconds since the Unix epoch). Callers see it as a single `f64`.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// Seconds + microseconds since the Unix epoch
///
/// # Examples
///
/// ```
/// use datalogger_types::Timestamp;
///
/// let ts = Timestamp::from_secs_f64(1700000000.25).unwrap();
/// assert_eq!(ts.secs, 1700000000);
/// assert_eq!(ts.micros, 250000);
/// assert_eq!(ts.as_secs_f64(), 1700000000.25);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    /// Whole seconds since the epoch
    pub secs: u32,

    /// Fractional part in microseconds; values from the wire may exceed a second
    pub micros: u32,
}

impl Timestamp {
    /// The epoch itself; in a query it means "since the dawn of time"
    pub const EPOCH: Self = Self { secs: 0, micros: 0 };

    const MICROS_PER_SEC: u32 = 1_000_000;

    /// Create a timestamp from its wire components
    pub const fn new(secs: u32, micros: u32) -> Self {
        Self { secs, micros }
    }

    /// Split floating-point epoch seconds into wire components
    ///
    /// The microsecond part is truncated, not rounded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTimestamp`] for negative, non-finite, or
    /// values past the `u32` seconds range.
    pub fn from_secs_f64(value: f64) -> Result<Self> {
        if !value.is_finite() || value < 0.0 || value >= u32::MAX as f64 + 1.0 {
            return Err(Error::InvalidTimestamp(value));
        }

        let secs = value.floor();
        let micros = ((value - secs) * Self::MICROS_PER_SEC as f64) as u32;

        Ok(Self {
            secs: secs as u32,
            micros: micros.min(Self::MICROS_PER_SEC - 1),
        })
    }

    /// Combine the components into floating-point epoch seconds
    pub fn as_secs_f64(self) -> f64 {
        self.secs as f64 + self.micros as f64 / Self::MICROS_PER_SEC as f64
    }

    /// True for exactly `0.0`
    pub fn is_epoch(self) -> bool {
        self == Self::EPOCH
    }

    /// Current wall-clock time
    pub fn now() -> Result<Self> {
        Self::from_datetime(Utc::now())
    }

    /// Convert from a chrono UTC datetime
    pub fn from_datetime(dt: DateTime<Utc>) -> Result<Self> {
        let secs = u32::try_from(dt.timestamp())
            .map_err(|_| Error::InvalidTimestamp(dt.timestamp() as f64))?;

        Ok(Self {
            secs,
            micros: dt.timestamp_subsec_micros().min(Self::MICROS_PER_SEC - 1),
        })
    }

    /// Convert to a chrono UTC datetime
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let (secs, micros) = self.normalized();
        DateTime::from_timestamp(i64::try_from(secs).ok()?, micros * 1000)
    }

    /// Whole seconds and sub-second micros, with any micros overflow from the
    /// wire carried into the seconds
    fn normalized(self) -> (u64, u32) {
        let carry = u64::from(self.micros / Self::MICROS_PER_SEC);
        (u64::from(self.secs) + carry, self.micros % Self::MICROS_PER_SEC)
    }

    /// Translate a relative age into an absolute timestamp
    ///
    /// An age of zero maps to [`Timestamp::EPOCH`] (all records), any other
    /// age to `now - age`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use datalogger_types::Timestamp;
    ///
    /// assert_eq!(Timestamp::since_age(0, Utc::now()).unwrap(), Timestamp::EPOCH);
    /// ```
    pub fn since_age(age_secs: u64, now: DateTime<Utc>) -> Result<Self> {
        if age_secs == 0 {
            return Ok(Self::EPOCH);
        }

        let now = Self::from_datetime(now)?;
        let secs = (now.secs as u64)
            .checked_sub(age_secs)
            .ok_or_else(|| Error::InvalidTimestamp(now.as_secs_f64() - age_secs as f64))?;

        Ok(Self {
            secs: secs as u32,
            micros: now.micros,
        })
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (secs, micros) = self.normalized();
        write!(f, "{}.{:06}", secs, micros)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_secs_f64_splits_fraction() {
        let ts = Timestamp::from_secs_f64(12.5).unwrap();
        assert_eq!(ts, Timestamp::new(12, 500_000));
    }

    #[test]
    fn test_zero_is_epoch() {
        let ts = Timestamp::from_secs_f64(0.0).unwrap();
        assert!(ts.is_epoch());
        assert_eq!(ts.as_secs_f64(), 0.0);
    }

    #[test]
    fn test_from_secs_f64_rejects_out_of_range() {
        assert!(Timestamp::from_secs_f64(-1.0).is_err());
        assert!(Timestamp::from_secs_f64(f64::NAN).is_err());
        assert!(Timestamp::from_secs_f64(f64::INFINITY).is_err());
        assert!(Timestamp::from_secs_f64(5_000_000_000.0).is_err());
    }

    #[test]
    fn test_max_seconds_accepted() {
        let ts = Timestamp::from_secs_f64(u32::MAX as f64).unwrap();
        assert_eq!(ts.secs, u32::MAX);
    }

    #[test]
    fn test_since_age_zero() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(Timestamp::since_age(0, now).unwrap(), Timestamp::EPOCH);
    }

    #[test]
    fn test_since_age_subtracts_seconds() {
        let now = Utc.timestamp_opt(1_700_000_000, 123_456_000).unwrap();
        let ts = Timestamp::since_age(5, now).unwrap();

        assert_eq!(ts.secs, 1_699_999_995);
        assert_eq!(ts.micros, 123_456);
    }

    #[test]
    fn test_since_age_before_epoch() {
        let now = Utc.timestamp_opt(10, 0).unwrap();
        assert!(Timestamp::since_age(11, now).is_err());
    }

    #[test]
    fn test_datetime_conversion() {
        let ts = Timestamp::new(1_700_000_000, 42);
        let dt = ts.to_datetime().unwrap();

        assert_eq!(Timestamp::from_datetime(dt).unwrap(), ts);
    }

    #[test]
    fn test_display() {
        assert_eq!(Timestamp::new(7, 5).to_string(), "7.000005");
    }

    #[test]
    fn test_micros_past_one_second_carry() {
        let ts = Timestamp::new(10, 5_000_000);

        assert_eq!(ts.as_secs_f64(), 15.0);
        assert_eq!(ts.to_string(), "15.000000");
        assert_eq!(ts.to_datetime().unwrap().timestamp(), 15);

        let ts = Timestamp::new(u32::MAX, u32::MAX);
        assert_eq!(ts.to_string(), "4294971589.967295");
        let dt = ts.to_datetime().unwrap();
        assert_eq!(dt.timestamp(), 4_294_971_589);
        assert_eq!(dt.timestamp_subsec_micros(), 967_295);
    }
}
