//! Command-line record selectors
//!
//! Each action takes one comma-separated argument:
//!
//! ```text
//! store    SERIAL,DEVTYPE,DATA
//! query    SERIAL,DEVTYPE,AGE
//! observe  SERIAL,DEVTYPE
//! stress   SERIAL,DEVTYPE
//! ```

use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::timestamp::Timestamp;
use crate::WILDCARD;

fn split_fields<const N: usize>(s: &str, usage: &str) -> Result<[String; N]> {
    let parts: Vec<&str> = s.split(',').collect();

    if parts.len() != N {
        return Err(Error::Parse(usage.to_string()));
    }

    Ok(std::array::from_fn(|i| parts[i].to_string()))
}

fn reject_wildcards(serial: &str, dev_type: &str) -> Result<()> {
    if serial == WILDCARD || dev_type == WILDCARD {
        return Err(Error::Validation(
            "SERIAL and DEVTYPE can't be wildcards".into(),
        ));
    }
    Ok(())
}

/// Record to store: `SERIAL,DEVTYPE,DATA` with DATA in hex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLine {
    pub serial: String,
    pub dev_type: String,
    pub data: String,
}

impl FromStr for StoreLine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let [serial, dev_type, data] =
            split_fields::<3>(s, "STORE must be of format SERIAL,DEVTYPE,DATA")?;
        reject_wildcards(&serial, &dev_type)?;

        Ok(Self { serial, dev_type, data })
    }
}

/// Query selector: `SERIAL,DEVTYPE,AGE`
///
/// AGE is in seconds; `0` selects every stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryLine {
    pub serial: String,
    pub dev_type: String,
    pub age_secs: u64,
}

impl QueryLine {
    /// Absolute lower bound for matching records
    pub fn since(&self, now: DateTime<Utc>) -> Result<Timestamp> {
        Timestamp::since_age(self.age_secs, now)
    }
}

impl FromStr for QueryLine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let [serial, dev_type, age] = split_fields::<3>(
            s,
            "QUERY must be of format SERIAL,DEVTYPE,AGE (SERIAL and DEVTYPE may be '*')",
        )?;

        let age_secs = age
            .trim()
            .parse::<u64>()
            .map_err(|_| Error::Parse(format!("AGE must be a non-negative integer, got '{}'", age)))?;

        Ok(Self { serial, dev_type, age_secs })
    }
}

/// Observe selector: `SERIAL,DEVTYPE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserveLine {
    pub serial: String,
    pub dev_type: String,
}

impl FromStr for ObserveLine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let [serial, dev_type] = split_fields::<2>(
            s,
            "OBSERVE must be of format SERIAL,DEVTYPE (SERIAL and DEVTYPE may be '*')",
        )?;

        Ok(Self { serial, dev_type })
    }
}

/// Load generator target: `SERIAL,DEVTYPE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StressLine {
    pub serial: String,
    pub dev_type: String,
}

impl FromStr for StressLine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let [serial, dev_type] =
            split_fields::<2>(s, "STRESS must be of format SERIAL,DEVTYPE")?;
        reject_wildcards(&serial, &dev_type)?;

        Ok(Self { serial, dev_type })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_store_line() {
        let line: StoreLine = "ABC123,temp,deadbeef".parse().unwrap();
        assert_eq!(line.serial, "ABC123");
        assert_eq!(line.dev_type, "temp");
        assert_eq!(line.data, "deadbeef");
    }

    #[test]
    fn test_store_line_rejects_wildcard() {
        let result = "*,temp,00".parse::<StoreLine>();
        assert!(matches!(result, Err(Error::Validation(_))));

        let result = "ABC,*,00".parse::<StoreLine>();
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_store_line_wrong_arity() {
        assert!(matches!("ABC,temp".parse::<StoreLine>(), Err(Error::Parse(_))));
        assert!(matches!("a,b,c,d".parse::<StoreLine>(), Err(Error::Parse(_))));
    }

    #[test]
    fn test_query_line_allows_wildcards() {
        let line: QueryLine = "*,*,0".parse().unwrap();
        assert_eq!(line.serial, "*");
        assert_eq!(line.age_secs, 0);
    }

    #[test]
    fn test_query_line_age_must_be_integer() {
        assert!(matches!("a,b,soon".parse::<QueryLine>(), Err(Error::Parse(_))));
        assert!(matches!("a,b,-5".parse::<QueryLine>(), Err(Error::Parse(_))));
    }

    #[test]
    fn test_query_line_since() {
        let now = Utc.timestamp_opt(1000, 0).unwrap();
        let line: QueryLine = "a,b,60".parse().unwrap();

        assert_eq!(line.since(now).unwrap(), Timestamp::new(940, 0));
    }

    #[test]
    fn test_observe_line() {
        let line: ObserveLine = "*,humidity".parse().unwrap();
        assert_eq!(line.dev_type, "humidity");
        assert!("only-one".parse::<ObserveLine>().is_err());
    }

    #[test]
    fn test_stress_line_rejects_wildcard() {
        assert!("ABC,temp".parse::<StressLine>().is_ok());
        assert!("*,temp".parse::<StressLine>().is_err());
    }
}
