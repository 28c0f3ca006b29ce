//! Field type tags and record actions

use std::fmt;

use crate::constants::{actions, field_types, ACTION_VALUE_SIZE, TIME_VALUE_SIZE};
use crate::error::{Error, Result};

/// Type tag of a field entry
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum FieldType {
    Action = field_types::PRM_ACTION,
    Serial = field_types::PRM_SERNUM,
    DevType = field_types::PRM_DEVTYPE,
    Data = field_types::PRM_DATA,
    Time = field_types::PRM_TIME,
}

impl FieldType {
    /// Value size this type always carries, if fixed
    pub fn fixed_len(self) -> Option<usize> {
        match self {
            Self::Action => Some(ACTION_VALUE_SIZE),
            Self::Time => Some(TIME_VALUE_SIZE),
            Self::Serial | Self::DevType | Self::Data => None,
        }
    }

    /// Get field name
    pub fn name(self) -> &'static str {
        match self {
            Self::Action => "PRM_ACTION",
            Self::Serial => "PRM_SERNUM",
            Self::DevType => "PRM_DEVTYPE",
            Self::Data => "PRM_DATA",
            Self::Time => "PRM_TIME",
        }
    }

    /// Position of this type in a per-frame presence table
    pub(crate) fn index(self) -> usize {
        self as usize - 1
    }
}

impl From<FieldType> for u16 {
    fn from(field: FieldType) -> u16 {
        field as u16
    }
}

impl TryFrom<u16> for FieldType {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            field_types::PRM_ACTION => Ok(Self::Action),
            field_types::PRM_SERNUM => Ok(Self::Serial),
            field_types::PRM_DEVTYPE => Ok(Self::DevType),
            field_types::PRM_DATA => Ok(Self::Data),
            field_types::PRM_TIME => Ok(Self::Time),
            _ => Err(Error::UnknownFieldType(value)),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a record asks the server to do
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Action {
    /// Record returned by the server
    Reply = actions::REC_ACT_REPLY,

    /// Persist a reading
    Store = actions::REC_ACT_STORE,

    /// Fetch stored readings newer than a timestamp
    GetAfter = actions::REC_ACT_GET_AFTER,

    /// Subscribe to matching readings as they arrive
    Observe = actions::REC_ACT_OBSERVE,
}

impl Action {
    /// Check if this is a client request
    pub fn is_request(self) -> bool {
        !matches!(self, Self::Reply)
    }

    /// Check if the server answers with a result stream ending in a sentinel
    pub fn expects_results(self) -> bool {
        matches!(self, Self::GetAfter | Self::Observe)
    }

    /// Get action name
    pub fn name(self) -> &'static str {
        match self {
            Self::Reply => "REC_ACT_REPLY",
            Self::Store => "REC_ACT_STORE",
            Self::GetAfter => "REC_ACT_GET_AFTER",
            Self::Observe => "REC_ACT_OBSERVE",
        }
    }
}

impl From<Action> for u16 {
    fn from(action: Action) -> u16 {
        action as u16
    }
}

impl TryFrom<u16> for Action {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            actions::REC_ACT_REPLY => Ok(Self::Reply),
            actions::REC_ACT_STORE => Ok(Self::Store),
            actions::REC_ACT_GET_AFTER => Ok(Self::GetAfter),
            actions::REC_ACT_OBSERVE => Ok(Self::Observe),
            _ => Err(Error::UnknownAction(value)),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), *self as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_conversion() {
        assert_eq!(u16::from(FieldType::Data), 4);
        assert_eq!(FieldType::try_from(5).unwrap(), FieldType::Time);
    }

    #[test]
    fn test_unknown_field_type() {
        let result = FieldType::try_from(99);
        assert!(matches!(result, Err(Error::UnknownFieldType(99))));
    }

    #[test]
    fn test_fixed_len() {
        assert_eq!(FieldType::Action.fixed_len(), Some(2));
        assert_eq!(FieldType::Time.fixed_len(), Some(8));
        assert_eq!(FieldType::Serial.fixed_len(), None);
    }

    #[test]
    fn test_action_conversion() {
        assert_eq!(u16::from(Action::GetAfter), 2);
        assert_eq!(Action::try_from(3).unwrap(), Action::Observe);
        assert_eq!(Action::try_from(0).unwrap(), Action::Reply);
        assert!(matches!(Action::try_from(0xFFFF), Err(Error::UnknownAction(0xFFFF))));
    }

    #[test]
    fn test_action_predicates() {
        assert!(Action::Store.is_request());
        assert!(!Action::Reply.is_request());
        assert!(Action::Observe.expects_results());
        assert!(!Action::Store.expects_results());
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::Store.to_string(), "REC_ACT_STORE(1)");
    }
}
