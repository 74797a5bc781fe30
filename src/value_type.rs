//! Value types: the encoding tag in front of every value payload.

use std::fmt;

use crate::event::EventType;
use crate::{Error, Result};

pub(crate) const BYTE_CODE: u8 = 0xF0;
pub(crate) const SHORT_CODE: u8 = 0xF1;
pub(crate) const USHORT_CODE: u8 = 0xF2;
pub(crate) const INT_CODE: u8 = 0xF3;
pub(crate) const LONG_CODE: u8 = 0xF4;
pub(crate) const FLOAT_CODE: u8 = 0xF5;
pub(crate) const DOUBLE_CODE: u8 = 0xF6;
pub(crate) const BOOL_CODE: u8 = 0xF7;
pub(crate) const STRING_CODE: u8 = 0xF8;
pub(crate) const ARRAY_CODE: u8 = 0xFF;

/// Closed set of value encodings.
///
/// `SmallNum` carries its payload (0..=239) in the type byte itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    SmallNum(u8),
    Byte,
    Short,
    UShort,
    Int,
    Long,
    Float,
    Double,
    Bool,
    String,
    Array,
}

impl ValueType {
    /// Decodes a type byte.
    pub fn from_code(code: u8) -> Result<Self> {
        Ok(match code {
            0..=0xEF => Self::SmallNum(code),
            BYTE_CODE => Self::Byte,
            SHORT_CODE => Self::Short,
            USHORT_CODE => Self::UShort,
            INT_CODE => Self::Int,
            LONG_CODE => Self::Long,
            FLOAT_CODE => Self::Float,
            DOUBLE_CODE => Self::Double,
            BOOL_CODE => Self::Bool,
            STRING_CODE => Self::String,
            ARRAY_CODE => Self::Array,
            other => return Err(Error::InvalidValueType(other)),
        })
    }

    pub fn code(self) -> u8 {
        match self {
            Self::SmallNum(n) => n,
            Self::Byte => BYTE_CODE,
            Self::Short => SHORT_CODE,
            Self::UShort => USHORT_CODE,
            Self::Int => INT_CODE,
            Self::Long => LONG_CODE,
            Self::Float => FLOAT_CODE,
            Self::Double => DOUBLE_CODE,
            Self::Bool => BOOL_CODE,
            Self::String => STRING_CODE,
            Self::Array => ARRAY_CODE,
        }
    }

    /// Payload width in bytes; `None` for variable-length types.
    pub fn width(self) -> Option<usize> {
        match self {
            Self::SmallNum(_) => Some(0),
            Self::Byte | Self::Bool => Some(1),
            Self::Short | Self::UShort => Some(2),
            Self::Int | Self::Float => Some(4),
            Self::Long | Self::Double => Some(8),
            Self::String | Self::Array => None,
        }
    }

    /// Fixed-width types are the only legal array element types.
    pub fn is_array_element(self) -> bool {
        !matches!(self, Self::SmallNum(_) | Self::String | Self::Array)
    }

    /// Reader event reported for a value of this type.
    pub fn event_type(self) -> EventType {
        match self {
            Self::SmallNum(_) | Self::Short | Self::UShort | Self::Int => EventType::ValueInt,
            Self::Byte => EventType::ValueByte,
            Self::Long => EventType::ValueLong,
            Self::Float => EventType::ValueFloat,
            Self::Double => EventType::ValueDouble,
            Self::Bool => EventType::ValueBool,
            Self::String | Self::Array => EventType::ValueString,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SmallNum(_) => "SmallNum",
            Self::Byte => "Byte",
            Self::Short => "Short",
            Self::UShort => "UShort",
            Self::Int => "Int",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::Bool => "Bool",
            Self::String => "String",
            Self::Array => "Array",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_num_range() {
        assert_eq!(ValueType::from_code(0).unwrap(), ValueType::SmallNum(0));
        assert_eq!(ValueType::from_code(239).unwrap(), ValueType::SmallNum(239));
        assert_eq!(ValueType::SmallNum(17).code(), 17);
        assert_eq!(ValueType::SmallNum(17).width(), Some(0));
    }

    #[test]
    fn reserved_codes_are_invalid() {
        for code in 0xF9u8..=0xFE {
            assert_eq!(ValueType::from_code(code).unwrap_err(), Error::InvalidValueType(code));
        }
    }

    #[test]
    fn codes_round_trip() {
        for code in (0xF0u8..=0xF8).chain([0xFF]) {
            assert_eq!(ValueType::from_code(code).unwrap().code(), code);
        }
    }

    #[test]
    fn integer_family_maps_to_value_int() {
        for vt in [ValueType::SmallNum(3), ValueType::Short, ValueType::UShort, ValueType::Int] {
            assert_eq!(vt.event_type(), EventType::ValueInt);
        }
        assert_eq!(ValueType::Byte.event_type(), EventType::ValueByte);
        assert_eq!(ValueType::Long.event_type(), EventType::ValueLong);
        assert_eq!(ValueType::Bool.event_type(), EventType::ValueBool);
    }

    #[test]
    fn array_element_types() {
        assert!(ValueType::Double.is_array_element());
        assert!(ValueType::Bool.is_array_element());
        assert!(!ValueType::String.is_array_element());
        assert!(!ValueType::Array.is_array_element());
        assert!(!ValueType::SmallNum(1).is_array_element());
    }
}
