//! Typed values.
//!
//! - [`Primitive`]: the fixed-width Rust types the reader and writer move
//!   directly (`bool`, `i8`, `i16`, `u16`, `i32`, `i64`, `f32`, `f64`).
//! - [`Scalar`]: one decoded item of any value type, used for conversions
//!   between the encoded type and the type a caller asks for.
//! - [`Value`]: owned scalar or array for the batch API.
//!
//! Conversions: strings parse into every primitive (`bool` accepts
//! `true`/`false`/`1`/`0`), every primitive renders as text, integers
//! convert when the value fits, floats convert to integers only when they
//! have no fractional part.

use std::fmt;
use std::io::Read;
use std::rc::Rc;

use crate::event::EventType;
use crate::io::{ByteReader, ByteWriter};
use crate::value_type::ValueType;
use crate::{Error, Result};

mod sealed {
    pub trait Sealed {}
}

/// Fixed-width primitive that can be written and read as a BXML value.
pub trait Primitive: sealed::Sealed + Copy + fmt::Debug + PartialEq + 'static {
    /// Own value type; also the element type of arrays of `Self`.
    const VALUE_TYPE: ValueType;

    /// Decodes the untagged payload.
    fn read<R: Read>(r: &mut ByteReader<R>) -> Result<Self>;

    /// Decodes `out.len()` untagged items.
    fn read_into<R: Read>(r: &mut ByteReader<R>, out: &mut [Self]) -> Result<()> {
        for slot in out.iter_mut() {
            *slot = Self::read(r)?;
        }
        Ok(())
    }

    /// Encodes the untagged payload.
    fn write(self, w: &mut ByteWriter);

    /// Encodes type byte plus payload for a scalar value.
    fn write_tagged(self, w: &mut ByteWriter) {
        w.write_u8(Self::VALUE_TYPE.code());
        self.write(w);
    }

    fn from_scalar(scalar: Scalar) -> Result<Self>;

    fn into_scalar(self) -> Scalar;
}

// ============================================================================
// Scalar
// ============================================================================

/// One decoded item.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Byte(i8),
    Short(i16),
    UShort(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(Rc<str>),
}

impl Scalar {
    /// Reads one item encoded as `value_type` (type byte already consumed).
    pub fn read<R: Read>(r: &mut ByteReader<R>, value_type: ValueType) -> Result<Self> {
        Ok(match value_type {
            ValueType::SmallNum(n) => Self::Int(n as i32),
            ValueType::Byte => Self::Byte(r.read_i8()?),
            ValueType::Short => Self::Short(r.read_i16()?),
            ValueType::UShort => Self::UShort(r.read_u16()?),
            ValueType::Int => Self::Int(r.read_i32()?),
            ValueType::Long => Self::Long(r.read_i64()?),
            ValueType::Float => Self::Float(r.read_f32()?),
            ValueType::Double => Self::Double(r.read_f64()?),
            ValueType::Bool => Self::Bool(r.read_bool()?),
            ValueType::String => Self::String(Rc::from(r.read_string()?)),
            ValueType::Array => return Err(Error::InvalidArrayElementType("Array")),
        })
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Byte(_) => "byte",
            Self::Short(_) => "short",
            Self::UShort(_) => "ushort",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::String(_) => "string",
        }
    }

    /// Integer view; `None` for floats, strings and bools.
    fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Byte(v) => Some(v as i64),
            Self::Short(v) => Some(v as i64),
            Self::UShort(v) => Some(v as i64),
            Self::Int(v) => Some(v as i64),
            Self::Long(v) => Some(v),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float(v) => Some(v as f64),
            Self::Double(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    fn conversion_error(&self, to: &'static str) -> Error {
        Error::ValueConversion { from: self.type_name(), to }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Short(v) => write!(f, "{v}"),
            Self::UShort(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
        }
    }
}

// ============================================================================
// Primitive impls
// ============================================================================

impl sealed::Sealed for bool {}

impl Primitive for bool {
    const VALUE_TYPE: ValueType = ValueType::Bool;

    fn read<R: Read>(r: &mut ByteReader<R>) -> Result<Self> {
        r.read_bool()
    }

    fn write(self, w: &mut ByteWriter) {
        w.write_bool(self);
    }

    fn from_scalar(scalar: Scalar) -> Result<Self> {
        match &scalar {
            Scalar::Bool(v) => Ok(*v),
            Scalar::String(s) => match s.trim() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(scalar.conversion_error("bool")),
            },
            _ => match scalar.as_i64() {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(scalar.conversion_error("bool")),
            },
        }
    }

    fn into_scalar(self) -> Scalar {
        Scalar::Bool(self)
    }
}

macro_rules! integer_primitive {
    ($ty:ty, $vt:expr, $variant:ident, $read:ident, $read_into:ident, $write:ident, $name:literal) => {
        impl sealed::Sealed for $ty {}

        impl Primitive for $ty {
            const VALUE_TYPE: ValueType = $vt;

            fn read<R: Read>(r: &mut ByteReader<R>) -> Result<Self> {
                r.$read()
            }

            fn read_into<R: Read>(r: &mut ByteReader<R>, out: &mut [Self]) -> Result<()> {
                r.$read_into(out)
            }

            fn write(self, w: &mut ByteWriter) {
                w.$write(self);
            }

            fn from_scalar(scalar: Scalar) -> Result<Self> {
                let wide = match &scalar {
                    Scalar::Bool(b) => Some(*b as i64),
                    Scalar::String(s) => {
                        return s.trim().parse::<$ty>().map_err(|_| scalar.conversion_error($name));
                    }
                    Scalar::Float(_) | Scalar::Double(_) => scalar
                        .as_f64()
                        .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                        .map(|f| f as i64),
                    _ => scalar.as_i64(),
                };
                wide.and_then(|v| <$ty>::try_from(v).ok())
                    .ok_or_else(|| scalar.conversion_error($name))
            }

            fn into_scalar(self) -> Scalar {
                Scalar::$variant(self)
            }
        }
    };
}

integer_primitive!(i8, ValueType::Byte, Byte, read_i8, read_i8_into, write_i8, "byte");
integer_primitive!(i16, ValueType::Short, Short, read_i16, read_i16_into, write_i16, "short");
integer_primitive!(u16, ValueType::UShort, UShort, read_u16, read_u16_into, write_u16, "ushort");
integer_primitive!(i64, ValueType::Long, Long, read_i64, read_i64_into, write_i64, "long");

impl sealed::Sealed for i32 {}

impl Primitive for i32 {
    const VALUE_TYPE: ValueType = ValueType::Int;

    fn read<R: Read>(r: &mut ByteReader<R>) -> Result<Self> {
        r.read_i32()
    }

    fn read_into<R: Read>(r: &mut ByteReader<R>, out: &mut [Self]) -> Result<()> {
        r.read_i32_into(out)
    }

    fn write(self, w: &mut ByteWriter) {
        w.write_i32(self);
    }

    /// Kleinste Codierung: SmallNum, Short, UShort, sonst Int.
    fn write_tagged(self, w: &mut ByteWriter) {
        if (0..=0xEF).contains(&self) {
            w.write_u8(self as u8);
        } else if let Ok(v) = i16::try_from(self) {
            w.write_u8(ValueType::Short.code());
            w.write_i16(v);
        } else if let Ok(v) = u16::try_from(self) {
            w.write_u8(ValueType::UShort.code());
            w.write_u16(v);
        } else {
            w.write_u8(ValueType::Int.code());
            w.write_i32(self);
        }
    }

    fn from_scalar(scalar: Scalar) -> Result<Self> {
        let wide = match &scalar {
            Scalar::Bool(b) => Some(*b as i64),
            Scalar::String(s) => {
                return s.trim().parse::<i32>().map_err(|_| scalar.conversion_error("int"));
            }
            Scalar::Float(_) | Scalar::Double(_) => scalar
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i32::MIN as f64 && *f <= i32::MAX as f64)
                .map(|f| f as i64),
            _ => scalar.as_i64(),
        };
        wide.and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| scalar.conversion_error("int"))
    }

    fn into_scalar(self) -> Scalar {
        Scalar::Int(self)
    }
}

macro_rules! float_primitive {
    ($ty:ty, $vt:expr, $variant:ident, $read:ident, $read_into:ident, $write:ident, $name:literal) => {
        impl sealed::Sealed for $ty {}

        impl Primitive for $ty {
            const VALUE_TYPE: ValueType = $vt;

            fn read<R: Read>(r: &mut ByteReader<R>) -> Result<Self> {
                r.$read()
            }

            fn read_into<R: Read>(r: &mut ByteReader<R>, out: &mut [Self]) -> Result<()> {
                r.$read_into(out)
            }

            fn write(self, w: &mut ByteWriter) {
                w.$write(self);
            }

            fn from_scalar(scalar: Scalar) -> Result<Self> {
                match &scalar {
                    Scalar::String(s) => {
                        s.trim().parse::<$ty>().map_err(|_| scalar.conversion_error($name))
                    }
                    _ => scalar
                        .as_f64()
                        .map(|v| v as $ty)
                        .ok_or_else(|| scalar.conversion_error($name)),
                }
            }

            fn into_scalar(self) -> Scalar {
                Scalar::$variant(self)
            }
        }
    };
}

float_primitive!(f32, ValueType::Float, Float, read_f32, read_f32_into, write_f32, "float");
float_primitive!(f64, ValueType::Double, Double, read_f64, read_f64_into, write_f64, "double");

// ============================================================================
// Value (owned)
// ============================================================================

/// Owned value for the batch API.
///
/// Short and unsigned short values decode as `Int` / `IntArray`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(i8),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(Rc<str>),
    BoolArray(Vec<bool>),
    ByteArray(Vec<i8>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
}

impl Value {
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Bool(_) | Self::BoolArray(_) => EventType::ValueBool,
            Self::Byte(_) | Self::ByteArray(_) => EventType::ValueByte,
            Self::Int(_) | Self::IntArray(_) => EventType::ValueInt,
            Self::Long(_) | Self::LongArray(_) => EventType::ValueLong,
            Self::Float(_) | Self::FloatArray(_) => EventType::ValueFloat,
            Self::Double(_) | Self::DoubleArray(_) => EventType::ValueDouble,
            Self::String(_) => EventType::ValueString,
        }
    }

    pub fn is_array(&self) -> bool {
        !matches!(
            self,
            Self::Bool(_) | Self::Byte(_) | Self::Int(_) | Self::Long(_) | Self::Float(_) | Self::Double(_) | Self::String(_)
        )
    }

    pub fn string(s: &str) -> Self {
        Self::String(Rc::from(s))
    }
}
