//! Value writes: scalars, strings and typed arrays.
//!
//! A value goes into the open attribute (from `write_start_attribute`) when
//! there is one, otherwise it becomes element content.

use std::io::Write;

use super::{ArrayFrame, StreamWriter};
use crate::token::TokenType;
use crate::value::Primitive;
use crate::value_type::{ValueType, ARRAY_CODE};
use crate::{Error, Result};

impl<W: Write> StreamWriter<W> {
    fn begin_value(&mut self) -> Result<()> {
        if self.attribute.is_some() {
            return Ok(());
        }
        self.begin_content()
    }

    /// Writes one primitive value.
    ///
    /// Inside a running array the value is appended without type byte; its
    /// type must match the array element type and the declared length must
    /// not be exceeded. Outside an array `i32` values are stored in the
    /// narrowest integer encoding.
    pub fn write_value<T: Primitive>(&mut self, value: T) -> Result<()> {
        self.check_writable()?;
        if let Some(frame) = self.array.as_mut() {
            if frame.element_type != T::VALUE_TYPE {
                return Err(Error::ArrayTypeMismatch {
                    expected: frame.element_type.name(),
                    found: T::VALUE_TYPE.name(),
                });
            }
            if frame.written >= frame.length {
                return Err(Error::ArrayLengthMismatch { declared: frame.length, written: frame.written + 1 });
            }
            value.write(&mut self.out);
            frame.written += 1;
            return self.maybe_flush();
        }
        self.begin_value()?;
        self.out.write_token_type(TokenType::CharContent);
        value.write_tagged(&mut self.out);
        self.maybe_flush()
    }

    /// Writes a string value (inline, or as string reference for a
    /// registered attribute opened with `write_start_attribute`).
    pub fn write_string_value(&mut self, text: &str) -> Result<()> {
        self.check_writable()?;
        if let Some(frame) = self.array {
            return Err(Error::ArrayTypeMismatch {
                expected: frame.element_type.name(),
                found: ValueType::String.name(),
            });
        }
        if self.attribute.is_some_and(|a| a.by_reference) {
            let index = self.define_string(text)?;
            self.out.write_token_type(TokenType::CharContentRef);
            self.out.write_count(index as u64)?;
            return self.maybe_flush();
        }
        let encoded = self.encode_text(text)?;
        self.begin_value()?;
        self.out.write_token_type(TokenType::CharContent);
        self.put_string_value(&encoded)?;
        self.maybe_flush()
    }

    /// Writes a complete typed array in one call.
    pub fn write_array<T: Primitive>(&mut self, values: &[T]) -> Result<()> {
        self.check_writable()?;
        self.check_no_array()?;
        self.begin_value()?;
        self.write_array_header(T::VALUE_TYPE, values.len() as u64)?;
        for &v in values {
            v.write(&mut self.out);
        }
        self.maybe_flush()
    }

    fn write_array_header(&mut self, element_type: ValueType, length: u64) -> Result<()> {
        self.out.write_token_type(TokenType::CharContent);
        self.out.write_u8(ARRAY_CODE);
        self.out.write_u8(element_type.code());
        self.out.write_count(length)
    }

    /// Starts an array of `length` elements filled by subsequent `write_value` calls.
    pub fn start_array(&mut self, element_type: ValueType, length: u64) -> Result<()> {
        self.check_writable()?;
        self.check_no_array()?;
        if !element_type.is_array_element() {
            return Err(Error::InvalidArrayType(element_type.name()));
        }
        self.begin_value()?;
        self.write_array_header(element_type, length)?;
        self.array = Some(ArrayFrame { element_type, length, written: 0 });
        Ok(())
    }

    /// Ends the running array; fails if fewer elements than declared were written.
    pub fn end_array(&mut self) -> Result<()> {
        let frame = self.array.ok_or(Error::NoArrayInProgress)?;
        if frame.written != frame.length {
            return Err(Error::ArrayLengthMismatch { declared: frame.length, written: frame.written });
        }
        self.array = None;
        self.maybe_flush()
    }

    /// Declared length of the running array, 0 without one.
    pub fn array_length(&self) -> u64 {
        self.array.map_or(0, |f| f.length)
    }

    /// Elements written so far into the running array, 0 without one.
    pub fn array_written(&self) -> u64 {
        self.array.map_or(0, |f| f.written)
    }

    /// Element type of the running array.
    pub fn array_type(&self) -> Option<ValueType> {
        self.array.map(|f| f.element_type)
    }
}
