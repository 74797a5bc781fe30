//! Value access on the current event.
//!
//! Values are decoded straight from the stream on request. Every read
//! counts against the declared length of the current value; reading past
//! it is a usage error and leaves the stream untouched.

use std::io::Read;
use std::rc::Rc;

use super::StreamReader;
use crate::value::{Primitive, Scalar};
use crate::value_type::ValueType;
use crate::{Error, Result};

/// Items per chunk in [`StreamReader::read_remaining`].
const READ_CHUNK: usize = 64 * 1024;

impl<R: Read> StreamReader<R> {
    fn value_state(&self) -> Result<&super::state::ValueState> {
        self.ensure_open()?;
        self.state
            .value
            .as_ref()
            .ok_or_else(|| Error::NotAValueEvent(self.event_type().name()))
    }

    /// Encoded item type of the current value (element type for arrays).
    pub fn value_type(&self) -> Result<ValueType> {
        self.value_state().map(|v| v.value_type)
    }

    pub fn is_array(&self) -> Result<bool> {
        self.value_state().map(|v| v.is_array)
    }

    /// Declared number of items (1 for scalars).
    pub fn value_length(&self) -> Result<u64> {
        self.value_state().map(|v| v.length)
    }

    /// Items not yet read.
    pub fn values_remaining(&self) -> Result<u64> {
        self.value_state().map(|v| v.remaining())
    }

    /// Reads the next item converted to `T`.
    pub fn read_value<T: Primitive>(&mut self) -> Result<T> {
        let event = self.event_type();
        let stream = self.stream.as_mut().ok_or(Error::StreamClosed)?;
        self.state.notify_value_read(1, event)?;
        let value = self.state.value.as_ref().ok_or(Error::NotAValueEvent(event.name()))?;
        if let Some(s) = &value.resolved {
            return T::from_scalar(Scalar::String(Rc::clone(s)));
        }
        if value.value_type == T::VALUE_TYPE {
            return T::read(stream);
        }
        T::from_scalar(Scalar::read(stream, value.value_type)?)
    }

    /// Fills `out` with the next `out.len()` items.
    pub fn read_values<T: Primitive>(&mut self, out: &mut [T]) -> Result<()> {
        let event = self.event_type();
        let stream = self.stream.as_mut().ok_or(Error::StreamClosed)?;
        self.state.notify_value_read(out.len() as u64, event)?;
        let value = self.state.value.as_ref().ok_or(Error::NotAValueEvent(event.name()))?;
        if let Some(s) = &value.resolved {
            // Eine Stringreferenz hat genau ein Element.
            for slot in out.iter_mut() {
                *slot = T::from_scalar(Scalar::String(Rc::clone(s)))?;
            }
            return Ok(());
        }
        let value_type = value.value_type;
        if value_type == T::VALUE_TYPE {
            return T::read_into(stream, out);
        }
        for slot in out.iter_mut() {
            *slot = T::from_scalar(Scalar::read(stream, value_type)?)?;
        }
        Ok(())
    }

    /// Reads all remaining items into a vector.
    ///
    /// The declared length is not trusted for allocation: items are read in
    /// chunks, so a truncated stream fails with `UnexpectedEof` first.
    pub fn read_remaining<T: Primitive + Default>(&mut self) -> Result<Vec<T>> {
        let mut remaining = self.values_remaining()?;
        let cap = usize::try_from(remaining.min(READ_CHUNK as u64)).unwrap_or(READ_CHUNK);
        let mut out = Vec::with_capacity(cap);
        let mut chunk = vec![T::default(); cap];
        while remaining > 0 {
            let n = usize::try_from(remaining.min(READ_CHUNK as u64)).unwrap_or(READ_CHUNK);
            self.read_values(&mut chunk[..n])?;
            out.extend_from_slice(&chunk[..n]);
            remaining -= n as u64;
        }
        Ok(out)
    }

    /// Reads the next item in its encoded type.
    pub fn read_scalar(&mut self) -> Result<Scalar> {
        let event = self.event_type();
        let stream = self.stream.as_mut().ok_or(Error::StreamClosed)?;
        self.state.notify_value_read(1, event)?;
        let value = self.state.value.as_ref().ok_or(Error::NotAValueEvent(event.name()))?;
        match &value.resolved {
            Some(s) => Ok(Scalar::String(Rc::clone(s))),
            None => Scalar::read(stream, value.value_type),
        }
    }

    /// Reads the remaining value as text; array items are space-separated.
    ///
    /// Also returns the text of COMMENT, SPACE and VALUE_CDATA events.
    pub fn read_string_value(&mut self) -> Result<String> {
        let remaining = self.values_remaining()?;
        if remaining == 0 {
            let length = self.value_length()?;
            // Skalar bereits gelesen: wie ein weiterer Lesezugriff behandeln.
            if length > 0 {
                return Err(Error::ValueReadOverflow { length, requested: length + 1 });
            }
            return Ok(String::new());
        }
        let mut out = String::new();
        for i in 0..remaining {
            if i > 0 {
                out.push(' ');
            }
            match self.read_scalar()? {
                Scalar::String(s) => out.push_str(&s),
                other => out.push_str(&other.to_string()),
            }
        }
        Ok(out)
    }

    /// Shared handle of a CharContentRef string without copying.
    pub fn string_reference(&self) -> Result<Option<Rc<str>>> {
        self.value_state().map(|v| v.resolved.clone())
    }
}
