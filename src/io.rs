//! Primitive binary I/O.
//!
//! [`ByteReader`] decodes scalars, strings, Counts and token bytes from any
//! [`Read`] source while tracking the logical stream position.
//! [`ByteWriter`] appends into an in-memory window that starts at a logical
//! base offset; bytes inside the window can still be patched, which the
//! writer uses for deferred element tag bytes.

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::count;
use crate::options::{ByteOrder, Charset};
use crate::token::TokenType;
use crate::value_type::ValueType;
use crate::{Error, Result};

macro_rules! read_number {
    ($(#[$doc:meta])* $name:ident, $ty:ty) => {
        $(#[$doc])*
        pub fn $name(&mut self) -> Result<$ty> {
            let bytes = self.fill::<{ std::mem::size_of::<$ty>() }>()?;
            Ok(match self.byte_order {
                ByteOrder::BigEndian => <$ty>::from_be_bytes(bytes),
                ByteOrder::LittleEndian => <$ty>::from_le_bytes(bytes),
            })
        }
    };
}

macro_rules! read_numbers_into {
    ($(#[$doc:meta])* $name:ident, $ty:ty) => {
        $(#[$doc])*
        pub fn $name(&mut self, out: &mut [$ty]) -> Result<()> {
            const WIDTH: usize = std::mem::size_of::<$ty>();
            let mut chunk = [0u8; 4096];
            for items in out.chunks_mut(chunk.len() / WIDTH) {
                let bytes = &mut chunk[..items.len() * WIDTH];
                self.read_exact(bytes)?;
                for (slot, raw) in items.iter_mut().zip(bytes.chunks_exact(WIDTH)) {
                    let mut b = [0u8; WIDTH];
                    b.copy_from_slice(raw);
                    *slot = match self.byte_order {
                        ByteOrder::BigEndian => <$ty>::from_be_bytes(b),
                        ByteOrder::LittleEndian => <$ty>::from_le_bytes(b),
                    };
                }
            }
            Ok(())
        }
    };
}

macro_rules! write_number {
    ($(#[$doc:meta])* $name:ident, $ty:ty) => {
        $(#[$doc])*
        pub fn $name(&mut self, value: $ty) {
            match self.byte_order {
                ByteOrder::BigEndian => self.buf.extend_from_slice(&value.to_be_bytes()),
                ByteOrder::LittleEndian => self.buf.extend_from_slice(&value.to_le_bytes()),
            }
        }
    };
}

// ============================================================================
// ByteReader
// ============================================================================

/// Byte-order and charset aware reader over a byte source.
#[derive(Debug)]
pub struct ByteReader<R> {
    inner: R,
    position: u64,
    byte_order: ByteOrder,
    charset: Charset,
}

impl<R: Read> ByteReader<R> {
    /// Erstellt einen Reader an logischer Position 0.
    pub fn new(inner: R, byte_order: ByteOrder, charset: Charset) -> Self {
        Self::with_position(inner, 0, byte_order, charset)
    }

    /// Erstellt einen Reader, dessen Quelle bereits bei `position` steht.
    pub fn with_position(inner: R, position: u64, byte_order: ByteOrder, charset: Charset) -> Self {
        Self { inner, position, byte_order, charset }
    }

    /// Logical offset of the next byte.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn set_byte_order(&mut self, order: ByteOrder) {
        self.byte_order = order;
    }

    pub fn set_charset(&mut self, charset: Charset) {
        self.charset = charset;
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Splits into source and logical position.
    pub fn into_parts(self) -> (R, u64) {
        (self.inner, self.position)
    }

    fn fill<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf)?;
        self.position += N as u64;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.fill::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Liest einen Boolean (ein Byte, ungleich 0 = true).
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    read_number!(read_i16, i16);
    read_number!(read_u16, u16);
    read_number!(read_i32, i32);
    read_number!(read_i64, i64);
    read_number!(read_f32, f32);
    read_number!(read_f64, f64);

    pub fn read_i8_into(&mut self, out: &mut [i8]) -> Result<()> {
        for slot in out.iter_mut() {
            *slot = self.read_i8()?;
        }
        Ok(())
    }

    read_numbers_into!(
        /// Fills `out` with fixed-width items (array payloads).
        read_i16_into, i16
    );
    read_numbers_into!(read_u16_into, u16);
    read_numbers_into!(read_i32_into, i32);
    read_numbers_into!(read_i64_into, i64);
    read_numbers_into!(read_f32_into, f32);
    read_numbers_into!(read_f64_into, f64);

    /// Reads exactly `buf.len()` raw bytes.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf)?;
        self.position += buf.len() as u64;
        Ok(())
    }

    /// Reads `len` raw bytes into a fresh buffer.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        // Nicht blind vorallokieren: `len` stammt aus dem Stream.
        let mut buf = Vec::with_capacity(len.min(64 * 1024));
        let read = (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        self.position += read as u64;
        if read != len {
            return Err(short_read(len, read));
        }
        Ok(buf)
    }

    /// Reads a Count-prefixed, charset-encoded string.
    pub fn read_string(&mut self) -> Result<String> {
        let len = count::read_usize(self)?;
        let bytes = self.read_bytes(len)?;
        Ok(self.charset.decode(&bytes)?.into_owned())
    }

    pub fn read_count(&mut self) -> Result<u64> {
        count::read(self)
    }

    /// Reads one token type byte.
    pub fn read_token_type(&mut self) -> Result<TokenType> {
        TokenType::from_u8(self.read_u8()?)
    }

    /// Reads a value type byte (SmallNum payloads stay inside the variant).
    pub fn read_value_type(&mut self) -> Result<ValueType> {
        ValueType::from_code(self.read_u8()?)
    }

    /// Advances by `n` bytes without materializing them.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        let copied = io::copy(&mut (&mut self.inner).take(n), &mut io::sink())?;
        self.position += copied;
        if copied != n {
            return Err(short_read(n as usize, copied as usize));
        }
        Ok(())
    }

    /// Skips a Count-prefixed string.
    pub fn skip_string(&mut self) -> Result<()> {
        let len = self.read_count()?;
        self.skip(len)
    }

    /// Skips `count` encoded items of type `value_type` without decoding them.
    ///
    /// Fixed-width types advance by `width * count`; strings are walked by
    /// their length prefixes.
    pub fn skip_values(&mut self, value_type: ValueType, count: u64) -> Result<()> {
        match value_type.width() {
            Some(width) => {
                let bytes = (width as u64).checked_mul(count).ok_or(Error::ValueLengthOverflow {
                    value_type: value_type.name(),
                    count,
                })?;
                self.skip(bytes)
            }
            None if value_type == ValueType::String => {
                for _ in 0..count {
                    self.skip_string()?;
                }
                Ok(())
            }
            None => Err(Error::InvalidArrayElementType(value_type.name())),
        }
    }
}

impl<R: Read + Seek> ByteReader<R> {
    /// Positioniert auf einen absoluten Offset.
    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        self.position = self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Positioniert relativ zum Ende der Quelle. Liefert den neuen Offset.
    pub fn seek_from_end(&mut self, delta: i64) -> Result<u64> {
        self.position = self.inner.seek(SeekFrom::End(delta))?;
        Ok(self.position)
    }
}

fn short_read(expected: usize, got: usize) -> Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("expected {expected} bytes, got {got}"),
    )
    .into()
}

// ============================================================================
// ByteWriter
// ============================================================================

/// Patchable output window.
///
/// Everything written lands in `buf`; `base` is the logical offset of
/// `buf[0]`. [`drain_to`](Self::drain_to) moves a prefix of the window into a
/// sink and advances `base`.
#[derive(Debug)]
pub struct ByteWriter {
    buf: Vec<u8>,
    base: u64,
    byte_order: ByteOrder,
    charset: Charset,
}

impl ByteWriter {
    pub fn new(byte_order: ByteOrder, charset: Charset) -> Self {
        Self::with_base(0, byte_order, charset)
    }

    /// Window starting at logical offset `base` (bytes before it are already in the sink).
    pub fn with_base(base: u64, byte_order: ByteOrder, charset: Charset) -> Self {
        Self { buf: Vec::new(), base, byte_order, charset }
    }

    /// Logical offset of the next byte written.
    pub fn position(&self) -> u64 {
        self.base + self.buf.len() as u64
    }

    /// Logical offset of the first unflushed byte.
    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buf.push(value as u8);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(value as u8);
    }

    write_number!(write_i16, i16);
    write_number!(write_u16, u16);
    write_number!(write_i32, i32);
    write_number!(write_i64, i64);
    write_number!(write_f32, f32);
    write_number!(write_f64, f64);

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_count(&mut self, value: u64) -> Result<()> {
        count::write(self, value)
    }

    /// Writes a Count-prefixed, charset-encoded string.
    pub fn write_string(&mut self, s: &str) -> Result<()> {
        let bytes = self.charset.encode(s)?;
        self.write_count(bytes.len() as u64)?;
        self.buf.extend_from_slice(&bytes);
        Ok(())
    }

    pub fn write_token_type(&mut self, token: TokenType) {
        self.buf.push(token as u8);
    }

    /// Overwrites one already written byte at logical `offset`.
    ///
    /// The byte must still be inside the unflushed window.
    pub fn patch_u8(&mut self, offset: u64, value: u8) -> Result<()> {
        if offset < self.base || offset >= self.position() {
            return Err(Error::InternalState("patch offset outside the unflushed window"));
        }
        self.buf[(offset - self.base) as usize] = value;
        Ok(())
    }

    /// Schreibt alle Bytes vor `upto` in den Sink und verschiebt das Fenster.
    pub fn drain_to<W: Write>(&mut self, sink: &mut W, upto: u64) -> Result<()> {
        let upto = upto.clamp(self.base, self.position());
        let n = (upto - self.base) as usize;
        if n == 0 {
            return Ok(());
        }
        sink.write_all(&self.buf[..n])?;
        self.buf.drain(..n);
        self.base = upto;
        Ok(())
    }

    /// Drains the whole window.
    pub fn drain_all<W: Write>(&mut self, sink: &mut W) -> Result<()> {
        let end = self.position();
        self.drain_to(sink, end)
    }
}
