//! Encoding options carried in the BXML header.
//!
//! The options record is written by the writer into the stream header and
//! reconstructed from it by the reader, so both sides always agree on byte
//! order, charset and compression.
//!
//! # Beispiel
//!
//! ```
//! use bxml::options::{ByteOrder, Charset, EncodingOptions};
//!
//! let opts = EncodingOptions::default()
//!     .with_byte_order(ByteOrder::LittleEndian)
//!     .with_charset(Charset::for_label("utf-16le").unwrap())
//!     .with_compression();
//!
//! assert_eq!(opts.byte_order(), ByteOrder::LittleEndian);
//! assert_eq!(opts.charset().name(), "UTF-16LE");
//! assert!(opts.compression());
//! ```

use std::borrow::Cow;
use std::fmt;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};

use crate::{Error, Result};

/// Byte order of multi-byte primitives in the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Most significant byte first (default).
    #[default]
    BigEndian,
    /// Least significant byte first.
    LittleEndian,
}

impl ByteOrder {
    /// Byte order of the running machine.
    pub fn native() -> Self {
        if cfg!(target_endian = "little") {
            Self::LittleEndian
        } else {
            Self::BigEndian
        }
    }

    pub fn is_little_endian(self) -> bool {
        self == Self::LittleEndian
    }
}

/// Character encoding of string payloads.
///
/// Resolved through `encoding_rs` labels (WHATWG registry). UTF-16 variants
/// are encoded directly since `encoding_rs` only decodes them.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Charset(&'static Encoding);

impl Charset {
    /// UTF-8 (default).
    pub fn utf8() -> Self {
        Self(UTF_8)
    }

    /// Looks up a charset by label (case-insensitive, e.g. `"utf-8"`, `"UTF-16BE"`, `"latin1"`).
    pub fn for_label(label: &str) -> Result<Self> {
        Encoding::for_label(label.trim().as_bytes())
            .map(Self)
            .ok_or_else(|| Error::UnsupportedCharset(label.to_string()))
    }

    /// Canonical name, as written into the header.
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// True when character data is stored in little-endian code units.
    pub fn is_little_endian(&self) -> bool {
        self.0 == UTF_16LE
    }

    /// Encodes `s` into charset bytes.
    pub fn encode<'a>(&self, s: &'a str) -> Result<Cow<'a, [u8]>> {
        if self.0 == UTF_8 {
            return Ok(Cow::Borrowed(s.as_bytes()));
        }
        if self.0 == UTF_16BE || self.0 == UTF_16LE {
            let le = self.0 == UTF_16LE;
            let mut out = Vec::with_capacity(s.len() * 2);
            for unit in s.encode_utf16() {
                let bytes = if le { unit.to_le_bytes() } else { unit.to_be_bytes() };
                out.extend_from_slice(&bytes);
            }
            return Ok(Cow::Owned(out));
        }
        let (bytes, _, had_errors) = self.0.encode(s);
        if had_errors {
            return Err(Error::UnmappableCharacter);
        }
        Ok(bytes)
    }

    /// Decodes charset bytes. Malformed sequences are a format error.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, str>> {
        if self.0 == UTF_8 {
            return std::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|_| Error::InvalidCharData);
        }
        self.0
            .decode_without_bom_handling_and_without_replacement(bytes)
            .ok_or(Error::InvalidCharData)
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self::utf8()
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Charset({})", self.0.name())
    }
}

/// Options recorded in the stream header (byte order, charset, compression, flags).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncodingOptions {
    pub(crate) byte_order: ByteOrder,
    pub(crate) charset: Charset,
    pub(crate) compression: bool,
    pub(crate) strict_xml_strings: bool,
    pub(crate) validated: bool,
}

impl EncodingOptions {
    // --- Getters ---

    pub fn byte_order(&self) -> ByteOrder { self.byte_order }

    pub fn charset(&self) -> Charset { self.charset }

    pub fn compression(&self) -> bool { self.compression }

    pub fn strict_xml_strings(&self) -> bool { self.strict_xml_strings }

    pub fn validated(&self) -> bool { self.validated }

    // --- Builder ---

    pub fn with_byte_order(mut self, order: ByteOrder) -> Self { self.byte_order = order; self }

    pub fn with_charset(mut self, charset: Charset) -> Self { self.charset = charset; self }

    /// Gzip-compresses everything after the header.
    pub fn with_compression(mut self) -> Self { self.compression = true; self }

    pub fn with_strict_xml_strings(mut self) -> Self { self.strict_xml_strings = true; self }

    pub fn with_validated(mut self) -> Self { self.validated = true; self }

    // --- Setter ---

    pub fn set_byte_order(&mut self, order: ByteOrder) { self.byte_order = order; }

    pub fn set_charset(&mut self, charset: Charset) { self.charset = charset; }

    pub fn set_compression(&mut self, val: bool) { self.compression = val; }

    pub fn set_strict_xml_strings(&mut self, val: bool) { self.strict_xml_strings = val; }

    pub fn set_validated(&mut self, val: bool) { self.validated = val; }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = EncodingOptions::default();
        assert_eq!(opts.byte_order(), ByteOrder::BigEndian);
        assert_eq!(opts.charset().name(), "UTF-8");
        assert!(!opts.compression());
        assert!(!opts.strict_xml_strings());
        assert!(!opts.validated());
    }

    #[test]
    fn builder_and_setters() {
        let mut opts = EncodingOptions::default().with_validated().with_strict_xml_strings();
        assert!(opts.validated());
        assert!(opts.strict_xml_strings());
        opts.set_validated(false);
        opts.set_compression(true);
        assert!(!opts.validated());
        assert!(opts.compression());
    }

    #[test]
    fn charset_labels_resolve_case_insensitive() {
        assert_eq!(Charset::for_label("UTF-8").unwrap(), Charset::utf8());
        assert_eq!(Charset::for_label("utf-16be").unwrap().name(), "UTF-16BE");
        assert_eq!(Charset::for_label("latin1").unwrap().name(), "windows-1252");
    }

    #[test]
    fn unknown_charset_is_rejected() {
        let err = Charset::for_label("klingon-8").unwrap_err();
        assert_eq!(err, Error::UnsupportedCharset("klingon-8".into()));
    }

    #[test]
    fn utf16_encodes_in_both_byte_orders() {
        let be = Charset::for_label("utf-16be").unwrap();
        let le = Charset::for_label("utf-16le").unwrap();
        assert_eq!(be.encode("A").unwrap().as_ref(), &[0x00, 0x41]);
        assert_eq!(le.encode("A").unwrap().as_ref(), &[0x41, 0x00]);
        assert!(le.is_little_endian());
        assert!(!be.is_little_endian());
        assert_eq!(be.decode(&[0x00, 0x41, 0x00, 0x42]).unwrap(), "AB");
    }

    #[test]
    fn utf8_passes_through_borrowed() {
        let cs = Charset::utf8();
        assert!(matches!(cs.encode("grüß").unwrap(), Cow::Borrowed(_)));
        assert_eq!(cs.decode("grüß".as_bytes()).unwrap(), "grüß");
    }

    #[test]
    fn invalid_bytes_are_char_data_errors() {
        assert_eq!(Charset::utf8().decode(&[0xC3, 0x28]).unwrap_err(), Error::InvalidCharData);
    }

    #[test]
    fn unmappable_character_is_reported() {
        let latin = Charset::for_label("iso-8859-1").unwrap();
        assert_eq!(latin.encode("\u{4e2d}").unwrap_err(), Error::UnmappableCharacter);
        assert_eq!(latin.encode("abc").unwrap().as_ref(), b"abc");
    }
}
