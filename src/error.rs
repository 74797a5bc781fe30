//! Central error types for the BXML codec.
//!
//! Every variant belongs to exactly one [`ErrorKind`]:
//! - **Format**: the byte stream is corrupt or not BXML. Fatal for the stream.
//! - **Usage**: the caller violated the reader/writer call contract.
//! - **Io**: the underlying byte channel failed or was closed.
//!
//! The codec never recovers on its own. Whatever is detected stops forward
//! progress.

use core::fmt;
use std::borrow::Cow;
use std::io;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Data corruption or foreign data (magic, version, codes, trailer).
    Format,
    /// Programming defect on the caller side (call order, array lengths).
    Usage,
    /// Transport failure, short read or closed stream.
    Io,
}

/// All errors raised by the BXML reader and writer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    // ------------------------------------------------------------------
    // Format
    // ------------------------------------------------------------------
    /// Magic bytes, sniff marker or a header field are wrong.
    MalformedHeader(Cow<'static, str>),
    /// The header announces a format version this codec cannot read.
    UnsupportedVersion { major: u8, minor: u8, patch: u8 },
    /// The header names a charset that is not known.
    UnsupportedCharset(String),
    /// A Count discriminator byte is outside the legal set.
    InvalidCountCode(u8),
    /// A byte in token position is not a TokenType.
    InvalidTokenType(u8),
    /// A byte in value-type position is not a ValueType.
    InvalidValueType(u8),
    /// An array declares an element type that has no fixed width.
    InvalidArrayElementType(&'static str),
    /// A known token kind that this codec deliberately does not process.
    UnsupportedToken(&'static str),
    /// A token appeared where the grammar does not allow it.
    UnexpectedToken {
        /// What the reader was prepared to accept.
        expected: Cow<'static, str>,
        /// The token that was actually found.
        found: Cow<'static, str>,
    },
    /// A string table reference points past the defined entries.
    InvalidStringIndex { index: u64, len: usize },
    /// String bytes are not valid in the stream's charset.
    InvalidCharData,
    /// The trailer id is not `0x01 'T' 'R' 0x00`.
    TrailerIdMismatch([u8; 4]),
    /// The trailer cannot be located or parsed.
    MalformedTrailer(Cow<'static, str>),
    /// A trailer fragment disagrees with the string table it points at.
    StringTableIndexMismatch { expected: u64, found: u64 },
    /// A name uses a namespace prefix with no visible declaration.
    UnboundPrefix(String),
    /// An array declares more payload bytes than a stream can address.
    ValueLengthOverflow { value_type: &'static str, count: u64 },

    // ------------------------------------------------------------------
    // Usage
    // ------------------------------------------------------------------
    /// Number of written array elements differs from the declared length.
    ArrayLengthMismatch { declared: u64, written: u64 },
    /// `start_array` while another array is still open.
    ArrayInProgress,
    /// `end_array` without a matching `start_array`.
    NoArrayInProgress,
    /// A scalar of the wrong type was written into an open array.
    ArrayTypeMismatch { expected: &'static str, found: &'static str },
    /// The value type cannot be used as an array element type.
    InvalidArrayType(&'static str),
    /// A value accessor was called while no value event is current.
    NotAValueEvent(&'static str),
    /// More value elements were requested than the current event declares.
    ValueReadOverflow { length: u64, requested: u64 },
    /// The current value cannot be represented as the requested type.
    ValueConversion { from: &'static str, to: &'static str },
    /// The current event does not allow the requested operation.
    UnexpectedEvent {
        /// What the operation requires.
        expected: Cow<'static, str>,
        /// The event that is current.
        found: Cow<'static, str>,
    },
    /// `next()` was called after END_DOCUMENT.
    NoMoreEvents,
    /// `write_end_element` with an empty element stack.
    NoOpenElement,
    /// Attribute or namespace written after the element received content.
    AttributeAfterContent,
    /// Write after `write_end_document`.
    DocumentClosed,
    /// Namespace URI with no bound prefix (namespace-aware writer).
    UnboundNamespace(String),
    /// The string contains characters the stream charset cannot represent.
    UnmappableCharacter,
    /// A Count value exceeds the largest encodable value.
    CountOutOfRange(u64),
    /// Random access needs a seekable, uncompressed stream with a trailer index.
    RandomAccessUnsupported,
    /// Index-based accessor out of range.
    IndexOutOfBounds { index: usize, len: usize },
    /// Internal bookkeeping invariant was violated.
    InternalState(&'static str),

    // ------------------------------------------------------------------
    // Io
    // ------------------------------------------------------------------
    /// The underlying channel reported an error.
    Io { kind: io::ErrorKind, message: String },
    /// The reader or writer has been closed.
    StreamClosed,
}

impl Error {
    /// Returns the taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedHeader(_)
            | Self::UnsupportedVersion { .. }
            | Self::UnsupportedCharset(_)
            | Self::InvalidCountCode(_)
            | Self::InvalidTokenType(_)
            | Self::InvalidValueType(_)
            | Self::InvalidArrayElementType(_)
            | Self::UnsupportedToken(_)
            | Self::UnexpectedToken { .. }
            | Self::InvalidStringIndex { .. }
            | Self::InvalidCharData
            | Self::TrailerIdMismatch(_)
            | Self::MalformedTrailer(_)
            | Self::StringTableIndexMismatch { .. }
            | Self::UnboundPrefix(_)
            | Self::ValueLengthOverflow { .. } => ErrorKind::Format,
            Self::ArrayLengthMismatch { .. }
            | Self::ArrayInProgress
            | Self::NoArrayInProgress
            | Self::ArrayTypeMismatch { .. }
            | Self::InvalidArrayType(_)
            | Self::NotAValueEvent(_)
            | Self::ValueReadOverflow { .. }
            | Self::ValueConversion { .. }
            | Self::UnexpectedEvent { .. }
            | Self::NoMoreEvents
            | Self::NoOpenElement
            | Self::AttributeAfterContent
            | Self::DocumentClosed
            | Self::UnboundNamespace(_)
            | Self::UnmappableCharacter
            | Self::CountOutOfRange(_)
            | Self::RandomAccessUnsupported
            | Self::IndexOutOfBounds { .. }
            | Self::InternalState(_) => ErrorKind::Usage,
            Self::Io { .. } | Self::StreamClosed => ErrorKind::Io,
        }
    }

    /// Creates an `UnexpectedToken` error with context.
    pub fn unexpected_token(
        expected: impl Into<Cow<'static, str>>,
        found: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::UnexpectedToken {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Creates an `UnexpectedEvent` error with context.
    pub fn unexpected_event(
        expected: impl Into<Cow<'static, str>>,
        found: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::UnexpectedEvent {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Creates a `MalformedHeader` error with a message.
    pub fn malformed_header(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::MalformedHeader(msg.into())
    }

    /// Creates a `MalformedTrailer` error with a message.
    pub fn malformed_trailer(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::MalformedTrailer(msg.into())
    }

    /// True for a short read on the underlying channel.
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(self, Self::Io { kind: io::ErrorKind::UnexpectedEof, .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedHeader(msg) => {
                if msg.is_empty() {
                    write!(f, "malformed BXML header")
                } else {
                    write!(f, "malformed BXML header: {msg}")
                }
            }
            Self::UnsupportedVersion { major, minor, patch } => {
                write!(f, "unsupported BXML version {major}.{minor}.{patch}")
            }
            Self::UnsupportedCharset(name) => write!(f, "unsupported charset '{name}'"),
            Self::InvalidCountCode(code) => write!(f, "invalid Count discriminator 0x{code:02X}"),
            Self::InvalidTokenType(code) => write!(f, "invalid token type 0x{code:02X}"),
            Self::InvalidValueType(code) => write!(f, "invalid value type 0x{code:02X}"),
            Self::InvalidArrayElementType(name) => {
                write!(f, "value type {name} is not a valid array element type")
            }
            Self::UnsupportedToken(name) => write!(f, "unsupported token {name}"),
            Self::UnexpectedToken { expected, found } => {
                if expected.is_empty() {
                    write!(f, "unexpected token {found}")
                } else {
                    write!(f, "unexpected token {found}, expected {expected}")
                }
            }
            Self::InvalidStringIndex { index, len } => {
                write!(f, "string table index {index} out of range (table size {len})")
            }
            Self::InvalidCharData => write!(f, "character data is invalid for the stream charset"),
            Self::TrailerIdMismatch(id) => write!(f, "trailer id mismatch: {id:02X?}"),
            Self::MalformedTrailer(msg) => write!(f, "malformed trailer: {msg}"),
            Self::StringTableIndexMismatch { expected, found } => write!(
                f,
                "string table index mismatch: trailer announces {expected} strings, stream holds {found}"
            ),
            Self::UnboundPrefix(prefix) => write!(f, "namespace prefix '{prefix}' is not bound"),
            Self::ValueLengthOverflow { value_type, count } => {
                write!(f, "array of {count} {value_type} items exceeds the addressable length")
            }
            Self::ArrayLengthMismatch { declared, written } => write!(
                f,
                "array length mismatch: declared {declared}, written {written}"
            ),
            Self::ArrayInProgress => write!(f, "an array write is already in progress"),
            Self::NoArrayInProgress => write!(f, "no array write in progress"),
            Self::ArrayTypeMismatch { expected, found } => {
                write!(f, "array element type mismatch: expected {expected}, found {found}")
            }
            Self::InvalidArrayType(name) => write!(f, "{name} cannot be used as array element type"),
            Self::NotAValueEvent(event) => write!(f, "no value available at event {event}"),
            Self::ValueReadOverflow { length, requested } => write!(
                f,
                "value read overflow: {requested} elements requested, value length is {length}"
            ),
            Self::ValueConversion { from, to } => write!(f, "cannot convert {from} value to {to}"),
            Self::UnexpectedEvent { expected, found } => {
                write!(f, "unexpected event {found}, expected {expected}")
            }
            Self::NoMoreEvents => write!(f, "no more events after END_DOCUMENT"),
            Self::NoOpenElement => write!(f, "no open element"),
            Self::AttributeAfterContent => write!(f, "attributes must precede element content"),
            Self::DocumentClosed => write!(f, "document already ended"),
            Self::UnboundNamespace(uri) => write!(f, "no prefix bound for namespace '{uri}'"),
            Self::UnmappableCharacter => {
                write!(f, "string contains characters not representable in the stream charset")
            }
            Self::CountOutOfRange(value) => write!(f, "Count value {value} out of range"),
            Self::RandomAccessUnsupported => write!(
                f,
                "random access requires a seekable uncompressed stream with a trailer index"
            ),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds (length {len})")
            }
            Self::InternalState(msg) => write!(f, "internal state violation: {msg}"),
            Self::Io { kind, message } => write!(f, "IO error ({kind:?}): {message}"),
            Self::StreamClosed => write!(f, "stream is closed"),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// A convenience `Result` type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_header_display() {
        let e = Error::malformed_header("bad magic");
        let msg = e.to_string();
        assert!(msg.contains("header"), "{msg}");
        assert!(msg.contains("bad magic"), "{msg}");
        assert_eq!(e.kind(), ErrorKind::Format);
    }

    #[test]
    fn malformed_header_without_message() {
        let msg = Error::malformed_header("").to_string();
        assert_eq!(msg, "malformed BXML header");
    }

    #[test]
    fn unsupported_version_display() {
        let e = Error::UnsupportedVersion { major: 2, minor: 1, patch: 0 };
        assert!(e.to_string().contains("2.1.0"));
        assert_eq!(e.kind(), ErrorKind::Format);
    }

    #[test]
    fn count_code_display_is_hex() {
        let msg = Error::InvalidCountCode(0xF7).to_string();
        assert!(msg.contains("0xF7"), "{msg}");
    }

    #[test]
    fn unexpected_token_with_and_without_expectation() {
        let e = Error::unexpected_token("AttributeListEnd", "ElementEnd");
        let msg = e.to_string();
        assert!(msg.contains("ElementEnd"), "{msg}");
        assert!(msg.contains("AttributeListEnd"), "{msg}");

        let e = Error::unexpected_token("", "XmlDeclaration");
        assert_eq!(e.to_string(), "unexpected token XmlDeclaration");
    }

    #[test]
    fn array_errors_are_usage() {
        assert_eq!(
            Error::ArrayLengthMismatch { declared: 3, written: 2 }.kind(),
            ErrorKind::Usage
        );
        assert_eq!(Error::ArrayInProgress.kind(), ErrorKind::Usage);
        assert_eq!(Error::NoArrayInProgress.kind(), ErrorKind::Usage);
        assert_eq!(
            Error::ValueReadOverflow { length: 1, requested: 2 }.kind(),
            ErrorKind::Usage
        );
    }

    #[test]
    fn trailer_errors_are_format() {
        assert_eq!(Error::TrailerIdMismatch([0, 0, 0, 0]).kind(), ErrorKind::Format);
        assert_eq!(
            Error::StringTableIndexMismatch { expected: 1, found: 2 }.kind(),
            ErrorKind::Format
        );
    }

    #[test]
    fn io_error_conversion_keeps_kind() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "short read");
        let e: Error = io_err.into();
        assert!(e.is_unexpected_eof());
        assert_eq!(e.kind(), ErrorKind::Io);
        assert!(e.to_string().contains("short read"));
    }

    #[test]
    fn stream_closed_is_io() {
        assert_eq!(Error::StreamClosed.kind(), ErrorKind::Io);
        assert_eq!(Error::StreamClosed.to_string(), "stream is closed");
    }

    #[test]
    fn error_implements_std_error() {
        fn assert_std_error<E: std::error::Error>() {}
        assert_std_error::<Error>();
    }
}
