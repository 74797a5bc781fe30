//! bxml – streaming codec for the BXML binary XML format
//!
//! A BXML stream is a header followed by a body of one-byte tokens
//! (elements, attributes, typed values, string-table definitions) and a
//! trailer that indexes the string table for random access. Numeric data
//! is stored in binary form, single values as well as typed arrays.
//!
//! - [`reader::StreamReader`]: pull parser with lazy value decoding and
//!   optional random access on seekable sources.
//! - [`writer::StreamWriter`]: streaming writer with deferred element tags.
//! - [`reader::decode`] / [`writer::encode`]: batch API over [`Event`]s.
//!
//! # Beispiel
//!
//! ```
//! use std::rc::Rc;
//! use bxml::{encode, decode, EncodingOptions, Event, QName, Value};
//!
//! let events = vec![
//!     Event::StartDocument,
//!     Event::StartElement(Rc::new(QName::new("", "posList"))),
//!     Event::attribute("count", "3"),
//!     Event::Value(Value::DoubleArray(vec![7.1, 47.3, 512.0])),
//!     Event::EndElement,
//!     Event::EndDocument,
//! ];
//! let bytes = encode(&events, &EncodingOptions::default()).unwrap();
//! let decoded = decode(&bytes).unwrap();
//! assert_eq!(decoded, events);
//! ```

pub mod count;
pub mod error;
pub mod event;
pub mod factory;
pub mod header;
pub mod io;
pub mod namespace;
pub mod options;
pub mod qname;
pub mod reader;
pub mod string_table;
pub mod token;
pub mod trailer;
pub mod value;
pub mod value_type;
pub mod writer;

pub use error::{Error, ErrorKind, Result};

/// HashSet mit ahash (schneller, nicht DoS-resistent; für interne Datenstrukturen).
pub(crate) type FastHashSet<K> = hashbrown::HashSet<K, ahash::RandomState>;

/// IndexMap mit ahash (deterministische Iteration + schnelles Hashing).
pub(crate) type FastIndexMap<K, V> = indexmap::IndexMap<K, V, ahash::RandomState>;

// Public API: Events
pub use event::{AtContent, Event, EventType, NsContent};
pub use value::{Primitive, Scalar, Value};

// Public API: Options
pub use options::{ByteOrder, Charset, EncodingOptions};

// Public API: Header/Trailer
pub use header::Header;
pub use trailer::Trailer;

// Public API: Reader/Writer
pub use reader::{decode, decode_with_config, ReaderConfig, StreamReader};
pub use writer::{encode, StreamWriter, WriterConfig};
pub use factory::{default_factory, StreamFactory};

// Public API: Types
pub use qname::QName;
pub use token::TokenType;
pub use value_type::ValueType;
