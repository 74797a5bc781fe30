//! BXML Stream Reader.
//!
//! Pull parser over a BXML byte source. Every `next()` yields one
//! [`EventType`]; names, attributes and namespace declarations of the
//! current element and the current value are available through accessors.
//! Values are decoded lazily: whatever the caller does not read is skipped
//! by width arithmetic on the next `next()`.
//!
//! # Beispiel
//!
//! ```
//! use bxml::event::EventType;
//! use bxml::options::EncodingOptions;
//! use bxml::reader::StreamReader;
//! use bxml::writer::StreamWriter;
//!
//! let mut w = StreamWriter::new(Vec::new(), EncodingOptions::default()).unwrap();
//! w.write_start_document().unwrap();
//! w.write_start_element("point").unwrap();
//! w.write_attribute("srs", "EPSG:4326").unwrap();
//! w.write_array(&[7.5f64, 47.1]).unwrap();
//! w.write_end_element().unwrap();
//! w.write_end_document().unwrap();
//! let bytes = w.into_inner().unwrap();
//!
//! let mut r = StreamReader::new(bytes.as_slice()).unwrap();
//! assert_eq!(r.next_tag().unwrap(), EventType::StartElement);
//! assert_eq!(r.local_name().unwrap(), "point");
//! assert_eq!(r.attribute_value_by_name("", "srs").unwrap(), Some("EPSG:4326"));
//! assert_eq!(r.next().unwrap(), EventType::ValueDouble);
//! let mut coords = [0.0f64; 2];
//! r.read_values(&mut coords).unwrap();
//! assert_eq!(coords, [7.5, 47.1]);
//! ```

mod api;
mod config;
mod input;
mod seek;
mod state;
mod value;
mod worker;

pub use api::{decode, decode_with_config};
pub use config::{ReaderConfig, DEFAULT_BUFFER_CAPACITY};

use std::io::Read;
use std::rc::Rc;

use log::debug;

use crate::event::EventType;
use crate::header::Header;
use crate::io::ByteReader;
use crate::options::{ByteOrder, Charset, EncodingOptions};
use crate::qname::QName;
use crate::string_table::StringTable;
use crate::token::TokenType;
use crate::trailer::Trailer;
use crate::{Error, Result};

use input::Input;
use state::ParseState;
use worker::Worker;

/// Streaming pull reader.
///
/// Random access ([`set_position`](Self::set_position)) is available for
/// seekable sources opened with [`with_random_access`](Self::with_random_access).
pub struct StreamReader<R: Read> {
    stream: Option<ByteReader<Input<R>>>,
    header: Header,
    config: ReaderConfig,
    state: ParseState,
    worker: Worker,
    /// Erste Position nach dem Header.
    body_start: u64,
    /// Trailer geladen und Stringtabelle vorab aufgebaut.
    random_access: bool,
    /// Offset des Wurzelelements (nur bei Random Access bekannt).
    root_offset: Option<u64>,
}

impl<R: Read> StreamReader<R> {
    /// Reads the header and positions before START_DOCUMENT.
    pub fn new(inner: R) -> Result<Self> {
        Self::with_config(inner, ReaderConfig::default())
    }

    pub fn with_config(inner: R, config: ReaderConfig) -> Result<Self> {
        let input = Input::new(inner, config.buffer_capacity());
        let mut stream = ByteReader::new(input, ByteOrder::BigEndian, Charset::utf8());
        let header = Header::decode(&mut stream)?;
        let body_start = stream.position();
        if header.options().compression() {
            let (input, position) = stream.into_parts();
            let options = header.options();
            stream = ByteReader::with_position(
                input.into_gzip(),
                position,
                options.byte_order(),
                options.charset(),
            );
        }
        let state = ParseState::new(config.namespace_aware());
        Ok(Self {
            stream: Some(stream),
            header,
            config,
            state,
            worker: Worker::Initial,
            body_start,
            random_access: false,
            root_offset: None,
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.stream.is_none() {
            return Err(Error::StreamClosed);
        }
        Ok(())
    }

    // --- Stream-Metadaten ---

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn options(&self) -> &EncodingOptions {
        self.header.options()
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Strings defined so far (all strings after a random-access open).
    pub fn string_table(&self) -> &StringTable {
        &self.state.strings
    }

    /// Trailer, once END_DOCUMENT was reached or random access was enabled.
    pub fn trailer(&self) -> Option<&Trailer> {
        self.state.trailer.as_ref()
    }

    // --- Navigation ---

    pub fn event_type(&self) -> EventType {
        self.worker.event_type()
    }

    /// False after END_DOCUMENT or `close()`.
    pub fn has_next(&self) -> bool {
        self.stream.is_some() && self.worker != Worker::EndDocument
    }

    /// Advances to the next event.
    pub fn next(&mut self) -> Result<EventType> {
        let current = self.worker;
        let stream = self.stream.as_mut().ok_or(Error::StreamClosed)?;
        self.worker = current.next(stream, &mut self.state)?;
        Ok(self.worker.event_type())
    }

    /// Advances to the next START_ELEMENT or END_ELEMENT, skipping values,
    /// comments and whitespace.
    pub fn next_tag(&mut self) -> Result<EventType> {
        loop {
            match self.next()? {
                event if event.is_tag() => return Ok(event),
                EventType::EndDocument => {
                    return Err(Error::unexpected_event("START_ELEMENT or END_ELEMENT", "END_DOCUMENT"));
                }
                _ => {}
            }
        }
    }

    /// Fails with `UnexpectedEvent` unless the current event is `expected`.
    pub fn require(&self, expected: EventType) -> Result<()> {
        let found = self.event_type();
        if found != expected {
            return Err(Error::unexpected_event(expected.name(), found.name()));
        }
        Ok(())
    }

    /// Byte offset of the token behind the current event.
    pub fn token_position(&self) -> u64 {
        self.state.token_position
    }

    /// Token type behind the current event.
    pub fn token_type(&self) -> Option<TokenType> {
        self.state.token
    }

    /// Number of open elements (the current START_ELEMENT included).
    pub fn depth(&self) -> usize {
        self.state.elements.depth()
    }

    /// Offset of the innermost open element's tag, usable with `set_position`.
    pub fn element_position(&self) -> Result<u64> {
        self.ensure_open()?;
        self.state.elements.top().map(|e| e.offset).ok_or(Error::NoOpenElement)
    }

    // --- Dokument ---

    /// Version from the XmlDeclaration, if the stream has one.
    pub fn xml_version(&self) -> Option<&str> {
        self.state.xml_version.as_deref()
    }

    pub fn standalone(&self) -> bool {
        self.state.standalone
    }

    /// True when the declaration carried an explicit standalone value.
    pub fn standalone_set(&self) -> bool {
        self.state.standalone_set
    }

    /// Position hint of the current COMMENT.
    pub fn comment_position_hint(&self) -> u8 {
        self.state.comment_hint
    }

    /// Line-break count of the current SPACE.
    pub fn whitespace_line_count(&self) -> u64 {
        self.state.whitespace_lines
    }

    // --- Namen ---

    fn require_tag(&self) -> Result<()> {
        self.ensure_open()?;
        let event = self.event_type();
        if !event.is_tag() {
            return Err(Error::unexpected_event("START_ELEMENT or END_ELEMENT", event.name()));
        }
        Ok(())
    }

    fn require_start(&self) -> Result<()> {
        self.ensure_open()?;
        self.require(EventType::StartElement)
    }

    /// Name of the current START_ELEMENT / END_ELEMENT.
    ///
    /// An END_ELEMENT read right after a seek has no known start tag and
    /// fails with [`Error::NoOpenElement`].
    pub fn name(&self) -> Result<&Rc<QName>> {
        self.require_tag()?;
        self.state.current_name.as_ref().ok_or(Error::NoOpenElement)
    }

    pub fn local_name(&self) -> Result<&str> {
        self.name().map(|n| &*n.local_name)
    }

    pub fn namespace_uri(&self) -> Result<&str> {
        self.name().map(|n| &*n.uri)
    }

    pub fn prefix(&self) -> Result<Option<&str>> {
        self.name().map(|n| n.prefix())
    }

    // --- Attribute ---

    pub fn attribute_count(&self) -> Result<usize> {
        self.require_start()?;
        Ok(self.state.attributes.len())
    }

    pub fn attribute_name(&self, index: usize) -> Result<&Rc<QName>> {
        self.require_start()?;
        let len = self.state.attributes.len();
        self.state
            .attributes
            .get(index)
            .map(|a| &a.name)
            .ok_or(Error::IndexOutOfBounds { index, len })
    }

    pub fn attribute_value(&self, index: usize) -> Result<&str> {
        self.require_start()?;
        let len = self.state.attributes.len();
        self.state
            .attributes
            .get(index)
            .map(|a| &*a.value)
            .ok_or(Error::IndexOutOfBounds { index, len })
    }

    /// Value of the attribute `{uri}local`, `None` if absent.
    pub fn attribute_value_by_name(&self, uri: &str, local_name: &str) -> Result<Option<&str>> {
        self.require_start()?;
        Ok(self
            .state
            .attributes
            .iter()
            .find(|a| &*a.name.uri == uri && &*a.name.local_name == local_name)
            .map(|a| &*a.value))
    }

    // --- Namespaces ---

    /// Namespace declarations of the current START_ELEMENT (namespace-aware mode).
    pub fn namespace_count(&self) -> Result<usize> {
        self.require_start()?;
        Ok(self.state.declared.len())
    }

    /// Declared prefix at `index`, empty for the default namespace.
    pub fn namespace_prefix(&self, index: usize) -> Result<&str> {
        self.require_start()?;
        let len = self.state.declared.len();
        self.state
            .declared
            .get(index)
            .map(|(p, _)| &**p)
            .ok_or(Error::IndexOutOfBounds { index, len })
    }

    pub fn namespace_uri_at(&self, index: usize) -> Result<&str> {
        self.require_start()?;
        let len = self.state.declared.len();
        self.state
            .declared
            .get(index)
            .map(|(_, u)| &**u)
            .ok_or(Error::IndexOutOfBounds { index, len })
    }

    /// URI currently bound to `prefix`.
    pub fn namespace_uri_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.state.namespaces.resolve_prefix(prefix)
    }

    // --- Lebenszyklus ---

    /// Releases the source. Idempotent; later stream operations fail with
    /// [`Error::StreamClosed`].
    pub fn close(&mut self) -> Result<()> {
        if self.stream.take().is_some() {
            debug!("reader closed at event {}", self.event_type());
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }
}

impl<R: Read> std::fmt::Debug for StreamReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamReader")
            .field("header", &self.header)
            .field("event", &self.event_type())
            .field("token_position", &self.state.token_position)
            .field("depth", &self.depth())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests;
