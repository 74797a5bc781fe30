//! BXML Stream Writer.
//!
//! Mirror of the reader: each call appends tokens to a patchable output
//! window which is drained into the sink in chunks.
//!
//! Element tag bytes are deferred. `write_start_element` emits a provisional
//! `EmptyElement` byte; it is patched to `EmptyAttrElement`,
//! `ContentElement` or `ContentAttrElement` once attributes and/or content
//! follow. Only the innermost element can still change, so everything
//! before its tag byte may already leave the window.
//!
//! # Beispiel
//!
//! ```
//! use bxml::options::EncodingOptions;
//! use bxml::value_type::ValueType;
//! use bxml::writer::StreamWriter;
//!
//! let mut w = StreamWriter::new(Vec::new(), EncodingOptions::default()).unwrap();
//! w.write_start_document().unwrap();
//! w.write_start_element("pos").unwrap();
//! w.start_array(ValueType::Int, 3).unwrap();
//! for v in [1, 2, 3] {
//!     w.write_value(v).unwrap();
//! }
//! w.end_array().unwrap();
//! w.write_end_element().unwrap();
//! w.write_end_document().unwrap();
//! let bytes = w.into_inner().unwrap();
//! assert_eq!(&bytes[..6], b"\x01BXML\x00");
//! ```

mod api;
mod config;
mod output;
mod value;

pub use api::encode;
pub use config::{WriterConfig, DEFAULT_FLUSH_THRESHOLD};

use std::borrow::Cow;
use std::io::Write;
use std::rc::Rc;

use log::{debug, trace, warn};

use crate::header::Header;
use crate::io::ByteWriter;
use crate::namespace::{NamespaceContext, XMLNS_PREFIX, XSI_NS_URI};
use crate::options::EncodingOptions;
use crate::string_table::StringTable;
use crate::token::TokenType;
use crate::trailer::Trailer;
use crate::value_type::{ValueType, STRING_CODE};
use crate::{Error, FastHashSet, Result};

use output::Output;

/// Open element with its deferred tag byte.
#[derive(Debug)]
struct OpenElement {
    /// Offset des provisorischen Tag-Bytes.
    offset: u64,
    name: Rc<str>,
    has_attributes: bool,
    has_content: bool,
    attributes_closed: bool,
}

impl OpenElement {
    fn token(&self) -> TokenType {
        TokenType::element(self.has_attributes, self.has_content)
    }
}

/// Attribute opened by `write_start_attribute`; values become its fragments.
#[derive(Debug, Clone, Copy)]
struct OpenAttribute {
    by_reference: bool,
}

/// Running array write started by `start_array`.
#[derive(Debug, Clone, Copy)]
struct ArrayFrame {
    element_type: ValueType,
    length: u64,
    written: u64,
}

/// Streaming writer.
pub struct StreamWriter<W: Write> {
    sink: Option<Output<W>>,
    out: ByteWriter,
    header: Header,
    config: WriterConfig,
    strings: StringTable,
    elements: Vec<OpenElement>,
    namespaces: NamespaceContext,
    pending_namespaces: Vec<(Rc<str>, Rc<str>)>,
    schema_locations: Vec<(String, String)>,
    string_ref_attributes: FastHashSet<Rc<str>>,
    attribute: Option<OpenAttribute>,
    array: Option<ArrayFrame>,
    body_start: u64,
    ended: bool,
}

impl<W: Write> StreamWriter<W> {
    /// Writes the header and returns a writer positioned at the body start.
    pub fn new(inner: W, options: EncodingOptions) -> Result<Self> {
        Self::with_config(inner, options, WriterConfig::default())
    }

    pub fn with_config(mut inner: W, options: EncodingOptions, config: WriterConfig) -> Result<Self> {
        let header = Header::new(options, config.random_access_index());
        let bytes = header.encode()?;
        inner.write_all(&bytes)?;
        let body_start = bytes.len() as u64;
        let opts = header.options();
        let out = ByteWriter::with_base(body_start, opts.byte_order(), opts.charset());
        let sink = Output::new(inner, opts.compression());
        let string_ref_attributes = config
            .string_table_attributes()
            .iter()
            .map(|n| Rc::from(n.as_str()))
            .collect();
        Ok(Self {
            sink: Some(sink),
            out,
            header,
            config,
            strings: StringTable::new(),
            elements: Vec::new(),
            namespaces: NamespaceContext::new(),
            pending_namespaces: Vec::new(),
            schema_locations: Vec::new(),
            string_ref_attributes,
            attribute: None,
            array: None,
            body_start,
            ended: false,
        })
    }

    // --- Getter ---

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn options(&self) -> &EncodingOptions {
        self.header.options()
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    pub fn string_table(&self) -> &StringTable {
        &self.strings
    }

    /// Logical offset of the next token.
    pub fn position(&self) -> u64 {
        self.out.position()
    }

    /// Number of open elements.
    pub fn depth(&self) -> usize {
        self.elements.len()
    }

    /// True once `write_end_document` completed.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn is_closed(&self) -> bool {
        self.sink.is_none()
    }

    // --- Interne Helfer ---

    fn check_writable(&self) -> Result<()> {
        if self.sink.is_none() {
            return Err(Error::StreamClosed);
        }
        if self.ended {
            return Err(Error::DocumentClosed);
        }
        Ok(())
    }

    fn check_no_array(&self) -> Result<()> {
        if self.array.is_some() {
            return Err(Error::ArrayInProgress);
        }
        Ok(())
    }

    /// Encodes `s` in the stream charset before anything is written.
    fn encode_text<'a>(&self, s: &'a str) -> Result<Cow<'a, [u8]>> {
        self.out.charset().encode(s)
    }

    fn put_string_value(&mut self, encoded: &[u8]) -> Result<()> {
        self.out.write_u8(STRING_CODE);
        self.out.write_count(encoded.len() as u64)?;
        self.out.write_bytes(encoded);
        Ok(())
    }

    /// Index of `s`, emitting a StringTable token on first use.
    fn define_string(&mut self, s: &str) -> Result<usize> {
        if let Some(index) = self.strings.lookup(s) {
            return Ok(index);
        }
        let encoded = self.encode_text(s)?;
        let offset = self.out.position();
        self.out.write_token_type(TokenType::StringTable);
        self.out.write_count(1)?;
        self.out.write_count(encoded.len() as u64)?;
        self.out.write_bytes(&encoded);
        let index = self.strings.add(s, offset);
        trace!("string {index} '{s}' defined at {offset}");
        Ok(index)
    }

    fn patch_top(&mut self) -> Result<()> {
        if let Some(top) = self.elements.last() {
            self.out.patch_u8(top.offset, top.token() as u8)?;
        }
        Ok(())
    }

    /// Innermost element that still accepts attributes.
    fn attribute_target(&self) -> Result<&OpenElement> {
        let top = self.elements.last().ok_or(Error::NoOpenElement)?;
        if top.has_content || top.attributes_closed {
            return Err(Error::AttributeAfterContent);
        }
        Ok(top)
    }

    fn mark_attributes(&mut self) -> Result<()> {
        self.attribute_target()?;
        if let Some(top) = self.elements.last_mut() {
            if !top.has_attributes {
                top.has_attributes = true;
                self.patch_top()?;
            }
        }
        Ok(())
    }

    /// AttributeStart + name, then the value inline or as string reference.
    fn emit_attribute(&mut self, name: &str, value: &str, by_reference: bool) -> Result<()> {
        let name_index = self.define_string(name)?;
        let value_index = if by_reference { Some(self.define_string(value)?) } else { None };
        let encoded = if by_reference { None } else { Some(self.encode_text(value)?) };
        self.mark_attributes()?;
        self.out.write_token_type(TokenType::AttributeStart);
        self.out.write_count(name_index as u64)?;
        match (value_index, encoded) {
            (Some(index), _) => {
                self.out.write_token_type(TokenType::CharContentRef);
                self.out.write_count(index as u64)?;
            }
            (None, Some(encoded)) => {
                self.out.write_token_type(TokenType::CharContent);
                self.put_string_value(&encoded)?;
            }
            (None, None) => {}
        }
        Ok(())
    }

    fn flush_pending_namespaces(&mut self) -> Result<()> {
        for (prefix, uri) in std::mem::take(&mut self.pending_namespaces) {
            let name = if prefix.is_empty() {
                Cow::Borrowed(XMLNS_PREFIX)
            } else {
                Cow::Owned(format!("{XMLNS_PREFIX}:{prefix}"))
            };
            self.emit_attribute(&name, &uri, false)?;
        }
        Ok(())
    }

    /// Emits buffered schema locations as one `xsi:schemaLocation` attribute.
    fn flush_schema_locations(&mut self) -> Result<()> {
        if self.schema_locations.is_empty() {
            return Ok(());
        }
        let prefix = match self.namespaces.prefix_for(XSI_NS_URI, false) {
            Some(p) => p.to_string(),
            None => {
                self.namespaces.declare("xsi", XSI_NS_URI);
                self.pending_namespaces.push((Rc::from("xsi"), Rc::from(XSI_NS_URI)));
                "xsi".to_string()
            }
        };
        self.flush_pending_namespaces()?;
        let value = std::mem::take(&mut self.schema_locations)
            .into_iter()
            .map(|(ns, loc)| format!("{ns} {loc}"))
            .collect::<Vec<_>>()
            .join(" ");
        self.emit_attribute(&format!("{prefix}:schemaLocation"), &value, false)
    }

    /// Ends the attribute run of the innermost element (AttributeListEnd if any).
    fn close_attributes(&mut self) -> Result<()> {
        self.attribute = None;
        match self.elements.last() {
            Some(top) if !top.attributes_closed => {}
            _ => return Ok(()),
        }
        self.flush_pending_namespaces()?;
        self.flush_schema_locations()?;
        if let Some(top) = self.elements.last_mut() {
            if top.has_attributes {
                self.out.write_token_type(TokenType::AttributeListEnd);
            }
            top.attributes_closed = true;
        }
        Ok(())
    }

    /// Marks the innermost element as having content and fixes its tag byte.
    fn begin_content(&mut self) -> Result<()> {
        self.close_attributes()?;
        if let Some(top) = self.elements.last_mut() {
            if !top.has_content {
                top.has_content = true;
                self.patch_top()?;
            }
        }
        Ok(())
    }

    /// Lowest offset that may still be patched.
    fn flush_boundary(&self) -> u64 {
        match self.elements.last() {
            Some(top) if !top.has_content => top.offset,
            _ => self.out.position(),
        }
    }

    /// Drains resolved bytes once the window exceeds the threshold.
    fn maybe_flush(&mut self) -> Result<()> {
        if self.out.buffered_len() < self.config.flush_threshold() {
            return Ok(());
        }
        let boundary = self.flush_boundary();
        let sink = self.sink.as_mut().ok_or(Error::StreamClosed)?;
        self.out.drain_to(sink, boundary)?;
        trace!("flushed up to {boundary}");
        Ok(())
    }

    fn qualify(&self, uri: &str, local_name: &str, allow_default: bool) -> Result<String> {
        if !self.config.namespace_aware() || uri.is_empty() {
            return Ok(local_name.to_string());
        }
        match self.namespaces.prefix_for(uri, allow_default) {
            Some("") => Ok(local_name.to_string()),
            Some(prefix) => Ok(format!("{prefix}:{local_name}")),
            None => Err(Error::UnboundNamespace(uri.to_string())),
        }
    }

    // --- Dokument ---

    fn check_document_start(&self, what: &'static str) -> Result<()> {
        self.check_writable()?;
        if self.out.position() != self.body_start {
            return Err(Error::unexpected_event("empty body", what));
        }
        Ok(())
    }

    /// Writes an XmlDeclaration for version 1.0. Must be the first body token.
    pub fn write_start_document(&mut self) -> Result<()> {
        self.write_xml_declaration("1.0", None)
    }

    /// Writes an XmlDeclaration. Must be the first body token.
    pub fn write_xml_declaration(&mut self, version: &str, standalone: Option<bool>) -> Result<()> {
        self.check_document_start("START_DOCUMENT")?;
        let encoded = self.encode_text(version)?;
        self.out.write_token_type(TokenType::XmlDeclaration);
        self.out.write_count(encoded.len() as u64)?;
        self.out.write_bytes(&encoded);
        self.out.write_bool(standalone.unwrap_or(false));
        self.out.write_bool(standalone.is_some());
        Ok(())
    }

    /// Closes open elements, appends the trailer and flushes everything.
    pub fn write_end_document(&mut self) -> Result<()> {
        self.check_writable()?;
        self.check_no_array()?;
        while !self.elements.is_empty() {
            self.write_end_element()?;
        }
        let trailer = if self.config.random_access_index() {
            Trailer::from_string_table(&self.strings)
        } else {
            Trailer::empty()
        };
        trailer.encode(&mut self.out)?;
        let sink = self.sink.as_mut().ok_or(Error::StreamClosed)?;
        self.out.drain_all(sink)?;
        sink.finish()?;
        self.ended = true;
        debug!(
            "document ended: {} bytes, {} strings, {} trailer fragments",
            self.out.position(),
            self.strings.len(),
            trailer.fragments().len()
        );
        Ok(())
    }

    // --- Elemente ---

    fn start_element(&mut self, name: &str) -> Result<()> {
        self.check_writable()?;
        self.check_no_array()?;
        self.begin_content()?;
        let index = self.define_string(name)?;
        self.namespaces.push_scope();
        let offset = self.out.position();
        self.out.write_token_type(TokenType::EmptyElement);
        self.out.write_count(index as u64)?;
        self.elements.push(OpenElement {
            offset,
            name: Rc::from(name),
            has_attributes: false,
            has_content: false,
            attributes_closed: false,
        });
        self.maybe_flush()
    }

    /// Starts an element named by its qualified text (`local` or `prefix:local`).
    pub fn write_start_element(&mut self, name: &str) -> Result<()> {
        self.start_element(name)
    }

    /// Starts an element in namespace `uri`, using the prefix bound to it.
    ///
    /// In namespace-aware mode an unbound URI fails with
    /// [`Error::UnboundNamespace`]; bind it first with [`set_prefix`](Self::set_prefix).
    pub fn write_start_element_ns(&mut self, uri: &str, local_name: &str) -> Result<()> {
        let name = self.qualify(uri, local_name, true)?;
        self.start_element(&name)
    }

    /// Starts an element with an explicit prefix.
    pub fn write_start_element_with_prefix(&mut self, prefix: &str, local_name: &str, _uri: &str) -> Result<()> {
        if prefix.is_empty() {
            self.start_element(local_name)
        } else {
            self.start_element(&format!("{prefix}:{local_name}"))
        }
    }

    /// Closes the innermost element (ElementEnd only for content elements).
    pub fn write_end_element(&mut self) -> Result<()> {
        self.check_writable()?;
        self.check_no_array()?;
        if self.elements.is_empty() {
            return Err(Error::NoOpenElement);
        }
        self.close_attributes()?;
        let element = self.elements.pop().ok_or(Error::NoOpenElement)?;
        if element.has_content {
            self.out.write_token_type(TokenType::ElementEnd);
        }
        trace!("end {} as {}", element.name, element.token());
        self.namespaces.pop_scope();
        self.maybe_flush()
    }

    // --- Namespaces ---

    /// Declares `prefix` (empty or `xmlns` = default namespace) on the current element.
    pub fn write_namespace(&mut self, prefix: &str, uri: &str) -> Result<()> {
        self.check_writable()?;
        self.check_no_array()?;
        let has_attributes = self.attribute_target()?.has_attributes;
        let prefix = if prefix == XMLNS_PREFIX { "" } else { prefix };
        self.namespaces.declare(prefix, uri);
        self.pending_namespaces.push((Rc::from(prefix), Rc::from(uri)));
        if has_attributes {
            self.attribute = None;
            self.flush_pending_namespaces()?;
        }
        Ok(())
    }

    pub fn write_default_namespace(&mut self, uri: &str) -> Result<()> {
        self.write_namespace("", uri)
    }

    /// Binds `prefix` to `uri` for name resolution without writing a declaration.
    pub fn set_prefix(&mut self, prefix: &str, uri: &str) {
        self.namespaces.declare(prefix, uri);
    }

    pub fn set_default_namespace(&mut self, uri: &str) {
        self.namespaces.declare("", uri);
    }

    /// Prefix currently bound to `uri`.
    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.namespaces.prefix_for(uri, true)
    }

    /// Buffers a (namespace, location) pair for the `xsi:schemaLocation`
    /// attribute of the current element.
    pub fn write_schema_location(&mut self, namespace: &str, location: &str) -> Result<()> {
        self.check_writable()?;
        self.attribute_target()?;
        self.schema_locations.push((namespace.to_string(), location.to_string()));
        Ok(())
    }

    // --- Attribute ---

    /// Routes values of attribute `name` (qualified text) through the string table.
    pub fn register_string_table_attribute(&mut self, name: &str) {
        self.string_ref_attributes.insert(Rc::from(name));
    }

    fn attribute(&mut self, name: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        self.check_no_array()?;
        self.attribute = None;
        self.attribute_target()?;
        self.flush_pending_namespaces()?;
        let by_reference = self.string_ref_attributes.contains(name);
        self.emit_attribute(name, value, by_reference)?;
        self.maybe_flush()
    }

    /// Writes a complete attribute with a string value.
    pub fn write_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        self.attribute(name, value)
    }

    /// Attribute in namespace `uri` (never the default namespace).
    pub fn write_attribute_ns(&mut self, uri: &str, local_name: &str, value: &str) -> Result<()> {
        let name = self.qualify(uri, local_name, false)?;
        self.attribute(&name, value)
    }

    pub fn write_attribute_with_prefix(
        &mut self,
        prefix: &str,
        local_name: &str,
        _uri: &str,
        value: &str,
    ) -> Result<()> {
        if prefix.is_empty() {
            self.attribute(local_name, value)
        } else {
            self.attribute(&format!("{prefix}:{local_name}"), value)
        }
    }

    /// Opens an attribute whose value is built by the following value writes
    /// (`write_value`, `write_string_value`, arrays). It ends with the next
    /// attribute, `write_end_attributes` or any content.
    pub fn write_start_attribute(&mut self, name: &str) -> Result<()> {
        self.check_writable()?;
        self.check_no_array()?;
        self.attribute = None;
        self.attribute_target()?;
        self.flush_pending_namespaces()?;
        let by_reference = self.string_ref_attributes.contains(name);
        let index = self.define_string(name)?;
        self.mark_attributes()?;
        self.out.write_token_type(TokenType::AttributeStart);
        self.out.write_count(index as u64)?;
        self.attribute = Some(OpenAttribute { by_reference });
        Ok(())
    }

    /// Ends the attribute list of the current element.
    pub fn write_end_attributes(&mut self) -> Result<()> {
        self.check_writable()?;
        self.check_no_array()?;
        self.close_attributes()
    }

    // --- Sonstiger Inhalt ---

    pub fn write_comment(&mut self, text: &str) -> Result<()> {
        self.check_writable()?;
        self.check_no_array()?;
        let encoded = self.encode_text(text)?;
        self.begin_content()?;
        self.out.write_token_type(TokenType::Comment);
        self.out.write_u8(0);
        self.put_string_value(&encoded)?;
        self.maybe_flush()
    }

    /// Writes ignorable whitespace; its line-break count is stored alongside.
    pub fn write_space(&mut self, text: &str) -> Result<()> {
        self.check_writable()?;
        self.check_no_array()?;
        let encoded = self.encode_text(text)?;
        self.begin_content()?;
        let lines = text.bytes().filter(|&b| b == b'\n').count();
        self.out.write_token_type(TokenType::Whitespace);
        self.out.write_count(lines as u64)?;
        self.put_string_value(&encoded)?;
        self.maybe_flush()
    }

    pub fn write_cdata(&mut self, text: &str) -> Result<()> {
        self.check_writable()?;
        self.check_no_array()?;
        let encoded = self.encode_text(text)?;
        self.begin_content()?;
        self.out.write_token_type(TokenType::CDataSection);
        self.put_string_value(&encoded)?;
        self.maybe_flush()
    }

    // --- Lebenszyklus ---

    /// Drains every resolved byte into the sink and flushes it.
    pub fn flush(&mut self) -> Result<()> {
        let boundary = self.flush_boundary();
        let sink = self.sink.as_mut().ok_or(Error::StreamClosed)?;
        self.out.drain_to(sink, boundary)?;
        sink.flush()?;
        Ok(())
    }

    /// Ends the document if still open and releases the sink. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if self.sink.is_none() {
            return Ok(());
        }
        let result = if self.ended { Ok(()) } else { self.write_end_document() };
        self.sink = None;
        debug!("writer closed");
        result
    }

    /// Ends the document if still open and returns the sink.
    pub fn into_inner(mut self) -> Result<W> {
        if !self.ended {
            self.write_end_document()?;
        }
        let sink = self.sink.take().ok_or(Error::StreamClosed)?;
        Ok(sink.into_inner()?)
    }
}

impl<W: Write> Drop for StreamWriter<W> {
    fn drop(&mut self) {
        if self.sink.is_some() && !self.ended {
            warn!(
                "StreamWriter dropped at depth {} without write_end_document; output is incomplete",
                self.elements.len()
            );
        }
    }
}

impl<W: Write> std::fmt::Debug for StreamWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamWriter")
            .field("header", &self.header)
            .field("position", &self.out.position())
            .field("depth", &self.elements.len())
            .field("strings", &self.strings.len())
            .field("ended", &self.ended)
            .field("closed", &self.sink.is_none())
            .finish()
    }
}
