//! Event-type worker chain.
//!
//! One worker per token kind. A worker is selected by [`Worker::for_token`]
//! once its token byte has been read, consumes its own payload in
//! [`init`](Worker::init) and moves to the following event in
//! [`next`](Worker::next). Binary tokens and pull events are not 1:1:
//!
//! - StringTable tokens are consumed transparently and never become current.
//! - Attributed start elements drain their AttributeStart run in `init`.
//! - Empty elements answer their next `next()` with a synthetic END_ELEMENT
//!   without touching the stream.
//! - START_DOCUMENT is synthesized whether or not an XmlDeclaration exists.
//!
//! The default `next` skips whatever the caller left unread of the current
//! value by width arithmetic, then reads and dispatches the next token.

use std::fmt::Write as _;
use std::io::Read;
use std::rc::Rc;

use log::trace;

use super::state::{OpenElement, ParseState, PendingAttribute, ValueState};
use crate::event::EventType;
use crate::io::ByteReader;
use crate::namespace::XMLNS_PREFIX;
use crate::qname::{split_qualified, QName};
use crate::token::TokenType;
use crate::trailer::Trailer;
use crate::value::Scalar;
use crate::value_type::ValueType;
use crate::{Error, Result};

/// Reader state machine node; the current variant answers `event_type()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Worker {
    /// Before the first `next()`.
    Initial,
    StartDocument,
    StringTable,
    EmptyElement,
    EmptyAttrElement,
    ContentElement,
    ContentAttrElement,
    /// END_ELEMENT of an Empty* element, produced without a token.
    SyntheticEnd,
    ElementEnd,
    /// Carries the VALUE_* event derived from the value type.
    CharContent(EventType),
    CharContentRef,
    CData,
    Comment,
    Whitespace,
    EndDocument,
}

impl Worker {
    /// Worker for a token that was just read.
    pub(crate) fn for_token(token: TokenType) -> Result<Self> {
        Ok(match token {
            TokenType::StringTable => Self::StringTable,
            TokenType::EmptyElement => Self::EmptyElement,
            TokenType::EmptyAttrElement => Self::EmptyAttrElement,
            TokenType::ContentElement => Self::ContentElement,
            TokenType::ContentAttrElement => Self::ContentAttrElement,
            TokenType::ElementEnd => Self::ElementEnd,
            TokenType::CharContent => Self::CharContent(EventType::ValueString),
            TokenType::CharContentRef => Self::CharContentRef,
            TokenType::CDataSection => Self::CData,
            TokenType::Comment => Self::Comment,
            TokenType::Whitespace => Self::Whitespace,
            TokenType::Trailer => Self::EndDocument,
            TokenType::XmlDeclaration | TokenType::AttributeStart | TokenType::AttributeListEnd => {
                return Err(Error::unexpected_token("content token", token.name()));
            }
            TokenType::ProcessingInstr | TokenType::CharEntityRef | TokenType::EntityRef => {
                return Err(Error::UnsupportedToken(token.name()));
            }
        })
    }

    pub(crate) fn event_type(self) -> EventType {
        match self {
            Self::Initial | Self::StringTable => EventType::None,
            Self::StartDocument => EventType::StartDocument,
            Self::EmptyElement | Self::EmptyAttrElement | Self::ContentElement | Self::ContentAttrElement => {
                EventType::StartElement
            }
            Self::SyntheticEnd | Self::ElementEnd => EventType::EndElement,
            Self::CharContent(event) => event,
            Self::CharContentRef => EventType::ValueString,
            Self::CData => EventType::ValueCdata,
            Self::Comment => EventType::Comment,
            Self::Whitespace => EventType::Space,
            Self::EndDocument => EventType::EndDocument,
        }
    }

    /// Consumes this worker's token payload and returns the worker for `event_type`.
    pub(crate) fn init<R: Read>(self, stream: &mut ByteReader<R>, state: &mut ParseState) -> Result<Self> {
        match self {
            Self::StringTable => {
                let offset = state.token_position;
                read_string_table(stream, state, offset)?;
                Ok(self)
            }
            Self::EmptyElement | Self::EmptyAttrElement | Self::ContentElement | Self::ContentAttrElement => {
                start_element(stream, state)?;
                Ok(self)
            }
            Self::ElementEnd => {
                end_element(state)?;
                Ok(self)
            }
            Self::CharContent(_) => {
                let value = read_value_header(stream)?;
                let event = value.value_type.event_type();
                state.value = Some(value);
                Ok(Self::CharContent(event))
            }
            Self::CharContentRef => {
                let s = string_ref(stream, state)?;
                state.value = Some(ValueState::reference(s));
                Ok(self)
            }
            Self::CData => {
                state.value = Some(read_value_header(stream)?);
                Ok(self)
            }
            Self::Comment => {
                state.comment_hint = stream.read_u8()?;
                state.value = Some(read_value_header(stream)?);
                Ok(self)
            }
            Self::Whitespace => {
                state.whitespace_lines = stream.read_count()?;
                state.value = Some(read_value_header(stream)?);
                Ok(self)
            }
            Self::EndDocument => {
                let trailer = Trailer::decode_body(stream, state.token_position)?;
                state.trailer = Some(trailer);
                Ok(self)
            }
            Self::Initial | Self::StartDocument | Self::SyntheticEnd => {
                Err(Error::InternalState("worker without token payload"))
            }
        }
    }

    /// Advances past the current event.
    pub(crate) fn next<R: Read>(self, stream: &mut ByteReader<R>, state: &mut ParseState) -> Result<Self> {
        match self {
            Self::Initial => start_document(stream, state),
            Self::StartDocument => {
                state.clear_event();
                match state.pending_token.take() {
                    Some((token, position)) => dispatch(stream, state, token, position),
                    None => read_next(stream, state),
                }
            }
            Self::EmptyElement | Self::EmptyAttrElement => {
                state.clear_event();
                end_element(state)?;
                Ok(Self::SyntheticEnd)
            }
            Self::EndDocument => Err(Error::NoMoreEvents),
            Self::StringTable => Err(Error::InternalState("string table worker is never current")),
            _ => advance(stream, state),
        }
    }
}

// ============================================================================
// Transitions
// ============================================================================

/// Default `next`: skip the unread value, then read and dispatch the next token.
fn advance<R: Read>(stream: &mut ByteReader<R>, state: &mut ParseState) -> Result<Worker> {
    skip_unread_value(stream, state)?;
    state.clear_event();
    read_next(stream, state)
}

pub(crate) fn read_next<R: Read>(stream: &mut ByteReader<R>, state: &mut ParseState) -> Result<Worker> {
    let position = stream.position();
    let token = stream.read_token_type()?;
    dispatch(stream, state, token, position)
}

/// Initializes the worker of `token`, looping over interleaved StringTable tokens.
fn dispatch<R: Read>(
    stream: &mut ByteReader<R>,
    state: &mut ParseState,
    mut token: TokenType,
    mut position: u64,
) -> Result<Worker> {
    loop {
        state.token = Some(token);
        state.token_position = position;
        let worker = Worker::for_token(token)?.init(stream, state)?;
        if worker != Worker::StringTable {
            return Ok(worker);
        }
        position = stream.position();
        token = stream.read_token_type()?;
    }
}

/// NONE → START_DOCUMENT. Reads the XmlDeclaration if it is the first token,
/// otherwise keeps the token for the following `next()`.
fn start_document<R: Read>(stream: &mut ByteReader<R>, state: &mut ParseState) -> Result<Worker> {
    let position = stream.position();
    let token = stream.read_token_type()?;
    if token == TokenType::XmlDeclaration {
        state.token = Some(token);
        state.token_position = position;
        state.xml_version = Some(stream.read_string()?);
        state.standalone = stream.read_bool()?;
        state.standalone_set = stream.read_bool()?;
    } else {
        state.pending_token = Some((token, position));
    }
    Ok(Worker::StartDocument)
}

/// Walks the prolog from the current position and returns the offset of the
/// root element's tag. `None` if anything but declaration, string tables,
/// comments and whitespace comes first.
pub(crate) fn root_element_offset<R: Read>(stream: &mut ByteReader<R>) -> Result<Option<u64>> {
    loop {
        let position = stream.position();
        match stream.read_token_type()? {
            TokenType::XmlDeclaration => {
                stream.skip_string()?;
                stream.skip(2)?;
            }
            TokenType::StringTable => {
                for _ in 0..stream.read_count()? {
                    stream.skip_string()?;
                }
            }
            TokenType::Comment => {
                stream.skip(1)?;
                let value = read_value_header(stream)?;
                stream.skip_values(value.value_type, value.length)?;
            }
            TokenType::Whitespace => {
                stream.read_count()?;
                let value = read_value_header(stream)?;
                stream.skip_values(value.value_type, value.length)?;
            }
            token if token.is_start_element() => return Ok(Some(position)),
            _ => return Ok(None),
        }
    }
}

fn skip_unread_value<R: Read>(stream: &mut ByteReader<R>, state: &mut ParseState) -> Result<()> {
    if let Some(value) = state.value.as_mut() {
        let remaining = value.remaining();
        if value.resolved.is_none() && remaining > 0 {
            stream.skip_values(value.value_type, remaining)?;
        }
        value.read = value.length;
    }
    Ok(())
}

// ============================================================================
// Payload helpers
// ============================================================================

fn read_string_table<R: Read>(stream: &mut ByteReader<R>, state: &mut ParseState, offset: u64) -> Result<()> {
    let n = stream.read_count()?;
    for _ in 0..n {
        let s = stream.read_string()?;
        state.strings.add(&s, offset);
    }
    trace!("string table at {offset}: {n} strings, {} total", state.strings.len());
    Ok(())
}

/// Reads a Count string index and resolves it.
fn string_ref<R: Read>(stream: &mut ByteReader<R>, state: &ParseState) -> Result<Rc<str>> {
    let index = stream.read_count()?;
    let len = state.strings.len();
    let index = usize::try_from(index).map_err(|_| Error::InvalidStringIndex { index, len })?;
    state.strings.get_rc(index).cloned()
}

/// Reads a value type byte and, for arrays, element type and length.
fn read_value_header<R: Read>(stream: &mut ByteReader<R>) -> Result<ValueState> {
    let value_type = stream.read_value_type()?;
    if value_type != ValueType::Array {
        return Ok(ValueState::scalar(value_type));
    }
    let element = stream.read_value_type()?;
    if !element.is_array_element() {
        return Err(Error::InvalidArrayElementType(element.name()));
    }
    let length = stream.read_count()?;
    Ok(ValueState::array(element, length))
}

/// Appends the textual form of one CharContent value (arrays space-separated).
fn append_value_text<R: Read>(stream: &mut ByteReader<R>, out: &mut String) -> Result<()> {
    let header = read_value_header(stream)?;
    for i in 0..header.length {
        if i > 0 {
            out.push(' ');
        }
        let scalar = Scalar::read(stream, header.value_type)?;
        let _ = write!(out, "{scalar}");
    }
    Ok(())
}

/// `xmlns` → `""`, `xmlns:p` → `"p"`.
fn xmlns_prefix(name: &str) -> Option<&str> {
    match split_qualified(name) {
        (None, XMLNS_PREFIX) => Some(""),
        (Some(XMLNS_PREFIX), prefix) => Some(prefix),
        _ => None,
    }
}

fn resolve_name(state: &ParseState, raw: &str, is_element: bool) -> Result<QName> {
    let (prefix, local) = split_qualified(raw);
    if !state.namespace_aware {
        return Ok(QName::with_prefix("", local, prefix.unwrap_or("")));
    }
    let uri = match prefix {
        Some(p) => match state.namespaces.resolve_prefix(p) {
            Some(uri) => uri,
            // Nach einem Seek fehlen die Deklarationen der Vorfahren.
            None if state.resynced => "",
            None => return Err(Error::UnboundPrefix(p.to_string())),
        },
        None if is_element => state.namespaces.resolve_prefix("").unwrap_or(""),
        None => "",
    };
    Ok(QName::with_prefix(uri, local, prefix.unwrap_or("")))
}

/// Drains AttributeStart tokens up to AttributeListEnd, coalescing values.
fn read_attribute_run<R: Read>(
    stream: &mut ByteReader<R>,
    state: &mut ParseState,
    out: &mut Vec<(Rc<str>, String)>,
) -> Result<()> {
    loop {
        let position = stream.position();
        let token = stream.read_token_type()?;
        match token {
            TokenType::StringTable => read_string_table(stream, state, position)?,
            TokenType::AttributeStart => {
                let name = string_ref(stream, state)?;
                out.push((name, String::new()));
            }
            TokenType::CharContent => {
                let (_, value) = out
                    .last_mut()
                    .ok_or_else(|| Error::unexpected_token("AttributeStart", token.name()))?;
                append_value_text(stream, value)?;
            }
            TokenType::CharContentRef => {
                let s = string_ref(stream, state)?;
                let (_, value) = out
                    .last_mut()
                    .ok_or_else(|| Error::unexpected_token("AttributeStart", token.name()))?;
                value.push_str(&s);
            }
            TokenType::AttributeListEnd => return Ok(()),
            other => return Err(Error::unexpected_token("attribute token", other.name())),
        }
    }
}

fn start_element<R: Read>(stream: &mut ByteReader<R>, state: &mut ParseState) -> Result<()> {
    let token = state.token.ok_or(Error::InternalState("start element without token"))?;
    let offset = state.token_position;
    let raw_name = string_ref(stream, state)?;

    let mut raw_attributes = Vec::new();
    if token.has_attributes() {
        read_attribute_run(stream, state, &mut raw_attributes)?;
    }

    if state.namespace_aware {
        state.namespaces.push_scope();
        for (name, value) in &raw_attributes {
            if let Some(prefix) = xmlns_prefix(name) {
                state.namespaces.declare(prefix, value);
                state.declared.push((Rc::from(prefix), Rc::from(value.as_str())));
            }
        }
    }

    let name = Rc::new(resolve_name(state, &raw_name, true)?);
    for (raw, value) in raw_attributes {
        if state.namespace_aware && xmlns_prefix(&raw).is_some() {
            continue;
        }
        let attr_name = Rc::new(resolve_name(state, &raw, false)?);
        state.attributes.push(PendingAttribute { name: attr_name, value: Rc::from(value) });
    }

    state.elements.push(OpenElement { name: Rc::clone(&name), offset });
    state.current_name = Some(name);
    Ok(())
}

/// Pops the innermost element for END_ELEMENT.
fn end_element(state: &mut ParseState) -> Result<()> {
    let name = state.elements.pop().map(|e| Rc::clone(&e.name));
    match name {
        Some(name) => {
            if state.namespace_aware {
                state.namespaces.pop_scope();
            }
            state.current_name = Some(name);
        }
        // Nach einem Seek ist der öffnende Tag unbekannt.
        None if state.resynced => state.current_name = None,
        None => return Err(Error::unexpected_token("open element", TokenType::ElementEnd.name())),
    }
    Ok(())
}
