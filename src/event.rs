//! Event model.
//!
//! [`EventType`] is the vocabulary of the pull reader. [`Event`] is the owned
//! form used by the batch [`encode`](crate::writer::encode) /
//! [`decode`](crate::reader::decode) API.

use std::fmt;
use std::rc::Rc;

use crate::qname::QName;
use crate::value::Value;

/// Events reported by [`StreamReader`](crate::reader::StreamReader).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Before the first `next()`.
    None,
    StartDocument,
    EndDocument,
    StartElement,
    EndElement,
    Attribute,
    AttributesEnd,
    NamespaceDecl,
    Comment,
    Space,
    ValueBool,
    ValueByte,
    ValueInt,
    ValueLong,
    ValueFloat,
    ValueDouble,
    ValueString,
    ValueCdata,
}

impl EventType {
    /// START_ELEMENT or END_ELEMENT.
    pub fn is_tag(self) -> bool {
        matches!(self, Self::StartElement | Self::EndElement)
    }

    /// One of the VALUE_* events.
    pub fn is_value(self) -> bool {
        matches!(
            self,
            Self::ValueBool
                | Self::ValueByte
                | Self::ValueInt
                | Self::ValueLong
                | Self::ValueFloat
                | Self::ValueDouble
                | Self::ValueString
                | Self::ValueCdata
        )
    }

    /// Events whose payload is readable through the value accessors.
    pub fn carries_value(self) -> bool {
        self.is_value() || matches!(self, Self::Comment | Self::Space)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::StartDocument => "START_DOCUMENT",
            Self::EndDocument => "END_DOCUMENT",
            Self::StartElement => "START_ELEMENT",
            Self::EndElement => "END_ELEMENT",
            Self::Attribute => "ATTRIBUTE",
            Self::AttributesEnd => "ATTRIBUTES_END",
            Self::NamespaceDecl => "NAMESPACE_DECL",
            Self::Comment => "COMMENT",
            Self::Space => "SPACE",
            Self::ValueBool => "VALUE_BOOL",
            Self::ValueByte => "VALUE_BYTE",
            Self::ValueInt => "VALUE_INT",
            Self::ValueLong => "VALUE_LONG",
            Self::ValueFloat => "VALUE_FLOAT",
            Self::ValueDouble => "VALUE_DOUBLE",
            Self::ValueString => "VALUE_STRING",
            Self::ValueCdata => "VALUE_CDATA",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Namespace declaration attached to the preceding start element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsContent {
    /// Declared prefix, empty for the default namespace.
    pub prefix: Rc<str>,
    pub uri: Rc<str>,
}

/// Attribute attached to the preceding start element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtContent {
    pub qname: Rc<QName>,
    /// Coalesced textual value.
    pub value: Rc<str>,
}

/// Owned event for the batch API.
///
/// `Namespace` and `Attribute` events directly follow their `StartElement`,
/// namespaces first.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StartDocument,
    EndDocument,
    StartElement(Rc<QName>),
    EndElement,
    Namespace(NsContent),
    Attribute(AtContent),
    Value(Value),
    CData(Rc<str>),
    Comment(Rc<str>),
    Space(Rc<str>),
}

impl Event {
    /// Reader event type this event corresponds to.
    pub fn event_type(&self) -> EventType {
        match self {
            Self::StartDocument => EventType::StartDocument,
            Self::EndDocument => EventType::EndDocument,
            Self::StartElement(_) => EventType::StartElement,
            Self::EndElement => EventType::EndElement,
            Self::Namespace(_) => EventType::NamespaceDecl,
            Self::Attribute(_) => EventType::Attribute,
            Self::Value(v) => v.event_type(),
            Self::CData(_) => EventType::ValueCdata,
            Self::Comment(_) => EventType::Comment,
            Self::Space(_) => EventType::Space,
        }
    }

    /// Shortcut for an unqualified start element.
    pub fn start(local_name: &str) -> Self {
        Self::StartElement(Rc::new(QName::local(local_name)))
    }

    /// Shortcut for an unqualified attribute.
    pub fn attribute(local_name: &str, value: &str) -> Self {
        Self::Attribute(AtContent {
            qname: Rc::new(QName::local(local_name)),
            value: Rc::from(value),
        })
    }

    /// Shortcut for a namespace declaration.
    pub fn namespace(prefix: &str, uri: &str) -> Self {
        Self::Namespace(NsContent { prefix: Rc::from(prefix), uri: Rc::from(uri) })
    }
}
