//! Token types: the one-byte markers that start every record in the body.

use std::fmt;

use crate::{Error, Result};

/// Closed set of binary token markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TokenType {
    EntityRef = 0xEE,
    Whitespace = 0xEF,
    StringTable = 0xF0,
    XmlDeclaration = 0xF1,
    Comment = 0xF2,
    ProcessingInstr = 0xF3,
    CharEntityRef = 0xF4,
    EmptyElement = 0xF5,
    EmptyAttrElement = 0xF6,
    ContentElement = 0xF7,
    ContentAttrElement = 0xF8,
    ElementEnd = 0xF9,
    AttributeStart = 0xFA,
    AttributeListEnd = 0xFB,
    CharContent = 0xFC,
    CharContentRef = 0xFD,
    CDataSection = 0xFE,
    Trailer = 0xFF,
}

impl TokenType {
    /// Decodes a token byte.
    pub fn from_u8(byte: u8) -> Result<Self> {
        Ok(match byte {
            0xEE => Self::EntityRef,
            0xEF => Self::Whitespace,
            0xF0 => Self::StringTable,
            0xF1 => Self::XmlDeclaration,
            0xF2 => Self::Comment,
            0xF3 => Self::ProcessingInstr,
            0xF4 => Self::CharEntityRef,
            0xF5 => Self::EmptyElement,
            0xF6 => Self::EmptyAttrElement,
            0xF7 => Self::ContentElement,
            0xF8 => Self::ContentAttrElement,
            0xF9 => Self::ElementEnd,
            0xFA => Self::AttributeStart,
            0xFB => Self::AttributeListEnd,
            0xFC => Self::CharContent,
            0xFD => Self::CharContentRef,
            0xFE => Self::CDataSection,
            0xFF => Self::Trailer,
            other => return Err(Error::InvalidTokenType(other)),
        })
    }

    /// Start-element token for the given attribute/content combination.
    pub fn element(has_attributes: bool, has_content: bool) -> Self {
        match (has_attributes, has_content) {
            (false, false) => Self::EmptyElement,
            (true, false) => Self::EmptyAttrElement,
            (false, true) => Self::ContentElement,
            (true, true) => Self::ContentAttrElement,
        }
    }

    pub fn is_start_element(self) -> bool {
        matches!(
            self,
            Self::EmptyElement | Self::EmptyAttrElement | Self::ContentElement | Self::ContentAttrElement
        )
    }

    /// Attribute run (AttributeStart* AttributeListEnd) follows.
    pub fn has_attributes(self) -> bool {
        matches!(self, Self::EmptyAttrElement | Self::ContentAttrElement)
    }

    /// Closed by an explicit ElementEnd.
    pub fn has_content(self) -> bool {
        matches!(self, Self::ContentElement | Self::ContentAttrElement)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::EntityRef => "EntityRef",
            Self::Whitespace => "Whitespace",
            Self::StringTable => "StringTable",
            Self::XmlDeclaration => "XmlDeclaration",
            Self::Comment => "Comment",
            Self::ProcessingInstr => "ProcessingInstr",
            Self::CharEntityRef => "CharEntityRef",
            Self::EmptyElement => "EmptyElement",
            Self::EmptyAttrElement => "EmptyAttrElement",
            Self::ContentElement => "ContentElement",
            Self::ContentAttrElement => "ContentAttrElement",
            Self::ElementEnd => "ElementEnd",
            Self::AttributeStart => "AttributeStart",
            Self::AttributeListEnd => "AttributeListEnd",
            Self::CharContent => "CharContent",
            Self::CharContentRef => "CharContentRef",
            Self::CDataSection => "CDataSection",
            Self::Trailer => "Trailer",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
