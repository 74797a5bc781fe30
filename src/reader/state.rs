//! Parse state shared by the worker chain.
//!
//! Holds everything a worker reads or mutates: current token and its
//! offset, the current value's framing, the open-element stack, the
//! attributes and namespace declarations of the current start element, the
//! string table and document-level facts.

use std::rc::Rc;

use crate::event::EventType;
use crate::namespace::NamespaceContext;
use crate::qname::QName;
use crate::string_table::StringTable;
use crate::token::TokenType;
use crate::trailer::Trailer;
use crate::value_type::ValueType;
use crate::{Error, Result};

/// Framing of the value of the current event.
#[derive(Debug, Clone)]
pub(crate) struct ValueState {
    /// Encoded item type (element type for arrays).
    pub value_type: ValueType,
    pub is_array: bool,
    /// Declared item count (1 for scalars).
    pub length: u64,
    /// Items consumed by the caller so far.
    pub read: u64,
    /// String already resolved through the string table (no stream bytes).
    pub resolved: Option<Rc<str>>,
}

impl ValueState {
    pub fn scalar(value_type: ValueType) -> Self {
        Self { value_type, is_array: false, length: 1, read: 0, resolved: None }
    }

    pub fn array(element_type: ValueType, length: u64) -> Self {
        Self { value_type: element_type, is_array: true, length, read: 0, resolved: None }
    }

    pub fn reference(s: Rc<str>) -> Self {
        Self { value_type: ValueType::String, is_array: false, length: 1, read: 0, resolved: Some(s) }
    }

    pub fn remaining(&self) -> u64 {
        self.length - self.read
    }

    /// Zählt `n` gelesene Elemente; Überlauf ist sofort ein Fehler.
    pub fn notify_read(&mut self, n: u64) -> Result<()> {
        let total = self.read.saturating_add(n);
        if total > self.length {
            return Err(Error::ValueReadOverflow { length: self.length, requested: total });
        }
        self.read = total;
        Ok(())
    }
}

/// One open element.
#[derive(Debug, Clone)]
pub(crate) struct OpenElement {
    pub name: Rc<QName>,
    /// Offset des Start-Tags.
    pub offset: u64,
}

/// Arena of open elements indexed by depth.
///
/// Slots above `depth` are kept for reuse; push overwrites, pop only moves
/// the depth marker.
#[derive(Debug, Default)]
pub(crate) struct ElementStack {
    slots: Vec<OpenElement>,
    depth: usize,
}

impl ElementStack {
    pub fn push(&mut self, element: OpenElement) {
        if self.depth < self.slots.len() {
            self.slots[self.depth] = element;
        } else {
            self.slots.push(element);
        }
        self.depth += 1;
    }

    /// Pops the innermost element; `None` on an empty stack.
    pub fn pop(&mut self) -> Option<&OpenElement> {
        if self.depth == 0 {
            return None;
        }
        self.depth -= 1;
        self.slots.get(self.depth)
    }

    pub fn top(&self) -> Option<&OpenElement> {
        self.depth.checked_sub(1).and_then(|i| self.slots.get(i))
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.depth = 0;
    }

    #[cfg(test)]
    pub fn capacity_used(&self) -> usize {
        self.slots.len()
    }
}

/// Attribute of the current start element, value already coalesced.
#[derive(Debug, Clone)]
pub(crate) struct PendingAttribute {
    pub name: Rc<QName>,
    pub value: Rc<str>,
}

/// Mutable context of one reader.
#[derive(Debug, Default)]
pub(crate) struct ParseState {
    /// Current token type (`None` before the first token).
    pub token: Option<TokenType>,
    pub token_position: u64,
    /// Token read ahead while synthesizing START_DOCUMENT.
    pub pending_token: Option<(TokenType, u64)>,
    pub value: Option<ValueState>,
    pub elements: ElementStack,
    /// Name reported by the current START/END_ELEMENT.
    pub current_name: Option<Rc<QName>>,
    pub attributes: Vec<PendingAttribute>,
    /// Namespace declarations of the current start element.
    pub declared: Vec<(Rc<str>, Rc<str>)>,
    pub namespaces: NamespaceContext,
    pub namespace_aware: bool,
    /// Set after a seek past the root element: the open ancestors and
    /// their namespace declarations are unknown.
    pub resynced: bool,
    pub strings: StringTable,
    pub xml_version: Option<String>,
    pub standalone: bool,
    pub standalone_set: bool,
    pub comment_hint: u8,
    pub whitespace_lines: u64,
    pub trailer: Option<Trailer>,
}

impl ParseState {
    pub fn new(namespace_aware: bool) -> Self {
        Self { namespace_aware, ..Self::default() }
    }

    /// Counts value items consumed by the caller.
    pub fn notify_value_read(&mut self, n: u64, event: EventType) -> Result<()> {
        match self.value.as_mut() {
            Some(value) => value.notify_read(n),
            None => Err(Error::NotAValueEvent(event.name())),
        }
    }

    /// Per-event data that does not survive `next()`.
    pub fn clear_event(&mut self) {
        self.value = None;
        self.current_name = None;
        self.attributes.clear();
        self.declared.clear();
    }

    /// Forgets all structural context; required after a seek.
    pub fn invalidate(&mut self) {
        self.clear_event();
        self.elements.clear();
        self.namespaces.reset();
        self.pending_token = None;
        self.resynced = true;
    }
}
