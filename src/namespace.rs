//! Prefix to URI bookkeeping with element scopes.
//!
//! One scope per open element. Declarations go into the innermost scope
//! and disappear with it. The `xml` prefix is always bound.

use std::rc::Rc;

pub const XML_PREFIX: &str = "xml";
pub const XML_NS_URI: &str = "http://www.w3.org/XML/1998/namespace";
pub const XMLNS_PREFIX: &str = "xmlns";
pub const XSI_NS_URI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Stack of namespace bindings.
#[derive(Debug, Clone, Default)]
pub struct NamespaceContext {
    bindings: Vec<(Rc<str>, Rc<str>)>,
    scopes: Vec<usize>,
}

impl NamespaceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a scope for a new element.
    pub fn push_scope(&mut self) {
        self.scopes.push(self.bindings.len());
    }

    /// Drops the innermost scope with all its bindings.
    pub fn pop_scope(&mut self) {
        if let Some(mark) = self.scopes.pop() {
            self.bindings.truncate(mark);
        }
    }

    /// Binds `prefix` (empty = default namespace) in the innermost scope.
    pub fn declare(&mut self, prefix: &str, uri: &str) {
        let start = self.scopes.last().copied().unwrap_or(0);
        if let Some(slot) = self.bindings[start..].iter_mut().find(|(p, _)| &**p == prefix) {
            slot.1 = Rc::from(uri);
        } else {
            self.bindings.push((Rc::from(prefix), Rc::from(uri)));
        }
    }

    /// URI bound to `prefix`. The unbound default namespace resolves to `""`.
    pub fn resolve_prefix(&self, prefix: &str) -> Option<&str> {
        if prefix == XML_PREFIX {
            return Some(XML_NS_URI);
        }
        match self.bindings.iter().rev().find(|(p, _)| &**p == prefix) {
            Some((_, uri)) => Some(&**uri),
            None if prefix.is_empty() => Some(""),
            None => None,
        }
    }

    /// Visible prefix bound to `uri`; the default namespace only if `allow_default`.
    pub fn prefix_for(&self, uri: &str, allow_default: bool) -> Option<&str> {
        if uri == XML_NS_URI {
            return Some(XML_PREFIX);
        }
        self.bindings
            .iter()
            .rev()
            .filter(|(p, u)| &**u == uri && (allow_default || !p.is_empty()))
            .map(|(p, _)| &**p)
            // Ein später gebundener gleicher Prefix verdeckt die Bindung.
            .find(|p| self.resolve_prefix(p) == Some(uri))
    }

    /// Bindings declared in the innermost scope, in declaration order.
    pub fn current_scope(&self) -> &[(Rc<str>, Rc<str>)] {
        let start = self.scopes.last().copied().unwrap_or(0);
        &self.bindings[start..]
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Vergisst alle Bindungen und Scopes.
    pub fn reset(&mut self) {
        self.bindings.clear();
        self.scopes.clear();
    }
}
