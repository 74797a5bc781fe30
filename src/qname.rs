//! Qualified names.
//!
//! On the wire names are string-table entries holding the qualified text
//! (`prefix:local` or `local`). A [`QName`] is the resolved form: namespace
//! URI, local name and the optional prefix it was written with.
//!
//! Two QNames are equal when URI and local name are equal, regardless of
//! their prefix.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Namespace-qualified name.
#[derive(Debug, Clone)]
pub struct QName {
    pub uri: Rc<str>,
    pub local_name: Rc<str>,
    pub prefix: Option<Rc<str>>,
}

impl QName {
    /// Erstellt einen QName ohne Prefix.
    pub fn new(uri: &str, local_name: &str) -> Self {
        Self { uri: Rc::from(uri), local_name: Rc::from(local_name), prefix: None }
    }

    /// Erstellt einen QName mit Prefix (leerer Prefix = kein Prefix).
    pub fn with_prefix(uri: &str, local_name: &str, prefix: &str) -> Self {
        let prefix = (!prefix.is_empty()).then(|| Rc::from(prefix));
        Self { uri: Rc::from(uri), local_name: Rc::from(local_name), prefix }
    }

    /// Name without namespace.
    pub fn local(local_name: &str) -> Self {
        Self::new("", local_name)
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Text stored in the string table: `prefix:local` or `local`.
    pub fn qualified_name(&self) -> Cow<'_, str> {
        match self.prefix() {
            Some(p) => Cow::Owned(format!("{p}:{}", self.local_name)),
            None => Cow::Borrowed(&self.local_name),
        }
    }
}

/// Splits qualified text into `(prefix, local)`.
///
/// A leading or trailing colon is not treated as a separator.
pub fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.find(':') {
        Some(i) if i > 0 && i + 1 < name.len() => (Some(&name[..i]), &name[i + 1..]),
        _ => (None, name),
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri && self.local_name == other.local_name
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
        self.local_name.hash(state);
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.uri.is_empty() {
            f.write_str(&self.qualified_name())
        } else {
            write!(f, "{{{}}}{}", self.uri, self.qualified_name())
        }
    }
}
