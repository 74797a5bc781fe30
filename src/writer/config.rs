//! Writer configuration.

/// Schwellenwert für periodisches Flushing.
/// 64 KB als Kompromiss zwischen IO-Systemcalls (nicht pro Event) und Speicherbegrenzung.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 64 * 1024;

/// Writer-Konfiguration (nicht Teil des Stream-Headers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    pub(crate) namespace_aware: bool,
    pub(crate) random_access_index: bool,
    pub(crate) flush_threshold: usize,
    pub(crate) string_table_attributes: Vec<String>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            namespace_aware: true,
            random_access_index: true,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            string_table_attributes: Vec::new(),
        }
    }
}

impl WriterConfig {
    /// Namespace URIs passed to `*_ns` calls must be bound to a prefix.
    pub fn namespace_aware(&self) -> bool { self.namespace_aware }

    /// Trailer carries the string-table index for random access.
    pub fn random_access_index(&self) -> bool { self.random_access_index }

    pub fn flush_threshold(&self) -> usize { self.flush_threshold }

    /// Qualified attribute names whose values go through the string table.
    pub fn string_table_attributes(&self) -> &[String] { &self.string_table_attributes }

    pub fn with_namespace_aware(mut self, val: bool) -> Self { self.namespace_aware = val; self }

    pub fn with_random_access_index(mut self, val: bool) -> Self { self.random_access_index = val; self }

    pub fn with_flush_threshold(mut self, bytes: usize) -> Self { self.flush_threshold = bytes; self }

    /// Values of attribute `name` (qualified text, e.g. `"srsName"`) are written
    /// once into the string table and referenced afterwards.
    pub fn with_string_table_attribute(mut self, name: &str) -> Self {
        if !self.string_table_attributes.iter().any(|n| n == name) {
            self.string_table_attributes.push(name.to_string());
        }
        self
    }
}
