//! Reader configuration.

/// Default capacity of the read buffer in front of the source.
pub const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;

/// Options of [`StreamReader`](super::StreamReader) that are not part of the stream header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    pub(crate) namespace_aware: bool,
    pub(crate) buffer_capacity: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self { namespace_aware: true, buffer_capacity: DEFAULT_BUFFER_CAPACITY }
    }
}

impl ReaderConfig {
    /// `xmlns` attributes become namespace declarations and prefixes resolve to URIs.
    pub fn namespace_aware(&self) -> bool { self.namespace_aware }

    pub fn buffer_capacity(&self) -> usize { self.buffer_capacity }

    pub fn with_namespace_aware(mut self, val: bool) -> Self { self.namespace_aware = val; self }

    /// Kapazität des Lesepuffers (mindestens 1).
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(1);
        self
    }
}
