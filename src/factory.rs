//! Reader/writer construction with shared settings.
//!
//! A [`StreamFactory`] bundles the stream options (header level) with the
//! reader and writer configuration, so that every stream of an application
//! is created the same way. [`default_factory`] is a process-wide instance
//! with default settings.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::OnceLock;

use log::debug;

use crate::options::EncodingOptions;
use crate::reader::{ReaderConfig, StreamReader};
use crate::writer::{StreamWriter, WriterConfig};
use crate::Result;

/// Creates readers and writers from one set of options.
///
/// # Beispiel
///
/// ```
/// use bxml::factory::StreamFactory;
/// use bxml::writer::WriterConfig;
///
/// let factory = StreamFactory::new()
///     .with_writer_config(WriterConfig::default().with_string_table_attribute("srsName"));
/// let mut w = factory.create_writer(Vec::new()).unwrap();
/// w.write_start_element("pos").unwrap();
/// w.write_attribute("srsName", "EPSG:4326").unwrap();
/// let bytes = w.into_inner().unwrap();
///
/// let mut r = factory.create_reader(bytes.as_slice()).unwrap();
/// r.next_tag().unwrap();
/// assert_eq!(r.attribute_value(0).unwrap(), "EPSG:4326");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamFactory {
    options: EncodingOptions,
    reader_config: ReaderConfig,
    writer_config: WriterConfig,
}

impl StreamFactory {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Getter ---

    /// Options written into the header of new streams.
    pub fn options(&self) -> &EncodingOptions { &self.options }

    pub fn reader_config(&self) -> &ReaderConfig { &self.reader_config }

    pub fn writer_config(&self) -> &WriterConfig { &self.writer_config }

    // --- Builder ---

    pub fn with_options(mut self, options: EncodingOptions) -> Self { self.options = options; self }

    pub fn with_reader_config(mut self, config: ReaderConfig) -> Self { self.reader_config = config; self }

    pub fn with_writer_config(mut self, config: WriterConfig) -> Self { self.writer_config = config; self }

    // --- Streams ---

    /// Reader over any byte source; options come from the stream header.
    pub fn create_reader<R: Read>(&self, inner: R) -> Result<StreamReader<R>> {
        StreamReader::with_config(inner, self.reader_config.clone())
    }

    /// Writer into any sink; the header is written immediately.
    pub fn create_writer<W: Write>(&self, inner: W) -> Result<StreamWriter<W>> {
        StreamWriter::with_config(inner, self.options.clone(), self.writer_config.clone())
    }

    /// Opens a file for reading with random access enabled when the stream
    /// carries a trailer index, plain sequential access otherwise.
    pub fn open_reader(&self, path: impl AsRef<Path>) -> Result<StreamReader<File>> {
        let path = path.as_ref();
        let file = File::open(path)?;
        match StreamReader::with_random_access(file, self.reader_config.clone()) {
            Ok(reader) => Ok(reader),
            Err(crate::Error::RandomAccessUnsupported) => {
                debug!("{}: no trailer index, reading sequentially", path.display());
                StreamReader::with_config(File::open(path)?, self.reader_config.clone())
            }
            Err(e) => Err(e),
        }
    }

    /// Creates (or truncates) a file and returns a buffered writer on it.
    pub fn create_writer_file(&self, path: impl AsRef<Path>) -> Result<StreamWriter<BufWriter<File>>> {
        let file = File::create(path.as_ref())?;
        self.create_writer(BufWriter::new(file))
    }
}

/// Process-wide factory with default settings, created on first use.
pub fn default_factory() -> &'static StreamFactory {
    static DEFAULT: OnceLock<StreamFactory> = OnceLock::new();
    DEFAULT.get_or_init(StreamFactory::new)
}
