//! Byte source behind the reader: buffered plain input or a gzip body.

use std::io::{self, BufReader, Read, Seek, SeekFrom};

use flate2::bufread::GzDecoder;

/// Plain or gzip-decompressed source.
///
/// The header is always read through `Plain`; a gzip stream switches to
/// `Gzip` right after it. Only `Plain` can seek.
pub(crate) enum Input<R> {
    Plain(BufReader<R>),
    Gzip(GzDecoder<BufReader<R>>),
}

impl<R: Read> Input<R> {
    pub(crate) fn new(inner: R, capacity: usize) -> Self {
        Self::Plain(BufReader::with_capacity(capacity, inner))
    }

    /// Wraps the remaining plain bytes in a gzip decoder.
    pub(crate) fn into_gzip(self) -> Self {
        match self {
            Self::Plain(buf) => Self::Gzip(GzDecoder::new(buf)),
            gzip @ Self::Gzip(_) => gzip,
        }
    }

    pub(crate) fn is_seekable_variant(&self) -> bool {
        matches!(self, Self::Plain(_))
    }
}

impl<R: Read> Read for Input<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(r) => r.read(buf),
            Self::Gzip(r) => r.read(buf),
        }
    }
}

impl<R: Read + Seek> Seek for Input<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Self::Plain(r) => r.seek(pos),
            Self::Gzip(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "cannot seek inside a gzip-compressed body",
            )),
        }
    }
}
