//! Byte sink behind the writer: plain or gzip body.

use std::io::{self, Write};

use flate2::write::GzEncoder;
use flate2::Compression;

/// Plain or gzip-compressing sink. The header is written before wrapping.
pub(crate) enum Output<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
}

impl<W: Write> Output<W> {
    pub(crate) fn new(inner: W, compress: bool) -> Self {
        if compress {
            Self::Gzip(GzEncoder::new(inner, Compression::default()))
        } else {
            Self::Plain(inner)
        }
    }

    /// Writes the gzip footer; the sink stays usable for `into_inner`.
    pub(crate) fn finish(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Gzip(enc) => {
                enc.try_finish()?;
                enc.get_mut().flush()
            }
        }
    }

    pub(crate) fn into_inner(self) -> io::Result<W> {
        match self {
            Self::Plain(w) => Ok(w),
            Self::Gzip(enc) => enc.finish(),
        }
    }
}

impl<W: Write> Write for Output<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            Self::Gzip(enc) => enc.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Gzip(enc) => enc.flush(),
        }
    }
}
