//! Random access through the trailer index.
//!
//! Opening with [`StreamReader::with_random_access`] locates the trailer
//! from the end of the source, replays every indexed StringTable token so
//! that all strings are resolvable, and rewinds to the body start. After
//! that [`StreamReader::set_position`] can jump to any token offset.

use std::io::{Read, Seek};

use log::{debug, trace};

use super::{ReaderConfig, StreamReader};
use crate::event::EventType;
use crate::token::TokenType;
use crate::trailer::Trailer;
use crate::{Error, Result};

impl<R: Read + Seek> StreamReader<R> {
    /// Opens a seekable source and loads its trailer index.
    ///
    /// Fails with [`Error::RandomAccessUnsupported`] for compressed streams
    /// and streams whose trailer carries no string index.
    pub fn with_random_access(inner: R, config: ReaderConfig) -> Result<Self> {
        let mut reader = Self::with_config(inner, config)?;
        reader.load_trailer()?;
        Ok(reader)
    }

    fn load_trailer(&mut self) -> Result<()> {
        let body_start = self.body_start;
        let stream = self.stream.as_mut().ok_or(Error::StreamClosed)?;
        if !stream.get_ref().is_seekable_variant() {
            return Err(Error::RandomAccessUnsupported);
        }
        let (trailer, _) = Trailer::locate(stream, body_start)?;
        if !trailer.has_string_index() {
            return Err(Error::RandomAccessUnsupported);
        }

        for fragment in trailer.fragments() {
            stream.seek_to(fragment.offset)?;
            let token = stream.read_token_type()?;
            if token != TokenType::StringTable {
                return Err(Error::malformed_trailer(format!(
                    "fragment offset {} points at {token}",
                    fragment.offset
                )));
            }
            let n = stream.read_count()?;
            if n != fragment.count {
                return Err(Error::StringTableIndexMismatch { expected: fragment.count, found: n });
            }
            for _ in 0..n {
                let s = stream.read_string()?;
                self.state.strings.add(&s, fragment.offset);
            }
            trace!("replayed {n} strings from offset {}", fragment.offset);
        }
        let indexed = trailer.indexed_strings();
        let found = self.state.strings.len() as u64;
        if found != indexed {
            return Err(Error::StringTableIndexMismatch { expected: indexed, found });
        }

        stream.seek_to(body_start)?;
        self.root_offset = super::worker::root_element_offset(stream)?;
        stream.seek_to(body_start)?;
        debug!(
            "random access enabled: {} fragments, {} strings",
            trailer.fragments().len(),
            found
        );
        self.state.trailer = Some(trailer);
        self.random_access = true;
        Ok(())
    }

    /// True when the source is seekable and a non-empty trailer index was loaded.
    pub fn supports_random_access(&self) -> bool {
        self.random_access && self.stream.is_some()
    }

    /// Jumps to the token at `offset` and resumes at the next tag boundary.
    ///
    /// The open-element stack, pending attributes and namespace scopes are
    /// discarded. Past the root element, END_ELEMENTs of the unknown
    /// ancestors have no name and prefixes they declared resolve to `""`.
    /// Returns the event now current (START_ELEMENT, END_ELEMENT or
    /// END_DOCUMENT).
    pub fn set_position(&mut self, offset: u64) -> Result<EventType> {
        if !self.supports_random_access() {
            return Err(if self.stream.is_none() {
                Error::StreamClosed
            } else {
                Error::RandomAccessUnsupported
            });
        }
        if offset < self.body_start {
            return Err(Error::IndexOutOfBounds { index: offset as usize, len: self.body_start as usize });
        }
        let stream = self.stream.as_mut().ok_or(Error::StreamClosed)?;
        stream.seek_to(offset)?;
        self.state.invalidate();
        // Bis einschliesslich Wurzel gibt es keine unbekannten Vorfahren.
        self.state.resynced = self.root_offset.map_or(true, |root| offset > root);
        self.worker = super::worker::read_next(stream, &mut self.state)?;
        debug!("seek to {offset}: {}", self.worker.event_type());

        loop {
            let event = self.event_type();
            if event.is_tag() || event == EventType::EndDocument {
                return Ok(event);
            }
            self.next()?;
        }
    }
}
