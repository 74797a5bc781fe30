//! Trailer token: string-table index for random access.
//!
//! Layout (after the `Trailer` token byte):
//! - id `0x01 'T' 'R' 0x00`
//! - bool string-index used, Count fragment count, then per fragment
//!   Count strings-in-fragment and Count offset of its StringTable token
//! - bool index-table used (always false), Count 0
//! - i32 total trailer length, from the token byte through this integer
//!
//! The trailing length lets a reader find the trailer from the end of a
//! seekable stream without scanning.

use std::io::{Read, Seek};

use log::{debug, trace};

use crate::io::{ByteReader, ByteWriter};
use crate::string_table::StringTable;
use crate::token::TokenType;
use crate::{Error, Result};

/// Trailer identifier.
pub const TRAILER_ID: [u8; 4] = [0x01, b'T', b'R', 0x00];

/// Size of the trailing self-length integer.
pub const LENGTH_SUFFIX: u64 = 4;

/// One StringTable token covered by the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    /// Number of strings defined by the token.
    pub count: u64,
    /// Stream offset of the StringTable token byte.
    pub offset: u64,
}

/// Decoded trailer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trailer {
    string_index_used: bool,
    fragments: Vec<Fragment>,
}

impl Trailer {
    /// Trailer without index (random access disabled).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Index with one fragment per string, in table order.
    pub fn from_string_table(table: &StringTable) -> Self {
        let fragments = table.iter().map(|(_, offset)| Fragment { count: 1, offset }).collect();
        Self { string_index_used: true, fragments }
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Index present and non-empty.
    pub fn has_string_index(&self) -> bool {
        self.string_index_used && !self.fragments.is_empty()
    }

    /// Total number of strings covered by the index.
    pub fn indexed_strings(&self) -> u64 {
        self.fragments.iter().map(|f| f.count).sum()
    }

    /// Writes the complete trailer token including its length suffix.
    pub fn encode(&self, w: &mut ByteWriter) -> Result<()> {
        let start = w.position();
        w.write_token_type(TokenType::Trailer);
        w.write_bytes(&TRAILER_ID);
        w.write_bool(self.string_index_used);
        w.write_count(self.fragments.len() as u64)?;
        for fragment in &self.fragments {
            w.write_count(fragment.count)?;
            w.write_count(fragment.offset)?;
        }
        // Index-Tabelle: reserviert, nie belegt.
        w.write_bool(false);
        w.write_count(0)?;
        let total = w.position() + LENGTH_SUFFIX - start;
        let total = i32::try_from(total).map_err(|_| Error::CountOutOfRange(total))?;
        w.write_i32(total);
        Ok(())
    }

    /// Reads the trailer body; the token byte at `token_offset` is already consumed.
    pub fn decode_body<R: Read>(r: &mut ByteReader<R>, token_offset: u64) -> Result<Self> {
        let mut id = [0u8; 4];
        r.read_exact(&mut id)?;
        if id != TRAILER_ID {
            return Err(Error::TrailerIdMismatch(id));
        }
        let string_index_used = r.read_bool()?;
        let n = r.read_count()?;
        let mut fragments = Vec::with_capacity(n.min(1024) as usize);
        for _ in 0..n {
            let count = r.read_count()?;
            let offset = r.read_count()?;
            if offset >= token_offset {
                return Err(Error::malformed_trailer("fragment offset points past the trailer"));
            }
            fragments.push(Fragment { count, offset });
        }
        let index_table_used = r.read_bool()?;
        let index_entries = r.read_count()?;
        if index_table_used || index_entries != 0 {
            return Err(Error::malformed_trailer("index table is not supported"));
        }
        let declared = r.read_i32()?;
        let actual = r.position() - token_offset;
        if u64::try_from(declared).ok() != Some(actual) {
            return Err(Error::malformed_trailer(format!(
                "length suffix {declared} does not match trailer size {actual}"
            )));
        }
        trace!("trailer: {} fragments, index used {}", fragments.len(), string_index_used);
        Ok(Self { string_index_used, fragments })
    }

    /// Locates the trailer from the end of a seekable stream.
    ///
    /// `body_start` is the first offset after the header; a trailer claiming
    /// to start before it is malformed. The reader is left after the trailer.
    pub fn locate<R: Read + Seek>(r: &mut ByteReader<R>, body_start: u64) -> Result<(Self, u64)> {
        let suffix_at = r
            .seek_from_end(-(LENGTH_SUFFIX as i64))
            .map_err(|_| Error::malformed_trailer("stream too short for a trailer"))?;
        let len = r.read_i32()?;
        let end = suffix_at + LENGTH_SUFFIX;
        let len = u64::try_from(len)
            .ok()
            .filter(|&l| l > LENGTH_SUFFIX && l <= end.saturating_sub(body_start))
            .ok_or_else(|| Error::malformed_trailer(format!("implausible trailer length {len}")))?;
        let start = end - len;
        r.seek_to(start)?;
        let token = r.read_token_type()?;
        if token != TokenType::Trailer {
            return Err(Error::malformed_trailer(format!("expected Trailer token at {start}, found {token}")));
        }
        let trailer = Self::decode_body(r, start)?;
        debug!("located trailer at offset {start} ({len} bytes)");
        Ok((trailer, start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{ByteOrder, Charset};
    use std::io::Cursor;

    fn table() -> StringTable {
        let mut t = StringTable::new();
        t.add("root", 20);
        t.add("child", 31);
        t.add("id", 45);
        t
    }

    #[test]
    fn one_fragment_per_string() {
        let trailer = Trailer::from_string_table(&table());
        assert_eq!(
            trailer.fragments(),
            &[
                Fragment { count: 1, offset: 20 },
                Fragment { count: 1, offset: 31 },
                Fragment { count: 1, offset: 45 },
            ]
        );
        assert_eq!(trailer.indexed_strings(), 3);
        assert!(trailer.has_string_index());
        assert!(!Trailer::empty().has_string_index());
    }

    #[test]
    fn length_suffix_covers_whole_token() {
        let mut w = ByteWriter::with_base(100, ByteOrder::BigEndian, Charset::utf8());
        Trailer::from_string_table(&table()).encode(&mut w).unwrap();
        let bytes = w.as_slice();
        assert_eq!(bytes[0], 0xFF);
        assert_eq!(&bytes[1..5], &TRAILER_ID);
        let n = bytes.len();
        let suffix = i32::from_be_bytes([bytes[n - 4], bytes[n - 3], bytes[n - 2], bytes[n - 1]]);
        assert_eq!(suffix as usize, n);
    }

    #[test]
    fn locate_from_end() {
        for order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
            let mut w = ByteWriter::new(order, Charset::utf8());
            w.write_bytes(&[0u8; 60]);
            let trailer = Trailer::from_string_table(&table());
            trailer.encode(&mut w).unwrap();
            let mut r = ByteReader::new(Cursor::new(w.into_vec()), order, Charset::utf8());
            let (found, start) = Trailer::locate(&mut r, 16).unwrap();
            assert_eq!(found, trailer);
            assert_eq!(start, 60);
        }
    }

    #[test]
    fn wrong_id_is_detected() {
        let mut w = ByteWriter::new(ByteOrder::BigEndian, Charset::utf8());
        w.write_bytes(&[0u8; 60]);
        Trailer::from_string_table(&table()).encode(&mut w).unwrap();
        let mut bytes = w.into_vec();
        bytes[62] = b'X';
        let mut r = ByteReader::new(Cursor::new(bytes), ByteOrder::BigEndian, Charset::utf8());
        let err = Trailer::locate(&mut r, 16).unwrap_err();
        assert_eq!(err, Error::TrailerIdMismatch([0x01, b'X', b'R', 0x00]));
    }

    #[test]
    fn implausible_length_is_rejected() {
        let mut bytes = vec![0u8; 40];
        bytes.extend_from_slice(&1000i32.to_be_bytes());
        let mut r = ByteReader::new(Cursor::new(bytes), ByteOrder::BigEndian, Charset::utf8());
        assert!(matches!(Trailer::locate(&mut r, 16), Err(Error::MalformedTrailer(_))));
    }

    #[test]
    fn stream_without_trailer_token_is_rejected() {
        let mut bytes = vec![0u8; 40];
        bytes.extend_from_slice(&10i32.to_be_bytes());
        let mut r = ByteReader::new(Cursor::new(bytes), ByteOrder::BigEndian, Charset::utf8());
        // Offset 34 enthält 0x00: kein Token-Typ.
        assert_eq!(Trailer::locate(&mut r, 16).unwrap_err(), Error::InvalidTokenType(0));
    }
}
