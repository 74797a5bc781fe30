//! BXML Header encoding/decoding.
//!
//! Der Header hat folgende Struktur:
//! - Magic (6 Bytes): `0x01 'B' 'X' 'M' 'L' 0x00`
//! - Binary-Sniff-Marker (4 Bytes): `0xFF 0x0D 0x0A 0x00`
//! - Version (3 Bytes): major, minor, patch
//! - Flags1: bit0 Daten little-endian, bit1 Zeichendaten little-endian,
//!   bit2 Random-Access-Index vorhanden
//! - Flags2: bit0 strikte XML-Strings, bit1 validiert
//! - Kompression (1 Byte): 0 = keine, 1 = gzip
//! - Charset-Name: Count-Länge + ASCII
//!
//! The header is never compressed. With gzip everything after it is one
//! gzip member.
//!
//! # Beispiel
//!
//! ```
//! use bxml::header::Header;
//! use bxml::options::EncodingOptions;
//!
//! let header = Header::new(EncodingOptions::default(), true);
//! let bytes = header.encode().unwrap();
//! assert_eq!(&bytes[..6], b"\x01BXML\x00");
//! assert_eq!(bytes.len(), 22);
//! ```

use std::io::Read;

use log::debug;

use crate::io::{ByteReader, ByteWriter};
use crate::options::{ByteOrder, Charset, EncodingOptions};
use crate::{Error, Result};

/// Magic identifier including the format name.
pub const MAGIC: [u8; 6] = [0x01, b'B', b'X', b'M', b'L', 0x00];

/// Catches text-mode transfers that mangle line endings or high bytes.
pub const BINARY_SNIFF: [u8; 4] = [0xFF, 0x0D, 0x0A, 0x00];

/// Version written by this codec.
pub const VERSION: [u8; 3] = [1, 0, 0];

const FLAG_DATA_LE: u8 = 0x01;
const FLAG_CHAR_LE: u8 = 0x02;
const FLAG_RANDOM_ACCESS: u8 = 0x04;
const FLAG_STRICT_STRINGS: u8 = 0x01;
const FLAG_VALIDATED: u8 = 0x02;

const COMPRESSION_NONE: u8 = 0;
const COMPRESSION_GZIP: u8 = 1;

/// Stream header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    version: [u8; 3],
    options: EncodingOptions,
    random_access: bool,
}

impl Header {
    /// Header der aktuellen Version für `options`.
    pub fn new(options: EncodingOptions, random_access: bool) -> Self {
        Self { version: VERSION, options, random_access }
    }

    // --- Getter ---

    /// `[major, minor, patch]`.
    pub fn version(&self) -> [u8; 3] {
        self.version
    }

    pub fn options(&self) -> &EncodingOptions {
        &self.options
    }

    /// Writer announced a trailer index for random access.
    pub fn random_access(&self) -> bool {
        self.random_access
    }

    /// Encodes the header.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let opts = &self.options;
        let mut w = ByteWriter::new(opts.byte_order(), Charset::utf8());
        w.write_bytes(&MAGIC);
        w.write_bytes(&BINARY_SNIFF);
        w.write_bytes(&self.version);

        let mut flags1 = 0;
        if opts.byte_order().is_little_endian() {
            flags1 |= FLAG_DATA_LE;
        }
        if opts.charset().is_little_endian() {
            flags1 |= FLAG_CHAR_LE;
        }
        if self.random_access {
            flags1 |= FLAG_RANDOM_ACCESS;
        }
        let mut flags2 = 0;
        if opts.strict_xml_strings() {
            flags2 |= FLAG_STRICT_STRINGS;
        }
        if opts.validated() {
            flags2 |= FLAG_VALIDATED;
        }
        w.write_u8(flags1);
        w.write_u8(flags2);
        w.write_u8(if opts.compression() { COMPRESSION_GZIP } else { COMPRESSION_NONE });

        let name = opts.charset().name();
        w.write_count(name.len() as u64)?;
        w.write_bytes(name.as_bytes());
        Ok(w.into_vec())
    }

    /// Decodes a header and configures `r` with its byte order and charset.
    pub fn decode<R: Read>(r: &mut ByteReader<R>) -> Result<Self> {
        let mut magic = [0u8; 6];
        r.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(Error::malformed_header("magic identifier mismatch"));
        }
        let mut sniff = [0u8; 4];
        r.read_exact(&mut sniff)?;
        if sniff != BINARY_SNIFF {
            return Err(Error::malformed_header("binary sniff marker damaged"));
        }
        let mut version = [0u8; 3];
        r.read_exact(&mut version)?;
        if version[0] != VERSION[0] {
            return Err(Error::UnsupportedVersion {
                major: version[0],
                minor: version[1],
                patch: version[2],
            });
        }

        let flags1 = r.read_u8()?;
        let flags2 = r.read_u8()?;
        let byte_order = if flags1 & FLAG_DATA_LE != 0 {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        };
        r.set_byte_order(byte_order);

        let compression = match r.read_u8()? {
            COMPRESSION_NONE => false,
            COMPRESSION_GZIP => true,
            other => {
                return Err(Error::malformed_header(format!("unknown compression method {other}")));
            }
        };

        let len = r.read_count()?;
        if len > 64 {
            return Err(Error::malformed_header("charset name too long"));
        }
        let raw = r.read_bytes(len as usize)?;
        if !raw.is_ascii() {
            return Err(Error::malformed_header("charset name is not ASCII"));
        }
        let name = String::from_utf8_lossy(&raw);
        let charset = Charset::for_label(&name)?;
        r.set_charset(charset);

        let options = EncodingOptions {
            byte_order,
            charset,
            compression,
            strict_xml_strings: flags2 & FLAG_STRICT_STRINGS != 0,
            validated: flags2 & FLAG_VALIDATED != 0,
        };
        let random_access = flags1 & FLAG_RANDOM_ACCESS != 0;
        debug!(
            "BXML header v{}.{}.{}: {:?}, charset {}, gzip {}, random access {}",
            version[0],
            version[1],
            version[2],
            byte_order,
            charset.name(),
            compression,
            random_access
        );
        Ok(Self { version, options, random_access })
    }
}
