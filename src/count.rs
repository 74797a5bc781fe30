//! Count: the variable-width non-negative integer of the BXML format.
//!
//! | Value range              | Encoding                    |
//! |--------------------------|-----------------------------|
//! | `0..=239`                | one byte (SmallNum)         |
//! | `240..=65535`            | `0xF2` + u16                |
//! | `65536..=i32::MAX`       | `0xF3` + i32                |
//! | `i32::MAX + 1..=i64::MAX`| `0xF4` + i64                |
//!
//! Multi-byte payloads follow the stream's data byte order. The
//! discriminators are the UShort/Int/Long codes of [`ValueType`](crate::value_type::ValueType).

use std::io::Read;

use crate::io::{ByteReader, ByteWriter};
use crate::value_type::{INT_CODE, LONG_CODE, USHORT_CODE};
use crate::{Error, Result};

/// Largest value stored inline in the discriminator byte.
pub const SMALL_NUM_MAX: u64 = 0xEF;

/// Number of bytes `value` occupies on the wire.
pub fn encoded_len(value: u64) -> usize {
    if value <= SMALL_NUM_MAX {
        1
    } else if value <= u16::MAX as u64 {
        3
    } else if value <= i32::MAX as u64 {
        5
    } else {
        9
    }
}

/// Writes a Count.
///
/// Fails with [`Error::CountOutOfRange`] above `i64::MAX`.
pub fn write(w: &mut ByteWriter, value: u64) -> Result<()> {
    if value <= SMALL_NUM_MAX {
        w.write_u8(value as u8);
    } else if value <= u16::MAX as u64 {
        w.write_u8(USHORT_CODE);
        w.write_u16(value as u16);
    } else if value <= i32::MAX as u64 {
        w.write_u8(INT_CODE);
        w.write_i32(value as i32);
    } else if value <= i64::MAX as u64 {
        w.write_u8(LONG_CODE);
        w.write_i64(value as i64);
    } else {
        return Err(Error::CountOutOfRange(value));
    }
    Ok(())
}

/// Reads a Count.
pub fn read<R: Read>(r: &mut ByteReader<R>) -> Result<u64> {
    let code = r.read_u8()?;
    match code {
        0..=0xEF => Ok(code as u64),
        USHORT_CODE => Ok(r.read_u16()? as u64),
        INT_CODE => {
            let v = r.read_i32()?;
            u64::try_from(v).map_err(|_| Error::InvalidCountCode(code))
        }
        LONG_CODE => {
            let v = r.read_i64()?;
            u64::try_from(v).map_err(|_| Error::InvalidCountCode(code))
        }
        other => Err(Error::InvalidCountCode(other)),
    }
}

/// Reads a Count that must fit into `usize` (lengths and indices).
pub fn read_usize<R: Read>(r: &mut ByteReader<R>) -> Result<usize> {
    let v = read(r)?;
    usize::try_from(v).map_err(|_| Error::CountOutOfRange(v))
}
