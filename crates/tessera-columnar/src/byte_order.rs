#![forbid(unsafe_code)]

use crate::error::{ColumnarError, ColumnarResult};
use byteorder::{BigEndian, ByteOrder as _, LittleEndian, WriteBytesExt};
use std::io::{self, Write};

/// Byte order used for every multi-byte integer of a column: headers, block indexes and
/// unpacked payload values alike.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    BigEndian,
    #[default]
    LittleEndian,
}

impl ByteOrder {
    pub(crate) fn write_i32<W: Write + ?Sized>(self, out: &mut W, value: i32) -> io::Result<()> {
        match self {
            Self::BigEndian => out.write_i32::<BigEndian>(value),
            Self::LittleEndian => out.write_i32::<LittleEndian>(value),
        }
    }

    pub(crate) fn write_i64<W: Write + ?Sized>(self, out: &mut W, value: i64) -> io::Result<()> {
        match self {
            Self::BigEndian => out.write_i64::<BigEndian>(value),
            Self::LittleEndian => out.write_i64::<LittleEndian>(value),
        }
    }

    pub(crate) fn read_i32(self, buf: &[u8]) -> i32 {
        match self {
            Self::BigEndian => BigEndian::read_i32(buf),
            Self::LittleEndian => LittleEndian::read_i32(buf),
        }
    }

    pub(crate) fn read_i64(self, buf: &[u8]) -> i64 {
        match self {
            Self::BigEndian => BigEndian::read_i64(buf),
            Self::LittleEndian => LittleEndian::read_i64(buf),
        }
    }
}

/// Upper bound on output reserved up front from a header's value count; the rest grows as
/// blocks actually decode.
pub(crate) const MAX_PREALLOC_VALUES: usize = 1 << 20;

/// Bounds-checked cursor over serialized column bytes.
///
/// Every read reports truncation as [`ColumnarError::Corrupt`] instead of panicking, so readers
/// can be pointed at untrusted input.
pub(crate) struct SliceReader<'a> {
    buf: &'a [u8],
    pos: usize,
    order: ByteOrder,
}

impl<'a> SliceReader<'a> {
    pub fn new(buf: &'a [u8], order: ByteOrder) -> Self {
        Self { buf, pos: 0, order }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn take(&mut self, len: usize, what: &str) -> ColumnarResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| {
                ColumnarError::corrupt(format!(
                    "truncated {what}: need {len} bytes at offset {}, have {}",
                    self.pos,
                    self.buf.len().saturating_sub(self.pos)
                ))
            })?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    pub fn read_u8(&mut self, what: &str) -> ColumnarResult<u8> {
        Ok(self.take(1, what)?[0])
    }

    pub fn read_i32(&mut self, what: &str) -> ColumnarResult<i32> {
        let order = self.order;
        Ok(order.read_i32(self.take(4, what)?))
    }

    /// Reads an `int32` field that must hold a non-negative count or length.
    pub fn read_len(&mut self, what: &str) -> ColumnarResult<usize> {
        let value = self.read_i32(what)?;
        usize::try_from(value)
            .map_err(|_| ColumnarError::corrupt(format!("negative {what}: {value}")))
    }

    pub fn read_i64(&mut self, what: &str) -> ColumnarResult<i64> {
        let order = self.order;
        Ok(order.read_i64(self.take(8, what)?))
    }

    pub fn rest(&mut self) -> &'a [u8] {
        let out = &self.buf[self.pos..];
        self.pos = self.buf.len();
        out
    }
}

/// Converts an in-memory count to the `int32` used on disk.
pub(crate) fn count_to_i32(count: usize) -> ColumnarResult<i32> {
    i32::try_from(count).map_err(|_| ColumnarError::TooManyValues(count))
}
