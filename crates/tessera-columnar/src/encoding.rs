#![forbid(unsafe_code)]

//! Long encoding strategies and the statistics-driven selector.

use crate::bitpacking::{self, BitPacker};
use crate::byte_order::{count_to_i32, ByteOrder, SliceReader};
use crate::error::{ColumnarError, ColumnarResult};
use crate::stats::{Dictionary, LongStats};

const TABLE_ENCODING_VERSION: u8 = 0x01;
const DELTA_ENCODING_VERSION: u8 = 0x01;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LongEncodingFormat {
    Delta,
    Table,
    Longs,
}

impl LongEncodingFormat {
    pub const fn id(self) -> u8 {
        match self {
            Self::Delta => 0x00,
            Self::Table => 0x01,
            Self::Longs => 0xFF,
        }
    }

    pub fn from_id(id: u8) -> ColumnarResult<Self> {
        match id {
            0x00 => Ok(Self::Delta),
            0x01 => Ok(Self::Table),
            0xFF => Ok(Self::Longs),
            other => Err(ColumnarError::UnknownEncoding(other)),
        }
    }
}

/// The encoder a long column commits to once its statistics are final.
#[derive(Clone, Debug, PartialEq)]
pub enum LongEncoding {
    /// Values replaced by their dictionary code.
    Table { dictionary: Dictionary, bits: u8 },
    /// Values replaced by their offset from `base`.
    Delta { base: i64, bits: u8 },
    /// Values stored verbatim as 8-byte integers.
    Longs,
}

/// Picks the smallest encoding the statistics allow. Never fails: raw longs are always valid.
pub fn select_encoding(stats: &LongStats) -> LongEncoding {
    let dictionary = stats.dictionary();
    if dictionary.len() <= stats.table_cap() {
        let max_code = dictionary.len().saturating_sub(1) as u64;
        return LongEncoding::Table {
            dictionary: dictionary.clone(),
            bits: bitpacking::bits_for_max(max_code),
        };
    }

    match (stats.min(), stats.span()) {
        (Some(base), Some(span)) => LongEncoding::Delta {
            base,
            bits: bitpacking::bits_for_max(span),
        },
        _ => LongEncoding::Longs,
    }
}

impl LongEncoding {
    pub fn format(&self) -> LongEncodingFormat {
        match self {
            Self::Table { .. } => LongEncodingFormat::Table,
            Self::Delta { .. } => LongEncodingFormat::Delta,
            Self::Longs => LongEncodingFormat::Longs,
        }
    }

    pub fn bits_per_value(&self) -> u8 {
        match self {
            Self::Table { bits, .. } | Self::Delta { bits, .. } => *bits,
            Self::Longs => 64,
        }
    }

    /// How many values fit in a block of `block_bytes` bytes.
    pub fn values_per_block(&self, block_bytes: usize) -> usize {
        block_bytes * 8 / self.bits_per_value() as usize
    }

    /// Writes the format id followed by the format's metadata.
    pub(crate) fn write_meta(&self, out: &mut Vec<u8>, order: ByteOrder) -> ColumnarResult<()> {
        out.push(self.format().id());
        match self {
            Self::Table { dictionary, bits } => {
                out.push(TABLE_ENCODING_VERSION);
                out.push(*bits);
                order.write_i32(out, count_to_i32(dictionary.len())?)?;
                for &value in dictionary.values() {
                    order.write_i64(out, value)?;
                }
            }
            Self::Delta { base, bits } => {
                out.push(DELTA_ENCODING_VERSION);
                out.push(*bits);
                order.write_i64(out, *base)?;
            }
            Self::Longs => {}
        }
        Ok(())
    }

    /// Appends the encoded form of `values` to `out`.
    pub(crate) fn encode(
        &self,
        values: &[i64],
        order: ByteOrder,
        out: &mut Vec<u8>,
    ) -> ColumnarResult<()> {
        match self {
            Self::Table { dictionary, bits } => {
                let mut packer = BitPacker::new(out, *bits);
                for &value in values {
                    let code = dictionary.code(value).ok_or_else(|| {
                        ColumnarError::corrupt(format!("value {value} missing from dictionary"))
                    })?;
                    packer.push(code as u64);
                }
                packer.finish();
            }
            Self::Delta { base, bits } => {
                let mut packer = BitPacker::new(out, *bits);
                for &value in values {
                    packer.push(value.wrapping_sub(*base) as u64);
                }
                packer.finish();
            }
            Self::Longs => {
                out.reserve(values.len() * 8);
                for &value in values {
                    order.write_i64(out, value)?;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn encoded_len(&self, count: usize) -> usize {
        bitpacking::packed_len(count, self.bits_per_value()).unwrap_or(usize::MAX)
    }
}

/// Reader-side counterpart of [`LongEncoding`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum LongDecoder {
    Table { values: Vec<i64>, bits: u8 },
    Delta { base: i64, bits: u8 },
    Longs { order: ByteOrder },
}

impl LongDecoder {
    pub fn read_meta(reader: &mut SliceReader<'_>, order: ByteOrder) -> ColumnarResult<Self> {
        let format = LongEncodingFormat::from_id(reader.read_u8("encoding format")?)?;
        match format {
            LongEncodingFormat::Table => {
                check_version(reader, "table encoding", TABLE_ENCODING_VERSION)?;
                let bits = read_width(reader)?;
                let size = reader.read_len("table size")?;
                let raw = reader.take(
                    size.checked_mul(8)
                        .ok_or_else(|| ColumnarError::corrupt("table size overflows"))?,
                    "table values",
                )?;
                let values = raw.chunks_exact(8).map(|b| order.read_i64(b)).collect();
                Ok(Self::Table { values, bits })
            }
            LongEncodingFormat::Delta => {
                check_version(reader, "delta encoding", DELTA_ENCODING_VERSION)?;
                let bits = read_width(reader)?;
                let base = reader.read_i64("delta base")?;
                Ok(Self::Delta { base, bits })
            }
            LongEncodingFormat::Longs => Ok(Self::Longs { order }),
        }
    }

    pub fn format(&self) -> LongEncodingFormat {
        match self {
            Self::Table { .. } => LongEncodingFormat::Table,
            Self::Delta { .. } => LongEncodingFormat::Delta,
            Self::Longs { .. } => LongEncodingFormat::Longs,
        }
    }

    pub fn bits_per_value(&self) -> u8 {
        match self {
            Self::Table { bits, .. } | Self::Delta { bits, .. } => *bits,
            Self::Longs { .. } => 64,
        }
    }

    fn check_payload(&self, payload: &[u8], count: usize) -> ColumnarResult<()> {
        let needed = bitpacking::packed_len(count, self.bits_per_value())
            .ok_or_else(|| ColumnarError::corrupt("value count overflows payload size"))?;
        if payload.len() < needed {
            return Err(ColumnarError::corrupt(format!(
                "payload holds {} bytes, {count} values need {needed}",
                payload.len()
            )));
        }
        Ok(())
    }

    /// Decodes value `index` of a payload known to hold more than `index` values.
    fn value_at(&self, payload: &[u8], index: usize) -> ColumnarResult<i64> {
        match self {
            Self::Table { values, bits } => {
                let code = bitpacking::unpack_at(payload, index, *bits);
                usize::try_from(code)
                    .ok()
                    .and_then(|code| values.get(code).copied())
                    .ok_or_else(|| {
                        ColumnarError::corrupt(format!(
                            "table code {code} outside table of {}",
                            values.len()
                        ))
                    })
            }
            Self::Delta { base, bits } => {
                let offset = bitpacking::unpack_at(payload, index, *bits);
                Ok(base.wrapping_add(offset as i64))
            }
            Self::Longs { order } => Ok(order.read_i64(&payload[index * 8..index * 8 + 8])),
        }
    }

    pub fn get(&self, payload: &[u8], count: usize, index: usize) -> ColumnarResult<i64> {
        if index >= count {
            return Err(ColumnarError::OutOfBounds { index, len: count });
        }
        self.check_payload(payload, count)?;
        self.value_at(payload, index)
    }

    pub fn decode(&self, payload: &[u8], count: usize, out: &mut Vec<i64>) -> ColumnarResult<()> {
        self.check_payload(payload, count)?;
        out.reserve(count);
        for index in 0..count {
            out.push(self.value_at(payload, index)?);
        }
        Ok(())
    }
}

fn check_version(reader: &mut SliceReader<'_>, what: &'static str, expected: u8) -> ColumnarResult<()> {
    let found = reader.read_u8(what)?;
    if found != expected {
        return Err(ColumnarError::UnsupportedVersion {
            what,
            expected,
            found,
        });
    }
    Ok(())
}

fn read_width(reader: &mut SliceReader<'_>) -> ColumnarResult<u8> {
    let bits = reader.read_u8("bits per value")?;
    if !bitpacking::is_supported_width(bits) {
        return Err(ColumnarError::corrupt(format!("unsupported bit width {bits}")));
    }
    Ok(bits)
}
