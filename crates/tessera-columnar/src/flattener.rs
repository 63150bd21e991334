#![forbid(unsafe_code)]

//! Append-only container of independently transformed blocks.
//!
//! Layout:
//!
//! ```text
//! byte    version (0x01)
//! byte    flags   (reserved, 0x00)
//! int32   block count
//! int32   payload length in bytes
//! int32[] cumulative end offset of each block within the payload
//! bytes   payload: transformed blocks, in write order
//! ```
//!
//! The offset index lets readers slice out block `i` without touching blocks `0..i`.

use crate::byte_order::{count_to_i32, ByteOrder, SliceReader};
use crate::compression::BlockCodec;
use crate::error::{ColumnarError, ColumnarResult};
use std::io::Write;

pub(crate) const CONTAINER_VERSION: u8 = 0x01;
const HEADER_BYTES: u64 = 1 + 1 + 4 + 4;

#[derive(Debug)]
pub struct BlockContainerWriter {
    codec: Box<dyn BlockCodec>,
    order: ByteOrder,
    end_offsets: Vec<i32>,
    payload: Vec<u8>,
}

impl BlockContainerWriter {
    pub fn new(codec: Box<dyn BlockCodec>, order: ByteOrder) -> Self {
        Self {
            codec,
            order,
            end_offsets: Vec::new(),
            payload: Vec::new(),
        }
    }

    /// Drops any blocks written so far.
    pub fn open(&mut self) {
        self.end_offsets.clear();
        self.payload.clear();
    }

    pub fn write_block(&mut self, block: &[u8]) -> ColumnarResult<()> {
        let encoded = self.codec.encode(block)?;
        let end = count_to_i32(self.payload.len() + encoded.len())?;
        self.payload.extend_from_slice(&encoded);
        self.end_offsets.push(end);
        log::trace!(
            "flushed block {} ({} -> {} bytes, {})",
            self.end_offsets.len() - 1,
            block.len(),
            encoded.len(),
            self.codec.name()
        );
        Ok(())
    }

    pub fn num_blocks(&self) -> usize {
        self.end_offsets.len()
    }

    pub fn serialized_size(&self) -> u64 {
        HEADER_BYTES + 4 * self.end_offsets.len() as u64 + self.payload.len() as u64
    }

    pub fn write_to(&self, out: &mut dyn Write) -> ColumnarResult<()> {
        let mut header = Vec::with_capacity(HEADER_BYTES as usize + 4 * self.end_offsets.len());
        header.push(CONTAINER_VERSION);
        header.push(0);
        self.order
            .write_i32(&mut header, count_to_i32(self.end_offsets.len())?)?;
        self.order
            .write_i32(&mut header, count_to_i32(self.payload.len())?)?;
        for &end in &self.end_offsets {
            self.order.write_i32(&mut header, end)?;
        }
        out.write_all(&header)?;
        out.write_all(&self.payload)?;
        Ok(())
    }
}

/// Read-only view over a serialized block container.
#[derive(Clone, Debug)]
pub struct BlockContainer<'a> {
    end_offsets: Vec<usize>,
    payload: &'a [u8],
}

impl<'a> BlockContainer<'a> {
    /// Parses a container at the start of `buf`, returning it and the number of bytes consumed.
    pub fn read(buf: &'a [u8], order: ByteOrder) -> ColumnarResult<(Self, usize)> {
        let mut reader = SliceReader::new(buf, order);
        let version = reader.read_u8("block container version")?;
        if version != CONTAINER_VERSION {
            return Err(ColumnarError::UnsupportedVersion {
                what: "block container",
                expected: CONTAINER_VERSION,
                found: version,
            });
        }
        let flags = reader.read_u8("block container flags")?;
        if flags != 0 {
            return Err(ColumnarError::corrupt(format!(
                "unexpected block container flags {flags:#04x}"
            )));
        }

        let num_blocks = reader.read_len("block count")?;
        let payload_len = reader.read_len("payload length")?;
        let index_len = num_blocks
            .checked_mul(4)
            .ok_or_else(|| ColumnarError::corrupt("block count overflows the offset index"))?;
        let index = reader.take(index_len, "block offset index")?;

        let mut end_offsets = Vec::with_capacity(num_blocks);
        let mut prev = 0usize;
        for raw in index.chunks_exact(4) {
            let end = order.read_i32(raw);
            let end = usize::try_from(end)
                .ok()
                .filter(|&end| end >= prev && end <= payload_len)
                .ok_or_else(|| {
                    ColumnarError::corrupt(format!(
                        "block end offset {end} outside {prev}..={payload_len}"
                    ))
                })?;
            end_offsets.push(end);
            prev = end;
        }
        if prev != payload_len {
            return Err(ColumnarError::corrupt(format!(
                "blocks cover {prev} of {payload_len} payload bytes"
            )));
        }

        let payload = reader.take(payload_len, "block payload")?;
        Ok((
            Self {
                end_offsets,
                payload,
            },
            reader.position(),
        ))
    }

    pub fn len(&self) -> usize {
        self.end_offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.end_offsets.is_empty()
    }

    /// Transformed (still encoded) bytes of block `index`.
    pub fn block(&self, index: usize) -> Option<&'a [u8]> {
        let end = *self.end_offsets.get(index)?;
        let start = match index {
            0 => 0,
            _ => self.end_offsets[index - 1],
        };
        self.payload.get(start..end)
    }

    pub fn decoded_block(&self, index: usize, codec: &dyn BlockCodec) -> ColumnarResult<Vec<u8>> {
        let block = self.block(index).ok_or(ColumnarError::OutOfBounds {
            index,
            len: self.len(),
        })?;
        codec.decode(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::CompressionStrategy;

    #[test]
    fn size_matches_written_bytes_and_blocks_are_addressable() {
        let mut writer =
            BlockContainerWriter::new(CompressionStrategy::Uncompressed.codec(), ByteOrder::BigEndian);
        writer.open();
        writer.write_block(b"alpha").unwrap();
        writer.write_block(b"").unwrap();
        writer.write_block(b"gamma!").unwrap();

        let mut out = Vec::new();
        writer.write_to(&mut out).unwrap();
        assert_eq!(out.len() as u64, writer.serialized_size());
        assert_eq!(out.len(), 10 + 3 * 4 + 11);

        let (container, consumed) = BlockContainer::read(&out, ByteOrder::BigEndian).unwrap();
        assert_eq!(consumed, out.len());
        assert_eq!(container.len(), 3);
        assert_eq!(container.block(2), Some(&b"gamma!"[..]));
        assert_eq!(container.block(1), Some(&b""[..]));
        assert_eq!(container.block(0), Some(&b"alpha"[..]));
        assert_eq!(container.block(3), None);
    }

    #[test]
    fn rejects_offsets_past_payload() {
        let mut bytes = vec![CONTAINER_VERSION, 0];
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&2i32.to_le_bytes());
        bytes.extend_from_slice(&9i32.to_le_bytes());
        bytes.extend_from_slice(b"ab");
        assert!(matches!(
            BlockContainer::read(&bytes, ByteOrder::LittleEndian),
            Err(ColumnarError::Corrupt(_))
        ));
    }
}
