#![forbid(unsafe_code)]

//! Chunked, block-compressed int columns.
//!
//! ```text
//! byte    version (0x02)
//! int32   total value count
//! int32   chunk capacity
//! byte    compression strategy id
//! ...     block container, one block per chunk
//! ```

use crate::byte_order::{count_to_i32, ByteOrder, SliceReader};
use crate::compression::{BlockCodec, CompressionStrategy};
use crate::error::{ColumnarError, ColumnarResult};
use crate::flattener::{BlockContainer, BlockContainerWriter};
use std::io::Write;

pub const INTS_VERSION: u8 = 0x02;
/// Default chunk capacity: one 64 KiB buffer of 4-byte ints.
pub const MAX_INTS_IN_BUFFER: usize = (64 << 10) / 4;
const META_BYTES: u64 = 1 + 4 + 4 + 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WriterState {
    Unopened,
    Open,
    /// The trailing chunk has been flushed; the column is frozen.
    Closed,
}

#[derive(Debug)]
pub struct CompressedIntsWriter {
    chunk_capacity: usize,
    order: ByteOrder,
    compression: CompressionStrategy,
    flattener: BlockContainerWriter,
    current: Vec<i32>,
    num_inserted: usize,
    state: WriterState,
}

impl CompressedIntsWriter {
    pub fn create(compression: CompressionStrategy) -> Self {
        Self::with_capacity(MAX_INTS_IN_BUFFER, ByteOrder::default(), compression)
    }

    /// Fails with [`ColumnarError::ZeroChunkCapacity`] when `chunk_capacity` is 0.
    pub fn new(
        chunk_capacity: usize,
        order: ByteOrder,
        compression: CompressionStrategy,
    ) -> ColumnarResult<Self> {
        if chunk_capacity == 0 {
            return Err(ColumnarError::ZeroChunkCapacity);
        }
        Ok(Self::with_capacity(chunk_capacity, order, compression))
    }

    fn with_capacity(
        chunk_capacity: usize,
        order: ByteOrder,
        compression: CompressionStrategy,
    ) -> Self {
        Self {
            chunk_capacity,
            order,
            compression,
            flattener: BlockContainerWriter::new(compression.codec(), order),
            current: Vec::new(),
            num_inserted: 0,
            state: WriterState::Unopened,
        }
    }

    pub fn open(&mut self) {
        self.flattener.open();
        self.current = Vec::with_capacity(self.chunk_capacity);
        self.num_inserted = 0;
        self.state = WriterState::Open;
    }

    pub fn add_value(&mut self, value: i32) -> ColumnarResult<()> {
        match self.state {
            WriterState::Unopened => return Err(ColumnarError::NotOpen),
            WriterState::Closed => return Err(ColumnarError::Closed),
            WriterState::Open => {}
        }

        if self.current.len() == self.chunk_capacity {
            self.flush_chunk()?;
        }
        self.current.push(value);
        self.num_inserted += 1;
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.num_inserted
    }

    pub fn chunk_capacity(&self) -> usize {
        self.chunk_capacity
    }

    /// Number of chunks handed to the block container so far.
    pub fn num_chunks(&self) -> usize {
        self.flattener.num_blocks()
    }

    pub fn serialized_size(&mut self) -> ColumnarResult<u64> {
        self.close()?;
        Ok(META_BYTES + self.flattener.serialized_size())
    }

    pub fn write_to(&mut self, out: &mut dyn Write) -> ColumnarResult<()> {
        self.close()?;

        let mut meta = Vec::with_capacity(META_BYTES as usize);
        meta.push(INTS_VERSION);
        self.order
            .write_i32(&mut meta, count_to_i32(self.num_inserted)?)?;
        self.order
            .write_i32(&mut meta, count_to_i32(self.chunk_capacity)?)?;
        meta.push(self.compression.id());
        out.write_all(&meta)?;

        self.flattener.write_to(out)
    }

    fn close(&mut self) -> ColumnarResult<()> {
        match self.state {
            WriterState::Unopened => Err(ColumnarError::NotOpen),
            WriterState::Closed => Ok(()),
            WriterState::Open => {
                if !self.current.is_empty() {
                    self.flush_chunk()?;
                }
                self.current = Vec::new();
                self.state = WriterState::Closed;
                Ok(())
            }
        }
    }

    fn flush_chunk(&mut self) -> ColumnarResult<()> {
        let mut bytes = Vec::with_capacity(self.current.len() * 4);
        for &value in &self.current {
            self.order.write_i32(&mut bytes, value)?;
        }
        self.flattener.write_block(&bytes)?;
        self.current.clear();
        Ok(())
    }
}

/// Random-access reader over bytes produced by [`CompressedIntsWriter`].
#[derive(Debug)]
pub struct CompressedIntsReader<'a> {
    len: usize,
    chunk_capacity: usize,
    compression: CompressionStrategy,
    codec: Box<dyn BlockCodec>,
    order: ByteOrder,
    chunks: BlockContainer<'a>,
}

impl<'a> CompressedIntsReader<'a> {
    pub fn from_bytes(buf: &'a [u8], order: ByteOrder) -> ColumnarResult<Self> {
        let mut reader = SliceReader::new(buf, order);
        let version = reader.read_u8("ints version")?;
        if version != INTS_VERSION {
            return Err(ColumnarError::UnsupportedVersion {
                what: "compressed ints",
                expected: INTS_VERSION,
                found: version,
            });
        }
        let len = reader.read_len("value count")?;
        let chunk_capacity = reader.read_len("chunk capacity")?;
        let compression = CompressionStrategy::from_id(reader.read_u8("compression id")?)?;
        let (chunks, _) = BlockContainer::read(reader.rest(), order)?;

        let expected_chunks = match (len, chunk_capacity) {
            (0, _) => 0,
            (_, 0) => return Err(ColumnarError::corrupt("zero chunk capacity")),
            (len, cap) => len.div_ceil(cap),
        };
        if chunks.len() != expected_chunks {
            return Err(ColumnarError::corrupt(format!(
                "{len} values at {chunk_capacity} per chunk need {expected_chunks} chunks, found {}",
                chunks.len()
            )));
        }

        Ok(Self {
            len,
            chunk_capacity,
            compression,
            codec: compression.codec(),
            order,
            chunks,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn chunk_capacity(&self) -> usize {
        self.chunk_capacity
    }

    pub fn compression(&self) -> CompressionStrategy {
        self.compression
    }

    pub fn num_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn get(&self, index: usize) -> ColumnarResult<i32> {
        if index >= self.len {
            return Err(ColumnarError::OutOfBounds {
                index,
                len: self.len,
            });
        }
        let chunk = self.decode_chunk(index / self.chunk_capacity)?;
        let offset = (index % self.chunk_capacity) * 4;
        Ok(self.order.read_i32(&chunk[offset..offset + 4]))
    }

    pub fn to_vec(&self) -> ColumnarResult<Vec<i32>> {
        let mut out = Vec::with_capacity(self.len.min(crate::byte_order::MAX_PREALLOC_VALUES));
        for chunk_idx in 0..self.chunks.len() {
            let chunk = self.decode_chunk(chunk_idx)?;
            out.extend(chunk.chunks_exact(4).map(|b| self.order.read_i32(b)));
        }
        Ok(out)
    }

    fn decode_chunk(&self, chunk_idx: usize) -> ColumnarResult<Vec<u8>> {
        let bytes = self.chunks.decoded_block(chunk_idx, self.codec.as_ref())?;
        let start = chunk_idx * self.chunk_capacity;
        let expected = (self.len - start).min(self.chunk_capacity) * 4;
        if bytes.len() != expected {
            return Err(ColumnarError::corrupt(format!(
                "chunk {chunk_idx} decoded to {} bytes, expected {expected}",
                bytes.len()
            )));
        }
        Ok(bytes)
    }
}
