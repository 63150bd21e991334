#![forbid(unsafe_code)]

//! Long column layouts.
//!
//! Both layouts share one header:
//!
//! ```text
//! byte    version (0x02)
//! int32   total value count
//! int32   values per block (0 for the entire layout)
//! byte    compression strategy id
//! byte    encoding format id, followed by the encoding's metadata
//! ```
//!
//! The block layout follows the header with a block container of independently compressed
//! blocks. The entire layout (compression [`CompressionStrategy::None`]) follows it with the
//! encoded payload of every value, unblocked.

use crate::byte_order::{count_to_i32, ByteOrder, SliceReader};
use crate::compression::{BlockCodec, CompressionStrategy};
use crate::encoding::{LongDecoder, LongEncoding, LongEncodingFormat};
use crate::error::{ColumnarError, ColumnarResult};
use crate::flattener::{BlockContainer, BlockContainerWriter};
use crate::ints::WriterState;
use std::fmt;
use std::io::Write;

pub const LONGS_VERSION: u8 = 0x02;
/// Uncompressed size of one encoded block.
pub const BLOCK_SIZE_BYTES: usize = 64 << 10;
/// Values staged before being appended to an unblocked payload. A multiple of 8 keeps every
/// batch byte-aligned for all bit widths.
const ENTIRE_LAYOUT_BATCH: usize = 1024;

/// Settings shared by every long column written during a segment build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SerializerOptions {
    pub byte_order: ByteOrder,
    pub compression: CompressionStrategy,
}

/// Streaming writer for one long column.
pub trait LongSerializer: fmt::Debug + Send {
    fn open(&mut self) -> ColumnarResult<()>;
    fn size(&self) -> usize;
    fn add(&mut self, value: i64) -> ColumnarResult<()>;
    /// Finalizes the column if needed and reports its serialized length.
    fn serialized_size(&mut self) -> ColumnarResult<u64>;
    /// Finalizes the column if needed and writes it. Repeated calls write identical bytes.
    fn write_to(&mut self, out: &mut dyn Write) -> ColumnarResult<()>;
}

/// Builds the layout writer for a fixed encoding.
pub fn long_serializer_for(
    options: SerializerOptions,
    encoding: LongEncoding,
) -> Box<dyn LongSerializer> {
    match options.compression {
        CompressionStrategy::None => {
            Box::new(EntireLayoutLongSerializer::new(options.byte_order, encoding))
        }
        compression => Box::new(BlockLayoutLongSerializer::new(
            options.byte_order,
            encoding,
            compression,
        )),
    }
}

fn write_header(
    out: &mut Vec<u8>,
    order: ByteOrder,
    count: usize,
    values_per_block: usize,
    compression: CompressionStrategy,
    encoding: &LongEncoding,
) -> ColumnarResult<()> {
    out.push(LONGS_VERSION);
    order.write_i32(out, count_to_i32(count)?)?;
    order.write_i32(out, count_to_i32(values_per_block)?)?;
    out.push(compression.id());
    encoding.write_meta(out, order)
}

fn check_writable(state: WriterState) -> ColumnarResult<()> {
    match state {
        WriterState::Unopened => Err(ColumnarError::NotOpen),
        WriterState::Closed => Err(ColumnarError::Closed),
        WriterState::Open => Ok(()),
    }
}

#[derive(Debug)]
pub struct BlockLayoutLongSerializer {
    order: ByteOrder,
    encoding: LongEncoding,
    compression: CompressionStrategy,
    values_per_block: usize,
    flattener: BlockContainerWriter,
    current: Vec<i64>,
    num_inserted: usize,
    state: WriterState,
}

impl BlockLayoutLongSerializer {
    pub fn new(order: ByteOrder, encoding: LongEncoding, compression: CompressionStrategy) -> Self {
        let values_per_block = encoding.values_per_block(BLOCK_SIZE_BYTES);
        Self {
            order,
            encoding,
            compression,
            values_per_block,
            flattener: BlockContainerWriter::new(compression.codec(), order),
            current: Vec::new(),
            num_inserted: 0,
            state: WriterState::Unopened,
        }
    }

    pub fn values_per_block(&self) -> usize {
        self.values_per_block
    }

    fn header(&self) -> ColumnarResult<Vec<u8>> {
        let mut header = Vec::new();
        write_header(
            &mut header,
            self.order,
            self.num_inserted,
            self.values_per_block,
            self.compression,
            &self.encoding,
        )?;
        Ok(header)
    }

    fn flush_block(&mut self) -> ColumnarResult<()> {
        let mut bytes = Vec::with_capacity(self.encoding.encoded_len(self.current.len()));
        self.encoding.encode(&self.current, self.order, &mut bytes)?;
        self.flattener.write_block(&bytes)?;
        self.current.clear();
        Ok(())
    }

    fn close(&mut self) -> ColumnarResult<()> {
        match self.state {
            WriterState::Unopened => Err(ColumnarError::NotOpen),
            WriterState::Closed => Ok(()),
            WriterState::Open => {
                if !self.current.is_empty() {
                    self.flush_block()?;
                }
                self.current = Vec::new();
                self.state = WriterState::Closed;
                Ok(())
            }
        }
    }
}

impl LongSerializer for BlockLayoutLongSerializer {
    fn open(&mut self) -> ColumnarResult<()> {
        self.flattener.open();
        self.current = Vec::with_capacity(self.values_per_block);
        self.num_inserted = 0;
        self.state = WriterState::Open;
        Ok(())
    }

    fn size(&self) -> usize {
        self.num_inserted
    }

    fn add(&mut self, value: i64) -> ColumnarResult<()> {
        check_writable(self.state)?;
        if self.current.len() == self.values_per_block {
            self.flush_block()?;
        }
        self.current.push(value);
        self.num_inserted += 1;
        Ok(())
    }

    fn serialized_size(&mut self) -> ColumnarResult<u64> {
        self.close()?;
        Ok(self.header()?.len() as u64 + self.flattener.serialized_size())
    }

    fn write_to(&mut self, out: &mut dyn Write) -> ColumnarResult<()> {
        self.close()?;
        out.write_all(&self.header()?)?;
        self.flattener.write_to(out)
    }
}

#[derive(Debug)]
pub struct EntireLayoutLongSerializer {
    order: ByteOrder,
    encoding: LongEncoding,
    staged: Vec<i64>,
    payload: Vec<u8>,
    num_inserted: usize,
    state: WriterState,
}

impl EntireLayoutLongSerializer {
    pub fn new(order: ByteOrder, encoding: LongEncoding) -> Self {
        Self {
            order,
            encoding,
            staged: Vec::new(),
            payload: Vec::new(),
            num_inserted: 0,
            state: WriterState::Unopened,
        }
    }

    fn header(&self) -> ColumnarResult<Vec<u8>> {
        let mut header = Vec::new();
        write_header(
            &mut header,
            self.order,
            self.num_inserted,
            0,
            CompressionStrategy::None,
            &self.encoding,
        )?;
        Ok(header)
    }

    fn flush_staged(&mut self) -> ColumnarResult<()> {
        self.encoding
            .encode(&self.staged, self.order, &mut self.payload)?;
        self.staged.clear();
        Ok(())
    }

    fn close(&mut self) -> ColumnarResult<()> {
        match self.state {
            WriterState::Unopened => Err(ColumnarError::NotOpen),
            WriterState::Closed => Ok(()),
            WriterState::Open => {
                self.flush_staged()?;
                self.staged = Vec::new();
                self.state = WriterState::Closed;
                Ok(())
            }
        }
    }
}

impl LongSerializer for EntireLayoutLongSerializer {
    fn open(&mut self) -> ColumnarResult<()> {
        self.staged = Vec::with_capacity(ENTIRE_LAYOUT_BATCH);
        self.payload.clear();
        self.num_inserted = 0;
        self.state = WriterState::Open;
        Ok(())
    }

    fn size(&self) -> usize {
        self.num_inserted
    }

    fn add(&mut self, value: i64) -> ColumnarResult<()> {
        check_writable(self.state)?;
        self.staged.push(value);
        self.num_inserted += 1;
        if self.staged.len() == ENTIRE_LAYOUT_BATCH {
            self.flush_staged()?;
        }
        Ok(())
    }

    fn serialized_size(&mut self) -> ColumnarResult<u64> {
        self.close()?;
        Ok((self.header()?.len() + self.payload.len()) as u64)
    }

    fn write_to(&mut self, out: &mut dyn Write) -> ColumnarResult<()> {
        self.close()?;
        out.write_all(&self.header()?)?;
        out.write_all(&self.payload)?;
        Ok(())
    }
}

#[derive(Debug)]
enum LongLayout<'a> {
    Blocks {
        values_per_block: usize,
        codec: Box<dyn BlockCodec>,
        blocks: BlockContainer<'a>,
    },
    Entire {
        payload: &'a [u8],
    },
}

/// Random-access reader over bytes produced by either long layout.
#[derive(Debug)]
pub struct CompressedLongsReader<'a> {
    len: usize,
    compression: CompressionStrategy,
    decoder: LongDecoder,
    layout: LongLayout<'a>,
}

impl<'a> CompressedLongsReader<'a> {
    pub fn from_bytes(buf: &'a [u8], order: ByteOrder) -> ColumnarResult<Self> {
        let mut reader = SliceReader::new(buf, order);
        let version = reader.read_u8("longs version")?;
        if version != LONGS_VERSION {
            return Err(ColumnarError::UnsupportedVersion {
                what: "compressed longs",
                expected: LONGS_VERSION,
                found: version,
            });
        }
        let len = reader.read_len("value count")?;
        let values_per_block = reader.read_len("values per block")?;
        let compression = CompressionStrategy::from_id(reader.read_u8("compression id")?)?;
        let decoder = LongDecoder::read_meta(&mut reader, order)?;

        let layout = match compression {
            CompressionStrategy::None => {
                let payload = reader.rest();
                let needed = crate::bitpacking::packed_len(len, decoder.bits_per_value());
                if needed.map_or(true, |needed| payload.len() < needed) {
                    return Err(ColumnarError::corrupt(format!(
                        "unblocked payload of {} bytes is too short for {len} values",
                        payload.len()
                    )));
                }
                LongLayout::Entire { payload }
            }
            compression => {
                let (blocks, _) = BlockContainer::read(reader.rest(), order)?;
                let expected_blocks = match (len, values_per_block) {
                    (0, _) => 0,
                    (_, 0) => return Err(ColumnarError::corrupt("zero values per block")),
                    (len, per) => len.div_ceil(per),
                };
                if blocks.len() != expected_blocks {
                    return Err(ColumnarError::corrupt(format!(
                        "{len} values at {values_per_block} per block need {expected_blocks} blocks, found {}",
                        blocks.len()
                    )));
                }
                LongLayout::Blocks {
                    values_per_block,
                    codec: compression.codec(),
                    blocks,
                }
            }
        };

        Ok(Self {
            len,
            compression,
            decoder,
            layout,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn compression(&self) -> CompressionStrategy {
        self.compression
    }

    pub fn encoding(&self) -> LongEncodingFormat {
        self.decoder.format()
    }

    pub fn get(&self, index: usize) -> ColumnarResult<i64> {
        if index >= self.len {
            return Err(ColumnarError::OutOfBounds {
                index,
                len: self.len,
            });
        }
        match &self.layout {
            LongLayout::Entire { payload } => self.decoder.get(payload, self.len, index),
            LongLayout::Blocks {
                values_per_block,
                codec,
                blocks,
            } => {
                let block_idx = index / values_per_block;
                let block = blocks.decoded_block(block_idx, codec.as_ref())?;
                let count = self.block_len(block_idx, *values_per_block);
                self.decoder.get(&block, count, index % values_per_block)
            }
        }
    }

    pub fn to_vec(&self) -> ColumnarResult<Vec<i64>> {
        let mut out = Vec::with_capacity(self.len.min(crate::byte_order::MAX_PREALLOC_VALUES));
        match &self.layout {
            LongLayout::Entire { payload } => self.decoder.decode(payload, self.len, &mut out)?,
            LongLayout::Blocks {
                values_per_block,
                codec,
                blocks,
            } => {
                for block_idx in 0..blocks.len() {
                    let block = blocks.decoded_block(block_idx, codec.as_ref())?;
                    let count = self.block_len(block_idx, *values_per_block);
                    self.decoder.decode(&block, count, &mut out)?;
                }
            }
        }
        Ok(out)
    }

    fn block_len(&self, block_idx: usize, values_per_block: usize) -> usize {
        (self.len - block_idx * values_per_block).min(values_per_block)
    }
}
