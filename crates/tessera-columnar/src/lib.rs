//! Column serializers for segment builds.
//!
//! This crate focuses on:
//! - Statistics-driven long encoding (dictionary table, delta from minimum, or raw longs).
//! - An adaptive long serializer that buffers a column and commits to an encoding once.
//! - Chunked int columns streamed through a block container with per-block compression.
//! - Readers for every layout written, with random access by logical index.

#![forbid(unsafe_code)]

mod bitpacking;
mod byte_order;
mod compression;
mod encoding;
mod error;
mod flattener;
mod intermediate;
mod ints;
mod longs;
mod stats;

pub use crate::byte_order::ByteOrder;
pub use crate::compression::{
    BlockCodec, CompressionStrategy, IdentityCodec, Lz4Codec, ZstdCodec, MAX_DECODED_BLOCK_BYTES,
};
pub use crate::encoding::{select_encoding, LongEncoding, LongEncodingFormat};
pub use crate::error::{ColumnarError, ColumnarResult};
pub use crate::flattener::{BlockContainer, BlockContainerWriter};
pub use crate::intermediate::IntermediateLongSerializer;
pub use crate::ints::{CompressedIntsReader, CompressedIntsWriter, INTS_VERSION, MAX_INTS_IN_BUFFER};
pub use crate::longs::{
    long_serializer_for, BlockLayoutLongSerializer, CompressedLongsReader,
    EntireLayoutLongSerializer, LongSerializer, SerializerOptions, BLOCK_SIZE_BYTES, LONGS_VERSION,
};
pub use crate::stats::{Dictionary, LongStats, MAX_TABLE_SIZE};
