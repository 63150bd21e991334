#![forbid(unsafe_code)]

use crate::error::{ColumnarError, ColumnarResult};
use std::fmt;
use std::io::Read;

/// Upper bound on a single decoded block.
///
/// Writers never produce blocks close to this size; the limit keeps a corrupt length prefix from
/// driving a huge allocation while reading.
pub const MAX_DECODED_BLOCK_BYTES: usize = 64 << 20;

const ZSTD_LEVEL: i32 = 3;

/// Per-block compression applied by the block container.
///
/// The id is part of every column header, so the numeric values are a wire contract.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CompressionStrategy {
    #[default]
    Lz4,
    Zstd,
    /// Blocks are stored verbatim but still chunked.
    Uncompressed,
    /// No blocking at all. Long columns switch to the unblocked layout; chunked int columns
    /// treat it like [`CompressionStrategy::Uncompressed`].
    None,
}

impl CompressionStrategy {
    pub const fn id(self) -> u8 {
        match self {
            Self::Lz4 => 0x01,
            Self::Zstd => 0x02,
            Self::Uncompressed => 0xFF,
            Self::None => 0xFE,
        }
    }

    pub fn from_id(id: u8) -> ColumnarResult<Self> {
        match id {
            0x01 => Ok(Self::Lz4),
            0x02 => Ok(Self::Zstd),
            0xFF => Ok(Self::Uncompressed),
            0xFE => Ok(Self::None),
            other => Err(ColumnarError::UnknownCompression(other)),
        }
    }

    pub fn codec(self) -> Box<dyn BlockCodec> {
        match self {
            Self::Lz4 => Box::new(Lz4Codec),
            Self::Zstd => Box::new(ZstdCodec::default()),
            Self::Uncompressed | Self::None => Box::new(IdentityCodec),
        }
    }
}

/// Reversible transform applied to each block independently.
pub trait BlockCodec: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;
    fn encode(&self, block: &[u8]) -> ColumnarResult<Vec<u8>>;
    fn decode(&self, block: &[u8]) -> ColumnarResult<Vec<u8>>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityCodec;

impl BlockCodec for IdentityCodec {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn encode(&self, block: &[u8]) -> ColumnarResult<Vec<u8>> {
        Ok(block.to_vec())
    }

    fn decode(&self, block: &[u8]) -> ColumnarResult<Vec<u8>> {
        Ok(block.to_vec())
    }
}

/// LZ4 block format with the uncompressed size prepended (little-endian `u32`).
#[derive(Clone, Copy, Debug, Default)]
pub struct Lz4Codec;

impl BlockCodec for Lz4Codec {
    fn name(&self) -> &'static str {
        "lz4"
    }

    fn encode(&self, block: &[u8]) -> ColumnarResult<Vec<u8>> {
        Ok(lz4_flex::compress_prepend_size(block))
    }

    fn decode(&self, block: &[u8]) -> ColumnarResult<Vec<u8>> {
        let Some(prefix) = block.get(..4) else {
            return Err(codec_error(self, "missing size prefix"));
        };
        let declared = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        if declared > MAX_DECODED_BLOCK_BYTES {
            return Err(codec_error(
                self,
                format!("declared block size {declared} exceeds {MAX_DECODED_BLOCK_BYTES}"),
            ));
        }
        lz4_flex::decompress_size_prepended(block).map_err(|err| codec_error(self, err))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ZstdCodec {
    level: i32,
}

impl ZstdCodec {
    pub fn with_level(level: i32) -> Self {
        Self { level }
    }
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self::with_level(ZSTD_LEVEL)
    }
}

impl BlockCodec for ZstdCodec {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn encode(&self, block: &[u8]) -> ColumnarResult<Vec<u8>> {
        zstd::stream::encode_all(block, self.level).map_err(|err| codec_error(self, err))
    }

    fn decode(&self, block: &[u8]) -> ColumnarResult<Vec<u8>> {
        let decoder = zstd::stream::read::Decoder::new(block).map_err(|err| codec_error(self, err))?;
        let mut out = Vec::new();
        decoder
            .take(MAX_DECODED_BLOCK_BYTES as u64 + 1)
            .read_to_end(&mut out)
            .map_err(|err| codec_error(self, err))?;
        if out.len() > MAX_DECODED_BLOCK_BYTES {
            return Err(codec_error(
                self,
                format!("decoded block exceeds {MAX_DECODED_BLOCK_BYTES} bytes"),
            ));
        }
        Ok(out)
    }
}

fn codec_error(codec: &dyn BlockCodec, message: impl fmt::Display) -> ColumnarError {
    ColumnarError::Codec {
        codec: codec.name(),
        message: message.to_string(),
    }
}
