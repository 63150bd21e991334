pub type ColumnarResult<T> = Result<T, ColumnarError>;

#[derive(Debug, thiserror::Error)]
pub enum ColumnarError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("writer is not open")]
    NotOpen,

    #[error("writer is closed: the trailing chunk was already flushed")]
    Closed,

    #[error("chunk capacity must be positive")]
    ZeroChunkCapacity,

    #[error("column holds {0} values, more than the format's 32-bit count allows")]
    TooManyValues(usize),

    #[error("unknown compression strategy id {0:#04x}")]
    UnknownCompression(u8),

    #[error("unknown long encoding format id {0:#04x}")]
    UnknownEncoding(u8),

    #[error("unsupported {what} version {found:#04x} (expected {expected:#04x})")]
    UnsupportedVersion {
        what: &'static str,
        expected: u8,
        found: u8,
    },

    #[error("{codec} codec failed: {message}")]
    Codec {
        codec: &'static str,
        message: String,
    },

    #[error("corrupt column data: {0}")]
    Corrupt(String),

    #[error("index {index} out of bounds for column of length {len}")]
    OutOfBounds { index: usize, len: usize },
}

impl ColumnarError {
    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt(message.into())
    }
}
