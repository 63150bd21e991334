#![forbid(unsafe_code)]

use crate::encoding::{select_encoding, LongEncodingFormat};
use crate::error::{ColumnarError, ColumnarResult};
use crate::longs::{long_serializer_for, LongSerializer, SerializerOptions};
use crate::stats::{LongStats, MAX_TABLE_SIZE};
use std::io::Write;

/// Long column serializer that defers the choice of encoding until every value is known.
///
/// Values are buffered in memory while [`LongStats`] tracks min/max and a capped dictionary.
/// The first call to [`LongSerializer::serialized_size`] or [`LongSerializer::write_to`]
/// selects an encoding, builds the matching layout writer and replays the buffer through it.
/// Later calls reuse that writer, so the output never changes once produced.
///
/// The whole column lives in memory until then; sizing is the caller's concern.
#[derive(Debug)]
pub struct IntermediateLongSerializer {
    options: SerializerOptions,
    table_cap: usize,
    buffer: Option<Vec<i64>>,
    stats: LongStats,
    delegate: Option<Box<dyn LongSerializer>>,
    selected: Option<LongEncodingFormat>,
}

impl IntermediateLongSerializer {
    pub fn new(options: SerializerOptions) -> Self {
        Self::with_max_table_size(options, MAX_TABLE_SIZE)
    }

    pub fn with_max_table_size(options: SerializerOptions, table_cap: usize) -> Self {
        Self {
            options,
            table_cap,
            buffer: None,
            stats: LongStats::with_table_cap(table_cap),
            delegate: None,
            selected: None,
        }
    }

    pub fn stats(&self) -> &LongStats {
        &self.stats
    }

    /// Encoding chosen at finalization, `None` while still buffering.
    pub fn selected_encoding(&self) -> Option<LongEncodingFormat> {
        self.selected
    }

    fn delegate(&mut self) -> ColumnarResult<&mut Box<dyn LongSerializer>> {
        if self.delegate.is_none() {
            let buffer = self.buffer.as_ref().ok_or(ColumnarError::NotOpen)?;
            let encoding = select_encoding(&self.stats);
            log::debug!(
                "selected {:?} encoding for {} values (min={:?}, max={:?}, dictionary={}{})",
                encoding.format(),
                self.stats.count(),
                self.stats.min(),
                self.stats.max(),
                self.stats.dictionary().len(),
                if self.stats.dictionary_overflowed() { "+" } else { "" },
            );

            let format = encoding.format();
            let mut delegate = long_serializer_for(self.options, encoding);
            delegate.open()?;
            for &value in buffer {
                delegate.add(value)?;
            }

            self.selected = Some(format);
            self.delegate = Some(delegate);
            self.buffer = Some(Vec::new());
        }

        self.delegate.as_mut().ok_or(ColumnarError::NotOpen)
    }
}

impl LongSerializer for IntermediateLongSerializer {
    fn open(&mut self) -> ColumnarResult<()> {
        self.buffer = Some(Vec::new());
        self.stats = LongStats::with_table_cap(self.table_cap);
        self.delegate = None;
        self.selected = None;
        Ok(())
    }

    fn size(&self) -> usize {
        self.stats.count()
    }

    fn add(&mut self, value: i64) -> ColumnarResult<()> {
        if self.delegate.is_some() {
            return Err(ColumnarError::Closed);
        }
        let buffer = self.buffer.as_mut().ok_or(ColumnarError::NotOpen)?;
        buffer.push(value);
        self.stats.add(value);
        Ok(())
    }

    fn serialized_size(&mut self) -> ColumnarResult<u64> {
        self.delegate()?.serialized_size()
    }

    fn write_to(&mut self, out: &mut dyn Write) -> ColumnarResult<()> {
        self.delegate()?.write_to(out)
    }
}
