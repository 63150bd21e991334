#![forbid(unsafe_code)]

use std::collections::HashMap;

/// Largest dictionary that still qualifies a long column for table encoding.
pub const MAX_TABLE_SIZE: usize = 256;

/// Dense value-to-code map built in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dictionary {
    codes: HashMap<i64, u32>,
    values: Vec<i64>,
}

impl Dictionary {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn code(&self, value: i64) -> Option<u32> {
        self.codes.get(&value).copied()
    }

    /// Dictionary values indexed by code.
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    fn insert(&mut self, value: i64) {
        if let std::collections::hash_map::Entry::Vacant(slot) = self.codes.entry(value) {
            slot.insert(self.values.len() as u32);
            self.values.push(value);
        }
    }
}

/// Running statistics for a buffered long column.
///
/// The dictionary keeps accepting new values while it holds at most `table_cap` entries, so a
/// column with more distinct values ends up with exactly `table_cap + 1` entries. That extra
/// entry is how overflow is detected at selection time; nothing past it is tracked.
#[derive(Clone, Debug)]
pub struct LongStats {
    table_cap: usize,
    count: usize,
    min: i64,
    max: i64,
    dictionary: Dictionary,
}

impl Default for LongStats {
    fn default() -> Self {
        Self::with_table_cap(MAX_TABLE_SIZE)
    }
}

impl LongStats {
    pub fn with_table_cap(table_cap: usize) -> Self {
        Self {
            table_cap,
            count: 0,
            min: i64::MAX,
            max: i64::MIN,
            dictionary: Dictionary::default(),
        }
    }

    pub fn add(&mut self, value: i64) {
        self.count += 1;
        if self.dictionary.len() <= self.table_cap {
            self.dictionary.insert(value);
        }
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn table_cap(&self) -> usize {
        self.table_cap
    }

    pub fn min(&self) -> Option<i64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<i64> {
        (self.count > 0).then_some(self.max)
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn dictionary_overflowed(&self) -> bool {
        self.dictionary.len() > self.table_cap
    }

    /// `max - min`, or `None` when the subtraction overflows or lands on `i64::MAX`.
    pub fn span(&self) -> Option<u64> {
        if self.count == 0 {
            return Some(0);
        }
        self.max
            .checked_sub(self.min)
            .filter(|&span| span != i64::MAX)
            .map(|span| span as u64)
    }
}
