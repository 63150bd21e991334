use crate::row_adapter::ColumnFunction;
use crate::value::{ObjectKey, Value, ValueType};
use ahash::AHashMap;

/// Pre-sizes a hash map for `expected` entries so building it never rehashes.
pub(crate) fn capacity_for_expected_size(expected: usize) -> usize {
    if expected < 3 {
        return expected + 1;
    }
    if expected < (1 << 30) {
        return expected + expected / 3;
    }
    i32::MAX as usize
}

/// Equality index over one key column: converted key to row positions, in row order.
///
/// Long columns get a map keyed by the primitive value; every other type goes through
/// [`ObjectKey`].
#[derive(Clone, Debug)]
pub(crate) enum KeyIndex {
    Long(AHashMap<i64, Vec<usize>>),
    Object(AHashMap<ObjectKey, Vec<usize>>),
}

impl KeyIndex {
    pub fn build<R>(rows: &[R], column_fn: &ColumnFunction<R>, value_type: ValueType) -> Self {
        let capacity = capacity_for_expected_size(rows.len());
        match value_type {
            ValueType::Long => {
                let mut map = AHashMap::<i64, Vec<usize>>::with_capacity(capacity);
                for (position, row) in rows.iter().enumerate() {
                    if let Some(key) = column_fn(row).to_long() {
                        map.entry(key).or_default().push(position);
                    }
                }
                Self::Long(map)
            }
            other => {
                let mut map = AHashMap::<ObjectKey, Vec<usize>>::with_capacity(capacity);
                for (position, row) in rows.iter().enumerate() {
                    if let Some(key) = ObjectKey::convert(&column_fn(row), other) {
                        map.entry(key).or_default().push(position);
                    }
                }
                Self::Object(map)
            }
        }
    }

    pub fn find(&self, key: &Value, value_type: ValueType) -> &[usize] {
        let found = match self {
            Self::Long(map) => key.to_long().and_then(|k| map.get(&k)),
            Self::Object(map) => ObjectKey::convert(key, value_type).and_then(|k| map.get(&k)),
        };
        found.map_or(&[], Vec::as_slice)
    }

    pub fn distinct_keys(&self) -> usize {
        match self {
            Self::Long(map) => map.len(),
            Self::Object(map) => map.len(),
        }
    }
}

/// Lookup handle for one key column of an indexed table.
#[derive(Clone, Copy, Debug)]
pub struct IndexLookup<'a> {
    index: &'a KeyIndex,
    value_type: ValueType,
}

impl<'a> IndexLookup<'a> {
    pub(crate) fn new(index: &'a KeyIndex, value_type: ValueType) -> Self {
        Self { index, value_type }
    }

    /// Row positions whose key equals `key` after conversion to the column type, in row order.
    /// Unknown keys and keys that fail conversion yield an empty slice.
    pub fn find(&self, key: &Value) -> &'a [usize] {
        self.index.find(key, self.value_type)
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn distinct_keys(&self) -> usize {
        self.index.distinct_keys()
    }
}
