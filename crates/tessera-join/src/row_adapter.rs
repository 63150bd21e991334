use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Extracts one column's raw value from a row.
pub type ColumnFunction<R> = Arc<dyn Fn(&R) -> Value + Send + Sync>;

/// Adapts an opaque row type to named columns.
///
/// Unknown columns are not an error: the returned function yields [`Value::Null`] for every row,
/// which the index builder treats like any other null.
pub trait RowAdapter<R> {
    fn column_function(&self, column: &str) -> ColumnFunction<R>;
}

/// Rows stored as `Vec<Value>`, laid out by a fixed column order.
#[derive(Clone, Debug, Default)]
pub struct ArrayRowAdapter {
    column_index: HashMap<String, usize>,
}

impl ArrayRowAdapter {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let column_index = columns
            .into_iter()
            .enumerate()
            .map(|(idx, c)| (c.into(), idx))
            .collect();
        Self { column_index }
    }
}

impl RowAdapter<Vec<Value>> for ArrayRowAdapter {
    fn column_function(&self, column: &str) -> ColumnFunction<Vec<Value>> {
        match self.column_index.get(column).copied() {
            Some(idx) => {
                Arc::new(move |row: &Vec<Value>| row.get(idx).cloned().unwrap_or_default())
            }
            None => Arc::new(|_: &Vec<Value>| Value::Null),
        }
    }
}

/// Rows stored as column-name keyed maps. Missing entries read as null.
#[derive(Clone, Copy, Debug, Default)]
pub struct MapRowAdapter;

impl RowAdapter<HashMap<String, Value>> for MapRowAdapter {
    fn column_function(&self, column: &str) -> ColumnFunction<HashMap<String, Value>> {
        let column = column.to_string();
        Arc::new(move |row: &HashMap<String, Value>| {
            row.get(&column).cloned().unwrap_or_default()
        })
    }
}
