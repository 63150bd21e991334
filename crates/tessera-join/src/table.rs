use crate::error::{JoinError, JoinResult};
use crate::index::{IndexLookup, KeyIndex};
use crate::row_adapter::{ColumnFunction, RowAdapter};
use crate::signature::RowSignature;
use crate::value::{Value, ValueType};
use std::collections::HashSet;
use std::fmt;

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
use rayon::prelude::*;

/// Read-only table with hash indexes on its key columns, as consumed by join execution.
///
/// Column positions refer to [`IndexedTable::all_columns`], which is sorted by name and
/// independent of the order columns were declared in.
pub trait IndexedTable: fmt::Debug + Send + Sync {
    fn key_columns(&self) -> &[String];
    fn all_columns(&self) -> &[String];
    fn row_signature(&self) -> &RowSignature;
    fn num_rows(&self) -> usize;

    /// Lookup over the index of the key column at `column`.
    fn column_index(&self, column: usize) -> JoinResult<IndexLookup<'_>>;

    /// Raw values of the column at `column`, key or not.
    fn column_reader(&self, column: usize) -> JoinResult<ColumnReader<'_>>;

    fn column_position(&self, name: &str) -> Option<usize> {
        self.all_columns().iter().position(|c| c == name)
    }
}

/// Reads one column's raw values by row position.
pub struct ColumnReader<'a> {
    num_rows: usize,
    read: Box<dyn Fn(usize) -> Value + Send + Sync + 'a>,
}

impl<'a> ColumnReader<'a> {
    /// `None` when `row` is past the end of the table.
    pub fn read(&self, row: usize) -> Option<Value> {
        (row < self.num_rows).then(|| (self.read)(row))
    }

    pub fn len(&self) -> usize {
        self.num_rows
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }
}

impl fmt::Debug for ColumnReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnReader")
            .field("num_rows", &self.num_rows)
            .finish_non_exhaustive()
    }
}

/// [`IndexedTable`] over a materialized collection of opaque rows.
pub struct RowBasedIndexedTable<R> {
    rows: Vec<R>,
    signature: RowSignature,
    key_columns: Vec<String>,
    columns: Vec<String>,
    column_types: Vec<ValueType>,
    column_functions: Vec<ColumnFunction<R>>,
    indexes: Vec<Option<KeyIndex>>,
}

impl<R: Send + Sync> RowBasedIndexedTable<R> {
    /// Builds one index per key column.
    ///
    /// Key columns must be distinct and declared in `signature`; both are checked before any
    /// index is built. Rows whose key value is null or does not convert to the column type are
    /// left out of that column's index.
    pub fn new<A, I, S>(
        rows: Vec<R>,
        adapter: &A,
        signature: RowSignature,
        key_columns: I,
    ) -> JoinResult<Self>
    where
        A: RowAdapter<R> + ?Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key_columns: Vec<String> = key_columns.into_iter().map(Into::into).collect();

        let has_duplicates = {
            let mut seen = HashSet::with_capacity(key_columns.len());
            !key_columns.iter().all(|c| seen.insert(c.as_str()))
        };
        if has_duplicates {
            return Err(JoinError::DuplicateKeyColumns { key_columns });
        }
        if let Some(missing) = key_columns.iter().find(|c| !signature.contains(c.as_str())) {
            return Err(JoinError::UnknownKeyColumn {
                column: missing.clone(),
                columns: signature.column_names().map(str::to_string).collect(),
            });
        }

        let mut sorted: Vec<(String, ValueType)> = signature
            .iter()
            .map(|(name, ty)| (name.to_string(), ty))
            .collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        let (columns, column_types): (Vec<String>, Vec<ValueType>) = sorted.into_iter().unzip();
        let column_functions: Vec<ColumnFunction<R>> = columns
            .iter()
            .map(|c| adapter.column_function(c))
            .collect();

        let key_positions: Vec<usize> = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| key_columns.contains(c))
            .map(|(pos, _)| pos)
            .collect();

        let built = build_indexes(
            &rows,
            &column_functions,
            &column_types,
            &key_positions,
            cfg!(feature = "parallel"),
        );

        let mut indexes: Vec<Option<KeyIndex>> = (0..columns.len()).map(|_| None).collect();
        for (pos, index) in built {
            log::debug!(
                "indexed key column {} ({}): {} rows, {} distinct keys",
                columns[pos],
                column_types[pos],
                rows.len(),
                index.distinct_keys()
            );
            indexes[pos] = Some(index);
        }

        Ok(Self {
            rows,
            signature,
            key_columns,
            columns,
            column_types,
            column_functions,
            indexes,
        })
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    fn check_column(&self, column: usize) -> JoinResult<()> {
        if column < self.columns.len() {
            Ok(())
        } else {
            Err(JoinError::InvalidColumn {
                position: column,
                columns: self.columns.len(),
            })
        }
    }
}

/// Builds the index of every column in `key_positions`, concurrently when `parallel` is set and
/// the crate was built with rayon. Each index reads only its own column.
fn build_indexes<R: Sync>(
    rows: &[R],
    column_functions: &[ColumnFunction<R>],
    column_types: &[ValueType],
    key_positions: &[usize],
    parallel: bool,
) -> Vec<(usize, KeyIndex)> {
    let build = |pos: usize| {
        (
            pos,
            KeyIndex::build(rows, &column_functions[pos], column_types[pos]),
        )
    };

    #[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
    {
        if parallel {
            return key_positions.par_iter().map(|&pos| build(pos)).collect();
        }
    }
    #[cfg(not(all(feature = "parallel", not(target_arch = "wasm32"))))]
    {
        let _ = parallel;
    }

    key_positions.iter().map(|&pos| build(pos)).collect()
}

impl<R: Send + Sync> IndexedTable for RowBasedIndexedTable<R> {
    fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    fn all_columns(&self) -> &[String] {
        &self.columns
    }

    fn row_signature(&self) -> &RowSignature {
        &self.signature
    }

    fn num_rows(&self) -> usize {
        self.rows.len()
    }

    fn column_index(&self, column: usize) -> JoinResult<IndexLookup<'_>> {
        self.check_column(column)?;
        match &self.indexes[column] {
            Some(index) => Ok(IndexLookup::new(index, self.column_types[column])),
            None => Err(JoinError::NotAKeyColumn { position: column }),
        }
    }

    fn column_reader(&self, column: usize) -> JoinResult<ColumnReader<'_>> {
        self.check_column(column)?;
        let rows = &self.rows;
        let column_fn = &self.column_functions[column];
        Ok(ColumnReader {
            num_rows: rows.len(),
            read: Box::new(move |row| column_fn(&rows[row])),
        })
    }
}

impl<R> fmt::Debug for RowBasedIndexedTable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowBasedIndexedTable")
            .field("num_rows", &self.rows.len())
            .field("columns", &self.columns)
            .field("key_columns", &self.key_columns)
            .finish_non_exhaustive()
    }
}
