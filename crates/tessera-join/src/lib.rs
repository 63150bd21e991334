//! Hash-indexed row tables for join lookups.
//!
//! A [`RowBasedIndexedTable`] is built once from materialized rows, a [`RowAdapter`] that reads
//! named columns out of each row, and a [`RowSignature`]. Each key column gets one equality
//! index from converted key to row positions; the table is read-only afterwards and safe to
//! share between threads.

#![forbid(unsafe_code)]

mod error;
mod index;
mod row_adapter;
mod signature;
mod table;
mod value;

pub use crate::error::{JoinError, JoinResult};
pub use crate::index::IndexLookup;
pub use crate::row_adapter::{ArrayRowAdapter, ColumnFunction, MapRowAdapter, RowAdapter};
pub use crate::signature::RowSignature;
pub use crate::table::{ColumnReader, IndexedTable, RowBasedIndexedTable};
pub use crate::value::{Value, ValueType};
