use crate::error::{JoinError, JoinResult};
use crate::value::ValueType;
use std::collections::HashMap;

/// Ordered list of column names with their declared types.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowSignature {
    columns: Vec<(String, ValueType)>,
    positions: HashMap<String, usize>,
}

impl RowSignature {
    pub fn new<I, S>(columns: I) -> JoinResult<Self>
    where
        I: IntoIterator<Item = (S, ValueType)>,
        S: Into<String>,
    {
        let mut signature = Self::default();
        for (name, value_type) in columns {
            signature.push(name, value_type)?;
        }
        Ok(signature)
    }

    pub fn push(&mut self, name: impl Into<String>, value_type: ValueType) -> JoinResult<()> {
        let name = name.into();
        if self.positions.contains_key(&name) {
            return Err(JoinError::DuplicateColumn { column: name });
        }
        self.positions.insert(name.clone(), self.columns.len());
        self.columns.push((name, value_type));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn column_type(&self, name: &str) -> Option<ValueType> {
        let idx = *self.positions.get(name)?;
        Some(self.columns[idx].1)
    }

    /// Position of `name` in declaration order.
    pub fn declared_position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ValueType)> + '_ {
        self.columns.iter().map(|(name, ty)| (name.as_str(), *ty))
    }
}
