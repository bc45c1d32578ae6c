//! Eagerly materialized query results

use crate::error::ChainResult;
use crate::row::Row;
use crate::value::Value;
use serde::de::DeserializeOwned;

/// All rows returned by one executed command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl ResultSet {
    /// Pair each tuple with the column list.
    pub fn from_tuples(columns: Vec<String>, tuples: Vec<Vec<Value>>) -> Self {
        let rows = tuples
            .into_iter()
            .map(|values| Row::from_parts(&columns, values))
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn all(&self) -> &[Row] {
        &self.rows
    }

    /// Row at a 1-based `position`, the way a database view numbers them.
    ///
    /// Positions past the end return the last row and positions below 1 return the first;
    /// `None` only when the result is empty.
    pub fn rows(&self, position: usize) -> Option<&Row> {
        let position = position.clamp(1, self.count().max(1));
        self.rows.get(position - 1)
    }

    /// Reshape every row into `T` via JSON.
    pub fn transfer<T: DeserializeOwned>(&self) -> ChainResult<Vec<T>> {
        self.rows.iter().map(|row| row.transfer()).collect()
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
