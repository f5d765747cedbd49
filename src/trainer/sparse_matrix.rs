//! Immutable coordinate-format sparse matrix.

use itertools::Itertools;

use crate::prelude::*;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Entry {
    pub row: usize,
    pub column: usize,
    pub value: f64,
}

impl Entry {
    pub const fn new(row: usize, column: usize, value: f64) -> Self {
        Self { row, column, value }
    }
}

impl From<(usize, usize, f64)> for Entry {
    fn from((row, column, value): (usize, usize, f64)) -> Self {
        Self::new(row, column, value)
    }
}

/// Entries are sorted by `(row, column)` and unique.
/// Explicit zeros are kept as they are.
#[derive(Debug, Clone)]
pub struct SparseMatrix {
    n_rows: usize,
    n_columns: usize,
    entries: Vec<Entry>,
}

impl SparseMatrix {
    pub fn new(n_rows: usize, n_columns: usize, mut entries: Vec<Entry>) -> Result<Self> {
        for entry in &entries {
            ensure!(
                entry.row < n_rows && entry.column < n_columns,
                "entry ({}, {}) is out of the {}×{} bounds",
                entry.row,
                entry.column,
                n_rows,
                n_columns,
            );
            ensure!(
                entry.value.is_finite(),
                "entry ({}, {}) has a non-finite value {}",
                entry.row,
                entry.column,
                entry.value,
            );
        }
        entries.sort_unstable_by_key(|entry| (entry.row, entry.column));
        if let Some((entry, _)) = entries
            .iter()
            .tuple_windows()
            .find(|(lhs, rhs)| (lhs.row, lhs.column) == (rhs.row, rhs.column))
        {
            bail!("duplicate entry ({}, {})", entry.row, entry.column);
        }
        Ok(Self {
            n_rows,
            n_columns,
            entries,
        })
    }

    #[cfg(test)]
    pub fn from_triples(
        n_rows: usize,
        n_columns: usize,
        triples: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Result<Self> {
        Self::new(n_rows, n_columns, triples.into_iter().map(Entry::from).collect())
    }

    #[cfg(test)]
    pub const fn empty(n_rows: usize, n_columns: usize) -> Self {
        Self {
            n_rows,
            n_columns,
            entries: Vec::new(),
        }
    }

    pub const fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub const fn n_columns(&self) -> usize {
        self.n_columns
    }

    /// Number of stored entries, explicit zeros included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|entry| entry.value)
    }

    /// Number of nonzero entries in the row.
    #[cfg(test)]
    pub fn row_scope(&self, row: usize) -> usize {
        let start = self.entries.partition_point(|entry| entry.row < row);
        self.entries[start..]
            .iter()
            .take_while(|entry| entry.row == row)
            .filter(|entry| entry.value != 0.0)
            .count()
    }

    /// Number of nonzero entries in the column.
    #[cfg(test)]
    pub fn column_scope(&self, column: usize) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.column == column && entry.value != 0.0)
            .count()
    }

    /// Number of nonzero entries.
    pub fn n_nonzero(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value != 0.0)
            .count()
    }
}
