use serde::{Deserialize, Serialize};
use tracing::info;

use crate::data::FeatureVector;

use super::error::PrepareError;

/// One value of a [`Table`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Missing,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Missing, Into::into)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new<C: Into<Cell>>(name: impl Into<String>, cells: impl IntoIterator<Item = C>) -> Self {
        Self {
            name: name.into(),
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    pub fn missing(&self) -> usize {
        self.cells.iter().filter(|c| c.is_missing()).count()
    }

    /// Fraction of missing cells; `0.0` for an empty column.
    pub fn missing_ratio(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.missing() as f64 / self.cells.len() as f64
    }

    /// `true` if any cell holds text.
    pub fn is_text(&self) -> bool {
        self.cells.iter().any(|c| matches!(c, Cell::Text(_)))
    }
}

/// In-memory table of equally long, uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: Vec<Column>) -> Result<Self, PrepareError> {
        let mut table = Self::new();
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    pub fn push_column(&mut self, column: Column) -> Result<(), PrepareError> {
        if self.column(&column.name).is_some() {
            return Err(PrepareError::DuplicateColumn { name: column.name });
        }
        let expected = self.columns.first().map(|c| c.cells.len());
        if let Some(expected) = expected.filter(|&rows| rows != column.cells.len()) {
            return Err(PrepareError::RaggedColumn {
                actual: column.cells.len(),
                name: column.name,
                expected,
            });
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.cells.len())
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    /// Renames `from` to `to`. Returns `false` if `from` does not exist.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<bool, PrepareError> {
        if from != to && self.column(to).is_some() {
            return Err(PrepareError::DuplicateColumn {
                name: to.to_string(),
            });
        }
        match self.column_mut(from) {
            Some(column) => {
                column.name = to.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let index = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(index))
    }

    /// Keeps only columns for which `keep` returns `true`; returns the removed names.
    pub fn retain_columns<F: FnMut(&Column) -> bool>(&mut self, mut keep: F) -> Vec<String> {
        let mut removed = Vec::new();
        self.columns.retain(|c| {
            let kept = keep(c);
            if !kept {
                removed.push(c.name.clone());
            }
            kept
        });
        removed
    }

    /// Drops every column whose missing ratio is strictly above `threshold`.
    pub fn drop_columns_with_high_missing(
        &mut self,
        threshold: f64,
    ) -> Result<Vec<String>, PrepareError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(PrepareError::InvalidThreshold { threshold });
        }
        let dropped = self.retain_columns(|c| c.missing_ratio() <= threshold);
        info!(
            threshold,
            dropped = dropped.len(),
            remaining = self.width(),
            "Dropped columns with too many missing values"
        );
        Ok(dropped)
    }

    /// Row-major numeric features, one vector per row. Missing cells become `0.0`.
    pub fn feature_matrix(&self) -> Result<Vec<FeatureVector>, PrepareError> {
        let mut matrix = vec![Vec::with_capacity(self.width()); self.rows()];
        for column in &self.columns {
            for (row, cell) in column.cells.iter().enumerate() {
                let value = match cell {
                    Cell::Missing => 0.0,
                    Cell::Number(n) => *n as f32,
                    Cell::Text(_) => {
                        return Err(PrepareError::NonNumeric {
                            column: column.name.clone(),
                            row,
                        });
                    }
                };
                matrix[row].push(value);
            }
        }
        Ok(matrix)
    }
}
