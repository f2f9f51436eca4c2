use serde::{Deserialize, Serialize};

use super::column::Column;
use super::error::{GymError, GymResult};
use super::row::Row;
use super::value::Value;

/// One in-memory entity table. Mutation is row-at-a-time; cross-entity
/// ordering discipline lives in the reconciliation layer, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTable {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl EntityTable {
    #[must_use]
    pub const fn new(name: String, columns: Vec<Column>) -> Self {
        Self {
            name,
            columns,
            rows: Vec::new(),
        }
    }

    pub fn insert(&mut self, row: Row) -> GymResult<()> {
        if row.values.len() != self.columns.len() {
            return Err(GymError::data_load(format!(
                "row has {} values, table '{}' has {} columns",
                row.values.len(),
                self.name,
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn require_column(&self, name: &str) -> GymResult<usize> {
        self.column_index(name)
            .ok_or_else(|| GymError::ColumnNotFound(name.to_string()))
    }

    /// Position of the first row where `column == value`.
    #[must_use]
    pub fn find(&self, column_idx: usize, value: &Value) -> Option<usize> {
        self.rows.iter().position(|r| r.get(column_idx) == value)
    }

    pub fn get_field(&self, row_idx: usize, column: &str) -> GymResult<&Value> {
        let col = self.require_column(column)?;
        Ok(self.rows[row_idx].get(col))
    }

    pub fn set_field(&mut self, row_idx: usize, column: &str, value: Value) -> GymResult<()> {
        let col = self.require_column(column)?;
        self.rows[row_idx].values[col] = value;
        Ok(())
    }

    pub fn delete_row(&mut self, row_idx: usize) -> Row {
        self.rows.remove(row_idx)
    }
}
