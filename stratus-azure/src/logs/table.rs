//! Query results as tables of cells.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::error::{LogsQueryError, collapse};
use super::models::{QueryResults, Table};
use crate::{AzureError, Result};

/// A column declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogsTableColumn {
    /// Column name.
    pub name: String,
    /// Declared Kusto type (`string`, `long`, `datetime`, ...).
    pub column_type: String,
}

/// One value of a table, with its coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct LogsTableCell {
    column_name: String,
    column_type: String,
    column_index: usize,
    row_index: usize,
    value: Value,
}

impl LogsTableCell {
    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn column_type(&self) -> &str {
        &self.column_type
    }

    pub fn column_index(&self) -> usize {
        self.column_index
    }

    pub fn row_index(&self) -> usize {
        self.row_index
    }

    /// The raw JSON value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }

    /// Integer value. Kusto sends `long` as a number, but some clients
    /// stringify it, so numeric strings are accepted too.
    pub fn as_i64(&self) -> Option<i64> {
        match &self.value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match &self.value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &self.value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|v| v != 0),
            _ => None,
        }
    }

    /// A `datetime` value parsed from its RFC 3339 text.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        let text = self.value.as_str()?;
        DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|at| at.with_timezone(&Utc))
    }
}

/// A row: a view over the cells of one row of a [`LogsTable`].
#[derive(Debug, Clone, Copy)]
pub struct LogsTableRow<'a> {
    index: usize,
    cells: &'a [LogsTableCell],
}

impl<'a> LogsTableRow<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn cells(&self) -> &'a [LogsTableCell] {
        self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at a column position.
    pub fn get(&self, column_index: usize) -> Option<&'a LogsTableCell> {
        self.cells.get(column_index)
    }

    /// Cell of a named column.
    pub fn column(&self, name: &str) -> Option<&'a LogsTableCell> {
        self.cells.iter().find(|cell| cell.column_name == name)
    }
}

/// A result table. Cells are stored once; rows are views over them.
#[derive(Debug, Clone, PartialEq)]
pub struct LogsTable {
    name: String,
    columns: Vec<LogsTableColumn>,
    cells: Vec<LogsTableCell>,
    row_starts: Vec<usize>,
}

impl LogsTable {
    fn from_wire(table: Table) -> Result<Self> {
        let columns: Vec<LogsTableColumn> = table
            .columns
            .into_iter()
            .map(|c| LogsTableColumn {
                name: c.name,
                column_type: c.column_type,
            })
            .collect();

        let mut cells = Vec::with_capacity(table.rows.len() * columns.len());
        let mut row_starts = Vec::with_capacity(table.rows.len());

        for (row_index, row) in table.rows.into_iter().enumerate() {
            if row.len() > columns.len() {
                return Err(AzureError::Serialization(format!(
                    "table '{}' row {row_index} has {} values for {} columns",
                    table.name,
                    row.len(),
                    columns.len()
                )));
            }
            row_starts.push(cells.len());
            for (column_index, value) in row.into_iter().enumerate() {
                let column = &columns[column_index];
                cells.push(LogsTableCell {
                    column_name: column.name.clone(),
                    column_type: column.column_type.clone(),
                    column_index,
                    row_index,
                    value,
                });
            }
        }

        Ok(Self {
            name: table.name,
            columns,
            cells,
            row_starts,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[LogsTableColumn] {
        &self.columns
    }

    /// Every cell, row-major.
    pub fn cells(&self) -> &[LogsTableCell] {
        &self.cells
    }

    pub fn row_count(&self) -> usize {
        self.row_starts.len()
    }

    pub fn row(&self, index: usize) -> Option<LogsTableRow<'_>> {
        let start = *self.row_starts.get(index)?;
        let end = self
            .row_starts
            .get(index + 1)
            .copied()
            .unwrap_or(self.cells.len());
        Some(LogsTableRow {
            index,
            cells: &self.cells[start..end],
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = LogsTableRow<'_>> + '_ {
        (0..self.row_count()).filter_map(move |i| self.row(i))
    }
}

/// Whether a query produced its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogsQueryResultStatus {
    /// No error.
    Success,
    /// An error came back along with some tables.
    PartialFailure,
    /// An error came back with no tables.
    Failure,
}

/// Result of one logs query.
#[derive(Debug, Clone, PartialEq)]
pub struct LogsQueryResult {
    tables: Vec<LogsTable>,
    statistics: Option<Value>,
    visualization: Option<Value>,
    error: Option<LogsQueryError>,
}

impl LogsQueryResult {
    pub(crate) fn from_wire(results: QueryResults) -> Result<Self> {
        let tables = results
            .tables
            .unwrap_or_default()
            .into_iter()
            .map(LogsTable::from_wire)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            tables,
            statistics: results.statistics,
            visualization: results.render,
            error: results.error.as_ref().map(collapse),
        })
    }

    pub fn tables(&self) -> &[LogsTable] {
        &self.tables
    }

    /// The first table, which is the primary result of most queries.
    pub fn table(&self) -> Option<&LogsTable> {
        self.tables.first()
    }

    /// Statistics, when requested with `include_statistics`.
    pub fn statistics(&self) -> Option<&Value> {
        self.statistics.as_ref()
    }

    /// Visualization data, when requested with `include_visualization`.
    pub fn visualization(&self) -> Option<&Value> {
        self.visualization.as_ref()
    }

    /// The error that came with this result, if any.
    pub fn error(&self) -> Option<&LogsQueryError> {
        self.error.as_ref()
    }

    pub fn status(&self) -> LogsQueryResultStatus {
        match (&self.error, self.tables.is_empty()) {
            (None, _) => LogsQueryResultStatus::Success,
            (Some(_), false) => LogsQueryResultStatus::PartialFailure,
            (Some(_), true) => LogsQueryResultStatus::Failure,
        }
    }
}
