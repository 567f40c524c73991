use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One row of a matrix table, already split into text cells.
pub type TableRow = Vec<String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Roles,
    Emails,
    Vacations,
    Singles,
}

impl Table {
    pub const ALL: [Table; 4] = [Table::Roles, Table::Emails, Table::Vacations, Table::Singles];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Roles => "roles",
            Self::Emails => "emails",
            Self::Vacations => "vacations",
            Self::Singles => "singles",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("{table} table not found at `{path}`")]
    Missing { table: Table, path: PathBuf },
    #[error("could not read {table} table: {message}")]
    Read { table: Table, message: String },
    #[error("{table} table row {row}: {message}")]
    MalformedRow { table: Table, row: usize, message: String },
}

/// Supplies the raw rows of a company's matrix tables.
///
/// Rows are returned exactly as stored, header rows included; interpreting them is the job of
/// the individual lookups.
pub trait TableSource {
    fn read_table(&self, table: Table) -> Result<Vec<TableRow>, TableError>;
}

impl<T> TableSource for &T
where
    T: TableSource + ?Sized,
{
    fn read_table(&self, table: Table) -> Result<Vec<TableRow>, TableError> {
        (**self).read_table(table)
    }
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryTableSource {
    tables: HashMap<Table, Vec<TableRow>>,
}

impl InMemoryTableSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table<R, C>(mut self, table: Table, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let rows = rows.into_iter().map(|row| row.into_iter().map(Into::into).collect()).collect();
        self.tables.insert(table, rows);
        self
    }
}

impl TableSource for InMemoryTableSource {
    fn read_table(&self, table: Table) -> Result<Vec<TableRow>, TableError> {
        Ok(self.tables.get(&table).cloned().unwrap_or_default())
    }
}

pub(crate) fn cell(row: &[String], index: usize) -> Option<&str> {
    row.get(index).map(String::as_str)
}
