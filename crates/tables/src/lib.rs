//! CSV-backed [`TableSource`] for matrix exports.
//!
//! Each company keeps its four tables side by side in one directory:
//! `Roles.csv`, `Email.csv`, `Vacations.csv` and `Singles.csv`.

use std::path::{Path, PathBuf};

use rolematrix_core::tables::{Table, TableError, TableRow, TableSource};
use tracing::debug;

const UTF8_BOM: char = '\u{feff}';

pub fn file_name(table: Table) -> &'static str {
    match table {
        Table::Roles => "Roles.csv",
        Table::Emails => "Email.csv",
        Table::Vacations => "Vacations.csv",
        Table::Singles => "Singles.csv",
    }
}

#[derive(Clone, Debug)]
pub struct CsvTableSource {
    dir: PathBuf,
}

impl CsvTableSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, table: Table) -> PathBuf {
        self.dir.join(file_name(table))
    }
}

impl TableSource for CsvTableSource {
    fn read_table(&self, table: Table) -> Result<Vec<TableRow>, TableError> {
        let path = self.path_for(table);
        if !path.is_file() {
            return Err(TableError::Missing { table, path });
        }

        let read_error = |error: csv::Error| TableError::Read {
            table,
            message: format!("{}: {error}", path.display()),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)
            .map_err(read_error)?;

        let mut rows = Vec::new();
        for record in reader.byte_records() {
            let record = record.map_err(read_error)?;
            // Legacy exports are not always UTF-8.
            let row: TableRow =
                record.iter().map(|field| String::from_utf8_lossy(field).into_owned()).collect();
            rows.push(row);
        }

        if let Some(first) = rows.first_mut().and_then(|row| row.first_mut()) {
            if let Some(stripped) = first.strip_prefix(UTF8_BOM) {
                *first = stripped.to_string();
            }
        }

        debug!(
            event_name = "matrix.tables.read",
            table = %table,
            path = %path.display(),
            rows = rows.len(),
            "matrix table read"
        );
        Ok(rows)
    }
}
