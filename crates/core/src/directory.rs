use std::collections::HashMap;

use tracing::debug;

use crate::domain::single::SingleApproverEntry;
use crate::tables::{cell, Table, TableError, TableRow};

/// Approver name to email address. Later rows win when a name repeats.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmailDirectory {
    emails: HashMap<String, String>,
}

impl EmailDirectory {
    pub fn from_rows(rows: &[TableRow]) -> Self {
        let mut emails = HashMap::with_capacity(rows.len());
        let mut skipped = 0_usize;

        for row in rows {
            match (cell(row, 0), cell(row, 1)) {
                (Some(name), Some(email)) if !name.trim().is_empty() => {
                    emails.insert(name.trim().to_string(), email.trim().to_string());
                }
                _ => skipped += 1,
            }
        }

        debug!(
            event_name = "matrix.directory.emails_loaded",
            entries = emails.len(),
            skipped,
            "email directory loaded"
        );
        Self { emails }
    }

    pub fn lookup(&self, approver: &str) -> Option<&str> {
        self.emails.get(approver).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

impl<N, E> FromIterator<(N, E)> for EmailDirectory
where
    N: Into<String>,
    E: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, E)>>(iter: I) -> Self {
        Self { emails: iter.into_iter().map(|(name, email)| (name.into(), email.into())).collect() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SingleApproverDirectory {
    entries: Vec<SingleApproverEntry>,
}

impl SingleApproverDirectory {
    pub fn new(entries: Vec<SingleApproverEntry>) -> Self {
        Self { entries }
    }

    /// Builds the directory from the Singles table. The first row is a header.
    pub fn from_rows(rows: &[TableRow]) -> Result<Self, TableError> {
        let mut entries = Vec::with_capacity(rows.len().saturating_sub(1));

        for (offset, row) in rows.iter().enumerate().skip(1) {
            if row.iter().all(|value| value.trim().is_empty()) {
                continue;
            }
            if row.len() < 5 {
                return Err(TableError::MalformedRow {
                    table: Table::Singles,
                    row: offset + 1,
                    message: format!("expected 5 columns, found {}", row.len()),
                });
            }

            entries.push(SingleApproverEntry {
                menu_label: row[0].trim().to_string(),
                client: row[1].trim().to_string(),
                client_name: row[2].trim().to_string(),
                approver: row[3].trim().to_string(),
                role_text: row[4].trim().to_string(),
            });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[SingleApproverEntry] {
        &self.entries
    }

    pub fn find(&self, menu_label: &str) -> Option<&SingleApproverEntry> {
        self.entries.iter().find(|entry| entry.menu_label == menu_label)
    }

    pub fn menu_labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.menu_label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{EmailDirectory, SingleApproverDirectory};
    use crate::tables::TableError;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter().map(|row| row.iter().map(|cell| cell.to_string()).collect()).collect()
    }

    #[test]
    fn email_lookup_uses_last_entry_for_repeated_names() {
        let directory = EmailDirectory::from_rows(&rows(&[
            &["Alice", "alice@old.example.com"],
            &["Bob", "bob@example.com"],
            &["Alice", "alice@example.com"],
        ]));

        assert_eq!(directory.len(), 2);
        assert_eq!(directory.lookup("Alice"), Some("alice@example.com"));
        assert_eq!(directory.lookup("Carol"), None);
    }

    #[test]
    fn email_rows_without_two_fields_are_skipped() {
        let directory = EmailDirectory::from_rows(&rows(&[&["Alice"], &["", "x@example.com"]]));
        assert!(directory.is_empty());
    }

    #[test]
    fn singles_skip_header_and_keep_order() {
        let directory = SingleApproverDirectory::from_rows(&rows(&[
            &["Menu", "Client", "Client Name", "Approver", "Role"],
            &["Badge", "ProdC1", "Production", "Frank", "Badge access"],
            &["Parking", "ProdC1", "Production", "Grace", "Parking pass"],
        ]))
        .expect("singles should parse");

        assert_eq!(directory.menu_labels().collect::<Vec<_>>(), vec!["Badge", "Parking"]);
        assert_eq!(directory.find("Parking").map(|entry| entry.approver.as_str()), Some("Grace"));
        assert!(directory.find("Vault").is_none());
    }

    #[test]
    fn short_single_rows_are_rejected() {
        let error = SingleApproverDirectory::from_rows(&rows(&[
            &["Menu", "Client", "Client Name", "Approver", "Role"],
            &["Badge", "ProdC1"],
        ]))
        .expect_err("short row should fail");

        assert!(matches!(error, TableError::MalformedRow { row: 2, .. }));
    }
}
