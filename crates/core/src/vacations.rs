use chrono::NaiveDate;
use tracing::debug;

use crate::domain::vacation::VacationRule;
use crate::tables::{cell, Table, TableError, TableRow};

/// Ordered vacation substitution rules for one company.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VacationIndex {
    rules: Vec<VacationRule>,
}

impl VacationIndex {
    pub fn new(rules: Vec<VacationRule>) -> Self {
        Self { rules }
    }

    /// Builds the index from the Vacations table. The first row is a header.
    pub fn from_rows(rows: &[TableRow]) -> Result<Self, TableError> {
        let mut rules = Vec::with_capacity(rows.len().saturating_sub(1));

        for (offset, row) in rows.iter().enumerate().skip(1) {
            let row_number = offset + 1;
            if row.iter().all(|value| value.trim().is_empty()) {
                continue;
            }
            let field = |index: usize, label: &str| -> Result<String, TableError> {
                cell(row, index).map(|value| value.trim().to_string()).ok_or_else(|| {
                    TableError::MalformedRow {
                        table: Table::Vacations,
                        row: row_number,
                        message: format!("missing {label} column"),
                    }
                })
            };

            let standard_name = field(0, "standard name")?;
            let replacement_name = field(1, "replacement name")?;
            let start_raw = field(2, "start date")?;
            let finish_raw = field(3, "finish date")?;
            let start = parse_table_date(&start_raw).ok_or_else(|| TableError::MalformedRow {
                table: Table::Vacations,
                row: row_number,
                message: format!("unreadable start date `{start_raw}`"),
            })?;
            let finish = parse_table_date(&finish_raw).ok_or_else(|| TableError::MalformedRow {
                table: Table::Vacations,
                row: row_number,
                message: format!("unreadable finish date `{finish_raw}`"),
            })?;

            rules.push(VacationRule { standard_name, replacement_name, start, finish });
        }

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[VacationRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns who covers for `candidate` on `as_of`.
    ///
    /// Only the first active rule for the name applies; the replacement is not checked again.
    pub fn resolve<'a>(&'a self, candidate: &'a str, as_of: NaiveDate) -> &'a str {
        match self
            .rules
            .iter()
            .find(|rule| rule.standard_name == candidate && rule.is_active_on(as_of))
        {
            Some(rule) => {
                debug!(
                    event_name = "matrix.vacations.substituted",
                    standard = %rule.standard_name,
                    replacement = %rule.replacement_name,
                    as_of = %as_of,
                    "approver is on vacation, routing to replacement"
                );
                &rule.replacement_name
            }
            None => candidate,
        }
    }

    /// Absent approvers pass through untouched.
    pub fn resolve_slot(&self, candidate: Option<&str>, as_of: NaiveDate) -> Option<String> {
        candidate.map(|name| self.resolve(name, as_of).to_string())
    }
}

/// Parses a vacation date cell from its digit groups.
///
/// Spreadsheet exports write `M/D/YYYY`; a leading four-digit group is read as `YYYY-MM-DD`.
pub fn parse_table_date(raw: &str) -> Option<NaiveDate> {
    let groups: Vec<&str> = raw
        .split(|ch: char| !ch.is_ascii_digit())
        .filter(|group| !group.is_empty())
        .collect();
    if groups.len() < 3 {
        return None;
    }

    let numbers: Vec<u32> =
        groups[..3].iter().map(|group| group.parse::<u32>()).collect::<Result<_, _>>().ok()?;

    if groups[0].len() == 4 {
        NaiveDate::from_ymd_opt(i32::try_from(numbers[0]).ok()?, numbers[1], numbers[2])
    } else {
        NaiveDate::from_ymd_opt(i32::try_from(numbers[2]).ok()?, numbers[0], numbers[1])
    }
}
