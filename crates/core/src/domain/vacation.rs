use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationRule {
    pub standard_name: String,
    pub replacement_name: String,
    pub start: NaiveDate,
    pub finish: NaiveDate,
}

impl VacationRule {
    /// Inclusive on both ends.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.finish
    }
}
