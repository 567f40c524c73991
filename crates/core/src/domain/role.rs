use serde::{Deserialize, Serialize};

/// Literal routing-type marker for roles whose approver depends on the requester's region.
pub const REGIONAL_MARKER: &str = "Regional";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingType {
    Regional,
    Single,
}

impl RoutingType {
    pub fn from_cell(value: &str) -> Self {
        if value == REGIONAL_MARKER {
            Self::Regional
        } else {
            Self::Single
        }
    }
}

/// A named access grant and the approver slots that can sign off on it.
///
/// `approvers` holds either one slot used for every region or one slot per region, indexed by
/// region ordinal. A `None` slot is a blank cell in the matrix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub description: String,
    pub approvers: Vec<Option<String>>,
}

impl Role {
    pub fn is_regional(&self) -> bool {
        self.approvers.len() > 1
    }

    /// Approver slot for the given region; single-approver roles ignore the region.
    pub fn approver_for(&self, region_index: usize) -> Option<Option<&str>> {
        let slot = if self.is_regional() { region_index } else { 0 };
        self.approvers.get(slot).map(Option::as_deref)
    }
}
