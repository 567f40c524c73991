use serde::{Deserialize, Serialize};

/// A fixed, out-of-band access grant with exactly one approver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleApproverEntry {
    pub menu_label: String,
    pub client: String,
    pub client_name: String,
    pub approver: String,
    pub role_text: String,
}
