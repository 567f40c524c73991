use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAssignment {
    pub role_name: String,
    pub role_description: String,
    pub approver_name: String,
}
