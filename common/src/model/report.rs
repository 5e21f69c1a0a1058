use serde::{Deserialize, Serialize};

/// Number of documents sharing one `WardCommittee` value.
///
/// Produced by the ward-count reports, sorted ascending by ward. A ward of
/// `None` groups documents that never had the field set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardCount {
    pub ward_committee: Option<String>,
    pub count: u64,
}
