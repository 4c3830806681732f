use serde::{Deserialize, Serialize};

/// Body of `GET <endpoint>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantCount {
    pub participant_count: u32,
}

/// Body of `POST <endpoint>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub name: String,
}

/// Successful reply to a join. `giver_to` stays `None` until the service has enough participants
/// to make an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResult {
    pub participant_name: String,
    pub giver_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<i64>,
}

impl JoinResult {
    pub fn is_assigned(&self) -> bool {
        self.giver_to.is_some()
    }
}

/// Body of any non-2xx reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// A transient notification. Ids only grow, so a late dismissal can't clear a newer notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub title: String,
    pub message: String,
}
