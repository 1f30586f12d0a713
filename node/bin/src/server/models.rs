use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(super) struct RootEndQuery {
    pub from_chain: Option<String>,
    pub hash: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RootEndResponse {
    /// Finalization time in milliseconds since the Unix epoch, as a decimal string.
    pub root_end: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub err: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    #[serde(rename = "Status")]
    pub status: String,
}
