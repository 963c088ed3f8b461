use serde::{Deserialize, Serialize};
use crate::models::domain::{MatchProposal, RankingEntry, Vote};

/// Response for the pairing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingResponse {
    /// False when the catalog holds fewer than two films
    pub available: bool,
    pub pairing: Option<MatchProposal>,
}

/// Response for the rankings endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingsResponse {
    pub rankings: Vec<RankingEntry>,
    pub offset: u64,
    pub limit: u64,
}

/// Response for the audit trail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentVotesResponse {
    pub votes: Vec<Vote>,
    pub count: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ErrorMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMeta {
    pub request_id: String,
}

impl ErrorResponse {
    /// Build an error body tagged with the current request id
    pub fn new(error: impl Into<String>, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status_code,
            meta: crate::middleware::current_request_id().map(|request_id| ErrorMeta { request_id }),
        }
    }
}
