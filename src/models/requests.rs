use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request to record the outcome of a pairing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitVoteRequest {
    #[serde(alias = "winner_id", rename = "winnerId")]
    pub winner_id: Uuid,
    #[serde(alias = "loser_id", rename = "loserId")]
    pub loser_id: Uuid,
}

/// Query for a new pairing; the previous pairing, if any, is not repeated
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PairingQuery {
    #[serde(default, alias = "previous_first", rename = "previousFirst")]
    pub previous_first: Option<Uuid>,
    #[serde(default, alias = "previous_second", rename = "previousSecond")]
    pub previous_second: Option<Uuid>,
}

/// Leaderboard page
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RankingsQuery {
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    #[validate(range(max = 1000))]
    pub limit: Option<u64>,
}

/// Audit trail page
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RecentVotesQuery {
    #[serde(default)]
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<u64>,
}

/// Catalog import of a single film
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateFilmRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default, alias = "release_year", rename = "releaseYear")]
    #[validate(range(min = 1878, max = 2100))]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_film_validation() {
        let ok = CreateFilmRequest {
            title: "Stalker".to_string(),
            release_year: Some(1979),
            metadata: None,
        };
        assert!(ok.validate().is_ok());

        let blank = CreateFilmRequest {
            title: String::new(),
            release_year: None,
            metadata: None,
        };
        assert!(blank.validate().is_err());

        let too_early = CreateFilmRequest {
            title: "Before cinema".to_string(),
            release_year: Some(1700),
            metadata: None,
        };
        assert!(too_early.validate().is_err());
    }

    #[test]
    fn test_vote_request_accepts_both_casings() {
        let camel: SubmitVoteRequest = serde_json::from_str(
            r#"{"winnerId":"00000000-0000-0000-0000-000000000001","loserId":"00000000-0000-0000-0000-000000000002"}"#,
        )
        .unwrap();
        let snake: SubmitVoteRequest = serde_json::from_str(
            r#"{"winner_id":"00000000-0000-0000-0000-000000000001","loser_id":"00000000-0000-0000-0000-000000000002"}"#,
        )
        .unwrap();

        assert_eq!(camel.winner_id, snake.winner_id);
        assert_eq!(camel.loser_id, Uuid::from_u128(2));
    }
}
