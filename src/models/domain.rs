use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A film in the catalog together with its current standing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub rating: f64,
    pub vote_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Catalog entry handed over by the importer
#[derive(Debug, Clone)]
pub struct NewFilm {
    pub title: String,
    pub release_year: Option<i32>,
    pub metadata: serde_json::Value,
}

/// Mutable rating state of a film, as read by the vote processor
///
/// `version` increases by one with every committed vote touching the film.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingRecord {
    pub id: Uuid,
    pub rating: f64,
    pub vote_count: i64,
    pub version: i64,
}

/// Film eligible for pairing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingCandidate {
    pub id: Uuid,
    pub title: String,
    pub vote_count: i64,
}

/// Which slice of the catalog the store hands to the pairing selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOrder {
    /// Fewest votes first
    LeastExposed,
    /// A pseudo-random slice determined by the seed
    Shuffled(u64),
}

/// Two distinct films presented together; order carries no meaning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pairing {
    pub first: Uuid,
    pub second: Uuid,
}

impl Pairing {
    pub fn contains(&self, id: Uuid) -> bool {
        self.first == id || self.second == id
    }

    /// The other member of the pairing, if `id` belongs to it
    pub fn partner_of(&self, id: Uuid) -> Option<Uuid> {
        if self.first == id {
            Some(self.second)
        } else if self.second == id {
            Some(self.first)
        } else {
            None
        }
    }

    /// Same two films, regardless of order
    pub fn same_films(&self, other: &Pairing) -> bool {
        (self.first == other.first && self.second == other.second)
            || (self.first == other.second && self.second == other.first)
    }
}

/// Pairing resolved to displayable candidates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchProposal {
    pub first: PairingCandidate,
    pub second: PairingCandidate,
}

/// One row of the leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub position: u64,
    pub id: Uuid,
    pub title: String,
    pub rating: f64,
    pub vote_count: i64,
}

/// Append-only audit record of a vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: Uuid,
    pub winner_id: Uuid,
    pub loser_id: Uuid,
    pub winner_rating_before: f64,
    pub winner_rating_after: f64,
    pub loser_rating_before: f64,
    pub loser_rating_after: f64,
    pub created_at: DateTime<Utc>,
}

/// Conditional write of one film's new rating
#[derive(Debug, Clone, Copy)]
pub struct RecordUpdate {
    pub id: Uuid,
    pub expected_version: i64,
    pub rating: f64,
}

/// Everything a store must apply atomically for one vote
#[derive(Debug, Clone)]
pub struct VoteCommit {
    pub winner: RecordUpdate,
    pub loser: RecordUpdate,
    /// Audit record, absent when the vote trail is disabled
    pub vote: Option<Vote>,
}

/// Result of a conditional commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// A record changed (or vanished) since it was read
    Conflict,
}

/// Film standing right after a vote
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSnapshot {
    pub id: Uuid,
    pub previous_rating: f64,
    pub rating: f64,
    pub vote_count: i64,
}

/// Result of a successful vote
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub vote_id: Uuid,
    pub winner: RatingSnapshot,
    pub loser: RatingSnapshot,
    /// Number of attempts the commit needed
    pub attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairing_same_films_ignores_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let forward = Pairing { first: a, second: b };
        let backward = Pairing { first: b, second: a };
        assert!(forward.same_films(&backward));
        assert_eq!(forward.partner_of(a), Some(b));
        assert_eq!(forward.partner_of(Uuid::new_v4()), None);
    }
}
