//! Filmmash - pairwise film voting with Elo-style rankings
//!
//! Voters are shown two films at a time and pick the better one. Each vote
//! moves rating points from the loser to the winner, and the leaderboard
//! orders films by rating.

pub mod config;
pub mod core;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{apply_result, expected_score, PairingPolicy, PairingSelector, RetryPolicy};
pub use error::RatingError;
pub use metrics::Metrics;
pub use models::{Film, MatchProposal, Pairing, RankingEntry, Vote, VoteOutcome};
pub use services::{InMemoryStore, PostgresStore, RatingService, RatingStore, VoteProcessor};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let change = apply_result(1500.0, 1500.0, 32.0);
        assert_eq!(change.winner_after, 1516.0);
        assert!((expected_score(1500.0, 1500.0) - 0.5).abs() < f64::EPSILON);
    }
}
