use crate::core::{apply_result, RetryPolicy};
use crate::error::RatingError;
use crate::metrics::Metrics;
use crate::models::{
    CommitOutcome, RatingRecord, RatingSnapshot, RecordUpdate, Vote, VoteCommit, VoteOutcome,
};
use crate::services::store::RatingStore;
use std::sync::Arc;
use uuid::Uuid;

/// Applies vote outcomes to film ratings
///
/// Each vote is an optimistic read-compute-commit cycle: read both films'
/// rating records, compute the Elo update, then commit conditionally on the
/// versions that were read. A lost race re-reads and tries again after a
/// backoff, until the attempt budget runs out.
#[derive(Clone)]
pub struct VoteProcessor {
    store: Arc<dyn RatingStore>,
    k_factor: f64,
    retry: RetryPolicy,
    record_votes: bool,
    metrics: Option<Arc<Metrics>>,
}

impl VoteProcessor {
    pub fn new(store: Arc<dyn RatingStore>, k_factor: f64, retry: RetryPolicy, record_votes: bool) -> Self {
        Self {
            store,
            k_factor,
            retry,
            record_votes,
            metrics: None,
        }
    }

    /// Count outcomes, conflicts and retries into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn k_factor(&self) -> f64 {
        self.k_factor
    }

    pub async fn submit_vote(&self, winner_id: Uuid, loser_id: Uuid) -> Result<VoteOutcome, RatingError> {
        let result = self.process(winner_id, loser_id).await;

        if let Some(metrics) = &self.metrics {
            let outcome = match &result {
                Ok(_) => "committed",
                Err(RatingError::InvalidVote(_)) => "invalid",
                Err(RatingError::NotFound(_)) => "not_found",
                Err(RatingError::Conflict { .. }) => "exhausted",
                Err(_) => "error",
            };
            metrics.observe_vote(outcome);
        }
        result
    }

    async fn process(&self, winner_id: Uuid, loser_id: Uuid) -> Result<VoteOutcome, RatingError> {
        if winner_id == loser_id {
            return Err(RatingError::InvalidVote(
                "winner and loser must be different films".to_string(),
            ));
        }

        let mut attempt = 1;
        loop {
            let (winner, loser) = self.load_pair(winner_id, loser_id).await?;
            let change = apply_result(winner.rating, loser.rating, self.k_factor);

            let vote = Vote {
                id: Uuid::new_v4(),
                winner_id,
                loser_id,
                winner_rating_before: change.winner_before,
                winner_rating_after: change.winner_after,
                loser_rating_before: change.loser_before,
                loser_rating_after: change.loser_after,
                created_at: chrono::Utc::now(),
            };

            let commit = VoteCommit {
                winner: RecordUpdate {
                    id: winner_id,
                    expected_version: winner.version,
                    rating: change.winner_after,
                },
                loser: RecordUpdate {
                    id: loser_id,
                    expected_version: loser.version,
                    rating: change.loser_after,
                },
                vote: self.record_votes.then(|| vote.clone()),
            };

            match self.store.commit_vote(&commit).await? {
                CommitOutcome::Committed => {
                    tracing::debug!(
                        "Vote {} committed: {} {:.2} -> {:.2}, {} {:.2} -> {:.2} (attempt {})",
                        vote.id,
                        winner_id,
                        change.winner_before,
                        change.winner_after,
                        loser_id,
                        change.loser_before,
                        change.loser_after,
                        attempt
                    );

                    return Ok(VoteOutcome {
                        vote_id: vote.id,
                        winner: RatingSnapshot {
                            id: winner_id,
                            previous_rating: change.winner_before,
                            rating: change.winner_after,
                            vote_count: winner.vote_count + 1,
                        },
                        loser: RatingSnapshot {
                            id: loser_id,
                            previous_rating: change.loser_before,
                            rating: change.loser_after,
                            vote_count: loser.vote_count + 1,
                        },
                        attempts: attempt,
                    });
                }
                CommitOutcome::Conflict if self.retry.should_retry(attempt) => {
                    if let Some(metrics) = &self.metrics {
                        metrics.vote_conflicts.inc();
                        metrics.vote_retries.inc();
                    }
                    let delay = self.retry.backoff_with_jitter(attempt, &mut rand::thread_rng());
                    tracing::debug!(
                        "Vote {} vs {} conflicted on attempt {}, retrying in {:?}",
                        winner_id,
                        loser_id,
                        attempt,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                CommitOutcome::Conflict => {
                    if let Some(metrics) = &self.metrics {
                        metrics.vote_conflicts.inc();
                    }
                    tracing::warn!(
                        "Vote {} vs {} gave up after {} conflicting attempts",
                        winner_id,
                        loser_id,
                        attempt
                    );
                    return Err(RatingError::Conflict { attempts: attempt });
                }
            }
        }
    }

    async fn load_pair(&self, winner_id: Uuid, loser_id: Uuid) -> Result<(RatingRecord, RatingRecord), RatingError> {
        let records = self.store.load_ratings(&[winner_id, loser_id]).await?;
        let find = |id: Uuid| {
            records
                .iter()
                .find(|r| r.id == id)
                .copied()
                .ok_or(RatingError::NotFound(id))
        };

        Ok((find(winner_id)?, find(loser_id)?))
    }
}
