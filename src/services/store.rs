use crate::models::{
    CandidateOrder, CommitOutcome, Film, NewFilm, PairingCandidate, RankingEntry, RatingRecord, Vote, VoteCommit,
};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by a rating store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Film already exists: {0}")]
    Duplicate(String),
}

/// Persistence seam for films, their ratings and the vote trail
///
/// The vote processor is the only caller of `commit_vote`; everything else
/// only reads rating state.
#[async_trait]
pub trait RatingStore: Send + Sync {
    /// Add a film from the catalog importer
    async fn insert_film(&self, film: NewFilm, initial_rating: f64) -> Result<Film, StoreError>;

    async fn get_film(&self, id: Uuid) -> Result<Option<Film>, StoreError>;

    /// Current rating state of the requested films; unknown ids are skipped
    async fn load_ratings(&self, ids: &[Uuid]) -> Result<Vec<RatingRecord>, StoreError>;

    /// Apply both rating updates and the audit record atomically, provided
    /// neither film changed since it was loaded
    async fn commit_vote(&self, commit: &VoteCommit) -> Result<CommitOutcome, StoreError>;

    /// At most `limit` films, picked according to `order`
    async fn pairing_candidates(
        &self,
        limit: usize,
        order: CandidateOrder,
    ) -> Result<Vec<PairingCandidate>, StoreError>;

    /// Number of films in the catalog
    async fn film_count(&self) -> Result<u64, StoreError>;

    async fn rankings(&self, offset: u64, limit: u64) -> Result<Vec<RankingEntry>, StoreError>;

    /// Newest votes first
    async fn recent_votes(&self, limit: u64) -> Result<Vec<Vote>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}
