use crate::core::{PairingPolicy, PairingSelector};
use crate::error::RatingError;
use crate::models::{CandidateOrder, Film, MatchProposal, NewFilm, Pairing, RankingEntry, Vote, VoteOutcome};
use crate::services::store::RatingStore;
use crate::services::vote_processor::VoteProcessor;
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Entry point of the rating cycle: pairing, voting, rankings and catalog
pub struct RatingService {
    store: Arc<dyn RatingStore>,
    selector: PairingSelector,
    rng: Mutex<StdRng>,
    processor: VoteProcessor,
    initial_rating: f64,
    candidate_pool: usize,
}

impl RatingService {
    pub fn new(
        store: Arc<dyn RatingStore>,
        selector: PairingSelector,
        rng: StdRng,
        processor: VoteProcessor,
        initial_rating: f64,
        candidate_pool: usize,
    ) -> Self {
        Self {
            store,
            selector,
            rng: Mutex::new(rng),
            processor,
            initial_rating,
            candidate_pool: candidate_pool.max(2),
        }
    }

    /// Propose two films to compare; `None` when the catalog has fewer than two
    ///
    /// The candidate pool is the least exposed slice of the catalog under the
    /// exposure-balanced policy, and a seeded random slice under the uniform
    /// one, so no film is starved when the catalog outgrows the pool.
    pub async fn select_pairing(&self, previous: Option<Pairing>) -> Result<Option<MatchProposal>, RatingError> {
        let order = match self.selector.policy() {
            PairingPolicy::ExposureBalanced => CandidateOrder::LeastExposed,
            PairingPolicy::Uniform => CandidateOrder::Shuffled(self.rng.lock().await.gen()),
        };
        let candidates = self.store.pairing_candidates(self.candidate_pool, order).await?;

        let pairing = {
            let mut rng = self.rng.lock().await;
            self.selector.select(&candidates, previous.as_ref(), &mut *rng)
        };

        let Some(pairing) = pairing else {
            tracing::debug!("Pairing unavailable with {} candidates", candidates.len());
            return Ok(None);
        };

        let lookup = |id: Uuid| candidates.iter().find(|c| c.id == id).cloned();
        match (lookup(pairing.first), lookup(pairing.second)) {
            (Some(first), Some(second)) => Ok(Some(MatchProposal { first, second })),
            _ => Ok(None),
        }
    }

    pub async fn submit_vote(&self, winner_id: Uuid, loser_id: Uuid) -> Result<VoteOutcome, RatingError> {
        self.processor.submit_vote(winner_id, loser_id).await
    }

    pub async fn list_rankings(&self, offset: u64, limit: u64) -> Result<Vec<RankingEntry>, RatingError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        Ok(self.store.rankings(offset, limit).await?)
    }

    /// Add a film to the catalog at the initial rating
    pub async fn import_film(&self, film: NewFilm) -> Result<Film, RatingError> {
        let film = self.store.insert_film(film, self.initial_rating).await?;
        tracing::info!("Imported film {} ({})", film.id, film.title);
        Ok(film)
    }

    pub async fn get_film(&self, id: Uuid) -> Result<Film, RatingError> {
        self.store.get_film(id).await?.ok_or(RatingError::NotFound(id))
    }

    pub async fn recent_votes(&self, limit: u64) -> Result<Vec<Vote>, RatingError> {
        Ok(self.store.recent_votes(limit).await?)
    }

    pub async fn film_count(&self) -> Result<u64, RatingError> {
        Ok(self.store.film_count().await?)
    }

    pub async fn health_check(&self) -> bool {
        match self.store.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                tracing::warn!("Store health check failed: {}", e);
                false
            }
        }
    }
}
