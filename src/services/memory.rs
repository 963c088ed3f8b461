use crate::core::paginate_rankings;
use crate::models::{
    CandidateOrder, CommitOutcome, Film, NewFilm, PairingCandidate, RankingEntry, RatingRecord, Vote, VoteCommit,
};
use crate::services::store::{RatingStore, StoreError};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

#[derive(Debug)]
struct FilmRecord {
    film: Film,
    version: i64,
}

/// In-process rating store
///
/// Each film sits behind its own mutex; the outer map lock is only taken
/// exclusively to add films. A vote commit holds the two film locks it needs
/// (acquired in id order) and nothing else, so votes on disjoint pairs never
/// wait on each other.
#[derive(Default)]
pub struct InMemoryStore {
    films: RwLock<HashMap<Uuid, Arc<Mutex<FilmRecord>>>>,
    votes: Mutex<Vec<Vote>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consistent view of every film
    ///
    /// All film locks are held together, taken in id order like `commit_vote`
    /// takes them, so a commit lands either wholly before or wholly after the
    /// view.
    async fn snapshot(&self) -> Vec<Film> {
        let mut records: Vec<(Uuid, Arc<Mutex<FilmRecord>>)> = self
            .films
            .read()
            .await
            .iter()
            .map(|(id, record)| (*id, record.clone()))
            .collect();
        records.sort_by_key(|(id, _)| *id);

        let mut guards = Vec::with_capacity(records.len());
        for (_, record) in &records {
            guards.push(record.lock().await);
        }
        guards.iter().map(|guard| guard.film.clone()).collect()
    }
}

#[async_trait]
impl RatingStore for InMemoryStore {
    async fn insert_film(&self, film: NewFilm, initial_rating: f64) -> Result<Film, StoreError> {
        let mut films = self.films.write().await;

        for record in films.values() {
            let existing = record.lock().await;
            if existing.film.title == film.title && existing.film.release_year == film.release_year {
                return Err(StoreError::Duplicate(film.title));
            }
        }

        let created = Film {
            id: Uuid::new_v4(),
            title: film.title,
            release_year: film.release_year,
            metadata: film.metadata,
            rating: initial_rating,
            vote_count: 0,
            created_at: chrono::Utc::now(),
        };

        films.insert(
            created.id,
            Arc::new(Mutex::new(FilmRecord {
                film: created.clone(),
                version: 0,
            })),
        );

        Ok(created)
    }

    async fn get_film(&self, id: Uuid) -> Result<Option<Film>, StoreError> {
        let record = self.films.read().await.get(&id).cloned();
        match record {
            Some(record) => Ok(Some(record.lock().await.film.clone())),
            None => Ok(None),
        }
    }

    async fn load_ratings(&self, ids: &[Uuid]) -> Result<Vec<RatingRecord>, StoreError> {
        let records: Vec<Arc<Mutex<FilmRecord>>> = {
            let films = self.films.read().await;
            ids.iter().filter_map(|id| films.get(id).cloned()).collect()
        };

        let mut loaded = Vec::with_capacity(records.len());
        for record in records {
            let record = record.lock().await;
            loaded.push(RatingRecord {
                id: record.film.id,
                rating: record.film.rating,
                vote_count: record.film.vote_count,
                version: record.version,
            });
        }
        Ok(loaded)
    }

    async fn commit_vote(&self, commit: &VoteCommit) -> Result<CommitOutcome, StoreError> {
        let (low, high) = if commit.winner.id <= commit.loser.id {
            (&commit.winner, &commit.loser)
        } else {
            (&commit.loser, &commit.winner)
        };

        let (low_record, high_record) = {
            let films = self.films.read().await;
            match (films.get(&low.id).cloned(), films.get(&high.id).cloned()) {
                (Some(l), Some(h)) => (l, h),
                _ => return Ok(CommitOutcome::Conflict),
            }
        };

        let mut low_guard = low_record.lock().await;
        let mut high_guard = high_record.lock().await;

        if low_guard.version != low.expected_version || high_guard.version != high.expected_version {
            return Ok(CommitOutcome::Conflict);
        }

        for (guard, update) in [(&mut low_guard, low), (&mut high_guard, high)] {
            guard.film.rating = update.rating;
            guard.film.vote_count += 1;
            guard.version += 1;
        }

        if let Some(vote) = &commit.vote {
            self.votes.lock().await.push(vote.clone());
        }

        Ok(CommitOutcome::Committed)
    }

    async fn pairing_candidates(
        &self,
        limit: usize,
        order: CandidateOrder,
    ) -> Result<Vec<PairingCandidate>, StoreError> {
        let mut candidates: Vec<PairingCandidate> = self
            .snapshot()
            .await
            .into_iter()
            .map(|film| PairingCandidate {
                id: film.id,
                title: film.title,
                vote_count: film.vote_count,
            })
            .collect();

        match order {
            CandidateOrder::LeastExposed => {
                candidates.sort_by(|a, b| a.vote_count.cmp(&b.vote_count).then_with(|| a.id.cmp(&b.id)));
            }
            CandidateOrder::Shuffled(seed) => {
                candidates.sort_by_key(|c| c.id);
                candidates.shuffle(&mut StdRng::seed_from_u64(seed));
            }
        }
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn film_count(&self) -> Result<u64, StoreError> {
        Ok(self.films.read().await.len() as u64)
    }

    async fn rankings(&self, offset: u64, limit: u64) -> Result<Vec<RankingEntry>, StoreError> {
        let standings = self
            .snapshot()
            .await
            .into_iter()
            .map(|film| (film.id, film.title, film.rating, film.vote_count))
            .collect();

        Ok(paginate_rankings(standings, offset, limit))
    }

    async fn recent_votes(&self, limit: u64) -> Result<Vec<Vote>, StoreError> {
        let votes = self.votes.lock().await;
        Ok(votes.iter().rev().take(limit as usize).cloned().collect())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}
