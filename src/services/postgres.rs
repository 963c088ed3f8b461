use crate::models::{
    CandidateOrder, CommitOutcome, Film, NewFilm, PairingCandidate, RankingEntry, RatingRecord, RecordUpdate,
    Vote, VoteCommit,
};
use crate::services::store::{RatingStore, StoreError};
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::time::Duration;
use uuid::Uuid;

/// Unique violation
const PG_UNIQUE_VIOLATION: &str = "23505";

/// LIMIT/OFFSET value for an unsigned count; anything past `i64::MAX` means "everything"
fn sql_bound(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// PostgreSQL-backed rating store
///
/// Every committed vote bumps the `version` column of both films; a commit
/// only succeeds if the versions still match what the vote processor read.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and optionally run the embedded migrations
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
        run_migrations: bool,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        if run_migrations {
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Database migrations applied");
        }

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_film(row: &PgRow) -> Result<Film, sqlx::Error> {
        Ok(Film {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            release_year: row.try_get("release_year")?,
            metadata: row.try_get("metadata")?,
            rating: row.try_get("rating")?,
            vote_count: row.try_get("vote_count")?,
            created_at: row.try_get("created_at")?,
        })
    }

    async fn apply_update(
        tx: &mut Transaction<'_, Postgres>,
        update: &RecordUpdate,
    ) -> Result<bool, sqlx::Error> {
        let query = r#"
            UPDATE films
            SET rating = $1,
                vote_count = vote_count + 1,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $2 AND version = $3
        "#;

        let result = sqlx::query(query)
            .bind(update.rating)
            .bind(update.id)
            .bind(update.expected_version)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl RatingStore for PostgresStore {
    async fn insert_film(&self, film: NewFilm, initial_rating: f64) -> Result<Film, StoreError> {
        let id = Uuid::new_v4();
        let query = r#"
            INSERT INTO films (id, title, release_year, metadata, rating, vote_count, version, created_at)
            VALUES ($1, $2, $3, $4, $5, 0, 0, NOW())
            RETURNING id, title, release_year, metadata, rating, vote_count, created_at
        "#;

        let row = sqlx::query(query)
            .bind(id)
            .bind(&film.title)
            .bind(film.release_year)
            .bind(&film.metadata)
            .bind(initial_rating)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.code().as_deref() == Some(PG_UNIQUE_VIOLATION) => {
                    StoreError::Duplicate(film.title.clone())
                }
                _ => StoreError::from(e),
            })?;

        let film = Self::row_to_film(&row)?;
        tracing::debug!("Inserted film {} ({})", film.id, film.title);
        Ok(film)
    }

    async fn get_film(&self, id: Uuid) -> Result<Option<Film>, StoreError> {
        let query = r#"
            SELECT id, title, release_year, metadata, rating, vote_count, created_at
            FROM films
            WHERE id = $1
        "#;

        let row = sqlx::query(query).bind(id).fetch_optional(&self.pool).await?;

        Ok(row.as_ref().map(Self::row_to_film).transpose()?)
    }

    async fn load_ratings(&self, ids: &[Uuid]) -> Result<Vec<RatingRecord>, StoreError> {
        let query = r#"
            SELECT id, rating, vote_count, version
            FROM films
            WHERE id = ANY($1)
        "#;

        let rows = sqlx::query(query)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;

        let records: Result<Vec<RatingRecord>, sqlx::Error> = rows
            .iter()
            .map(|row| {
                Ok(RatingRecord {
                    id: row.try_get("id")?,
                    rating: row.try_get("rating")?,
                    vote_count: row.try_get("vote_count")?,
                    version: row.try_get("version")?,
                })
            })
            .collect();

        Ok(records?)
    }

    async fn commit_vote(&self, commit: &VoteCommit) -> Result<CommitOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Lock rows in id order so two votes sharing both films cannot deadlock
        let (first, second) = if commit.winner.id <= commit.loser.id {
            (&commit.winner, &commit.loser)
        } else {
            (&commit.loser, &commit.winner)
        };

        for update in [first, second] {
            if !Self::apply_update(&mut tx, update).await? {
                tx.rollback().await?;
                tracing::debug!("Version conflict on film {}", update.id);
                return Ok(CommitOutcome::Conflict);
            }
        }

        if let Some(vote) = &commit.vote {
            let query = r#"
                INSERT INTO votes (
                    id, winner_id, loser_id,
                    winner_rating_before, winner_rating_after,
                    loser_rating_before, loser_rating_after,
                    created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#;

            sqlx::query(query)
                .bind(vote.id)
                .bind(vote.winner_id)
                .bind(vote.loser_id)
                .bind(vote.winner_rating_before)
                .bind(vote.winner_rating_after)
                .bind(vote.loser_rating_before)
                .bind(vote.loser_rating_after)
                .bind(vote.created_at)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(CommitOutcome::Committed)
    }

    async fn pairing_candidates(
        &self,
        limit: usize,
        order: CandidateOrder,
    ) -> Result<Vec<PairingCandidate>, StoreError> {
        let limit = sql_bound(limit as u64);
        let rows = match order {
            CandidateOrder::LeastExposed => {
                let query = r#"
                    SELECT id, title, vote_count
                    FROM films
                    ORDER BY vote_count ASC, id ASC
                    LIMIT $1
                "#;
                sqlx::query(query).bind(limit).fetch_all(&self.pool).await?
            }
            CandidateOrder::Shuffled(seed) => {
                // Hashing the id with the seed gives a repeatable shuffle
                let query = r#"
                    SELECT id, title, vote_count
                    FROM films
                    ORDER BY md5(id::text || $2), id ASC
                    LIMIT $1
                "#;
                sqlx::query(query)
                    .bind(limit)
                    .bind(seed.to_string())
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let candidates: Result<Vec<PairingCandidate>, sqlx::Error> = rows
            .iter()
            .map(|row| {
                Ok(PairingCandidate {
                    id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    vote_count: row.try_get("vote_count")?,
                })
            })
            .collect();

        Ok(candidates?)
    }

    async fn rankings(&self, offset: u64, limit: u64) -> Result<Vec<RankingEntry>, StoreError> {
        let query = r#"
            SELECT id, title, rating, vote_count
            FROM films
            ORDER BY rating DESC, vote_count DESC, id ASC
            LIMIT $1 OFFSET $2
        "#;

        let rows = sqlx::query(query)
            .bind(sql_bound(limit))
            .bind(sql_bound(offset))
            .fetch_all(&self.pool)
            .await?;

        let entries: Result<Vec<RankingEntry>, sqlx::Error> = rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                Ok(RankingEntry {
                    position: offset + index as u64 + 1,
                    id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    rating: row.try_get("rating")?,
                    vote_count: row.try_get("vote_count")?,
                })
            })
            .collect();

        Ok(entries?)
    }

    async fn recent_votes(&self, limit: u64) -> Result<Vec<Vote>, StoreError> {
        let query = r#"
            SELECT id, winner_id, loser_id,
                   winner_rating_before, winner_rating_after,
                   loser_rating_before, loser_rating_after,
                   created_at
            FROM votes
            ORDER BY created_at DESC, id ASC
            LIMIT $1
        "#;

        let rows = sqlx::query(query)
            .bind(sql_bound(limit))
            .fetch_all(&self.pool)
            .await?;

        let votes: Result<Vec<Vote>, sqlx::Error> = rows
            .iter()
            .map(|row| {
                Ok(Vote {
                    id: row.try_get("id")?,
                    winner_id: row.try_get("winner_id")?,
                    loser_id: row.try_get("loser_id")?,
                    winner_rating_before: row.try_get("winner_rating_before")?,
                    winner_rating_after: row.try_get("winner_rating_after")?,
                    loser_rating_before: row.try_get("loser_rating_before")?,
                    loser_rating_after: row.try_get("loser_rating_after")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect();

        Ok(votes?)
    }

    async fn film_count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM films")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
