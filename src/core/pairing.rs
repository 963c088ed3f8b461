use crate::models::{Pairing, PairingCandidate};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::Deserialize;

/// How films are drawn for a pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingPolicy {
    /// Every film in the candidate pool is equally likely
    Uniform,
    /// Films with fewer votes are drawn more often: weight = 1 / (1 + vote_count)
    #[default]
    ExposureBalanced,
}

impl PairingPolicy {
    #[inline]
    fn weight(self, vote_count: i64) -> f64 {
        match self {
            PairingPolicy::Uniform => 1.0,
            PairingPolicy::ExposureBalanced => 1.0 / (1.0 + vote_count.max(0) as f64),
        }
    }
}

/// Chooses two distinct films to put in front of a voter
///
/// Selection is a pure function of the candidate population, the previously
/// shown pairing and the random source. Candidates are sorted by id first so a
/// seeded RNG yields the same pairing whatever order the store returned them in.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairingSelector {
    policy: PairingPolicy,
}

impl PairingSelector {
    pub fn new(policy: PairingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> PairingPolicy {
        self.policy
    }

    /// Pick a pairing, or `None` when fewer than two distinct films exist
    ///
    /// If `previous` is given and any other pair is possible, the same two
    /// films are never returned twice in a row.
    pub fn select<R: Rng + ?Sized>(
        &self,
        candidates: &[PairingCandidate],
        previous: Option<&Pairing>,
        rng: &mut R,
    ) -> Option<Pairing> {
        let mut pool: Vec<&PairingCandidate> = candidates.iter().collect();
        pool.sort_by_key(|c| c.id);
        pool.dedup_by_key(|c| c.id);

        if pool.len() < 2 {
            return None;
        }

        // With exactly two films there is nothing else to show
        let avoid = previous.filter(|_| pool.len() > 2);

        // Stage 1: draw the first film
        let first = self.draw(&pool, rng)?;

        // Stage 2: draw the partner from everything else. With three or more
        // films at least one partner survives the exclusion.
        let excluded_partner = avoid.and_then(|prev| prev.partner_of(first.id));
        let second_pool: Vec<&PairingCandidate> = pool
            .iter()
            .copied()
            .filter(|c| c.id != first.id && Some(c.id) != excluded_partner)
            .collect();
        let second = self.draw(&second_pool, rng)?;

        Some(Pairing {
            first: first.id,
            second: second.id,
        })
    }

    fn draw<'a, R: Rng + ?Sized>(
        &self,
        pool: &[&'a PairingCandidate],
        rng: &mut R,
    ) -> Option<&'a PairingCandidate> {
        let weights = pool.iter().map(|c| self.policy.weight(c.vote_count));
        let index = WeightedIndex::new(weights).ok()?;
        pool.get(index.sample(rng)).copied()
    }
}
