// Unit tests for the Filmmash rating core

use filmmash::core::{
    elo::{apply_result, expected_score, DEFAULT_K_FACTOR},
    pairing::{PairingPolicy, PairingSelector},
    ranking::{is_ranked, paginate_rankings},
};
use filmmash::models::{Pairing, PairingCandidate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use uuid::Uuid;

fn candidate(n: u128, vote_count: i64) -> PairingCandidate {
    PairingCandidate {
        id: Uuid::from_u128(n),
        title: format!("Film {}", n),
        vote_count,
    }
}

#[test]
fn test_first_vote_between_new_films() {
    let change = apply_result(1500.0, 1500.0, DEFAULT_K_FACTOR);

    assert_eq!(change.winner_after, 1516.0);
    assert_eq!(change.loser_after, 1484.0);
}

#[test]
fn test_zero_sum_over_random_ratings() {
    let mut rng = StdRng::seed_from_u64(31);

    for _ in 0..1000 {
        let winner: f64 = rng.gen_range(800.0..2800.0);
        let loser: f64 = rng.gen_range(800.0..2800.0);
        let k: f64 = rng.gen_range(1.0..64.0);

        let change = apply_result(winner, loser, k);
        let sum = (change.winner_after - winner) + (change.loser_after - loser);

        assert!(sum.abs() < 1e-9, "ratings not zero-sum: {}", sum);
        assert!(change.winner_after >= winner);
        assert!(change.loser_after <= loser);
        assert!(change.delta() <= k);
    }
}

#[test]
fn test_expected_score_is_monotonic() {
    let weaker = expected_score(1400.0, 1600.0);
    let even = expected_score(1500.0, 1500.0);
    let stronger = expected_score(1600.0, 1400.0);

    assert!(weaker < even && even < stronger);
    // 400 points apart means roughly 10:1 odds
    assert!((expected_score(1900.0, 1500.0) - 10.0 / 11.0).abs() < 1e-12);
}

#[test]
fn test_selector_unavailable_for_single_film() {
    let selector = PairingSelector::default();
    let mut rng = StdRng::seed_from_u64(1);

    assert!(selector.select(&[candidate(1, 0)], None, &mut rng).is_none());
}

#[test]
fn test_exposure_balancing_evens_out_counts() {
    // Simulate a session where every pairing gets a vote
    let selector = PairingSelector::new(PairingPolicy::ExposureBalanced);
    let mut rng = StdRng::seed_from_u64(8);
    let mut counts: HashMap<Uuid, i64> = (1..=10).map(|n| (Uuid::from_u128(n), 0)).collect();
    let mut previous: Option<Pairing> = None;

    for _ in 0..500 {
        let population: Vec<PairingCandidate> = counts
            .iter()
            .map(|(id, votes)| PairingCandidate {
                id: *id,
                title: id.to_string(),
                vote_count: *votes,
            })
            .collect();

        let pairing = selector.select(&population, previous.as_ref(), &mut rng).unwrap();
        if let Some(prev) = previous {
            assert!(!pairing.same_films(&prev));
        }

        *counts.entry(pairing.first).or_default() += 1;
        *counts.entry(pairing.second).or_default() += 1;
        previous = Some(pairing);
    }

    let min = counts.values().min().copied().unwrap();
    let max = counts.values().max().copied().unwrap();
    // 1000 appearances over 10 films: every film stays close to 100
    assert!(max - min <= 45, "exposure spread too wide: {}..{}", min, max);
}

#[test]
fn test_same_seed_same_sequence() {
    let selector = PairingSelector::default();
    let population: Vec<_> = (1..=20).map(|n| candidate(n, (n % 4) as i64)).collect();

    let run = |seed: u64| {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..25)
            .map(|_| selector.select(&population, None, &mut rng).unwrap())
            .collect::<Vec<_>>()
    };

    assert_eq!(run(77), run(77));
    assert_ne!(run(77), run(78));
}

#[test]
fn test_rankings_tie_breaks() {
    let a = Uuid::from_u128(1);
    let b = Uuid::from_u128(2);
    let c = Uuid::from_u128(3);
    let standings = vec![
        (c, "C".to_string(), 1500.0, 3),
        (b, "B".to_string(), 1500.0, 3),
        (a, "A".to_string(), 1500.0, 1),
    ];

    let ranked = paginate_rankings(standings, 0, 3);

    assert_eq!(ranked.iter().map(|e| e.id).collect::<Vec<_>>(), vec![b, c, a]);
    assert!(is_ranked(&ranked));
}
