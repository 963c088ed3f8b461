// Criterion benchmarks for the Filmmash rating core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use filmmash::core::{apply_result, paginate_rankings, PairingPolicy, PairingSelector};
use filmmash::models::{Pairing, PairingCandidate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

fn create_population(size: usize) -> Vec<PairingCandidate> {
    (0..size)
        .map(|i| PairingCandidate {
            id: Uuid::from_u128(i as u128 + 1),
            title: format!("Film {}", i),
            vote_count: (i % 50) as i64,
        })
        .collect()
}

fn bench_apply_result(c: &mut Criterion) {
    c.bench_function("elo_apply_result", |b| {
        b.iter(|| apply_result(black_box(1612.0), black_box(1488.0), black_box(32.0)));
    });
}

fn bench_pairing_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("pairing_selection");

    for size in [10, 200, 1000].iter() {
        let population = create_population(*size);
        let previous = Pairing {
            first: population[0].id,
            second: population[1].id,
        };

        for policy in [PairingPolicy::Uniform, PairingPolicy::ExposureBalanced] {
            let selector = PairingSelector::new(policy);
            let mut rng = StdRng::seed_from_u64(42);

            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", policy), size),
                &population,
                |b, population| {
                    b.iter(|| selector.select(black_box(population), Some(&previous), &mut rng));
                },
            );
        }
    }

    group.finish();
}

fn bench_rankings_page(c: &mut Criterion) {
    let standings: Vec<(Uuid, String, f64, i64)> = (0..5000)
        .map(|i| {
            (
                Uuid::from_u128(i as u128 + 1),
                format!("Film {}", i),
                1500.0 + ((i * 37) % 400) as f64,
                (i % 90) as i64,
            )
        })
        .collect();

    c.bench_function("rankings_page_5000", |b| {
        b.iter(|| paginate_rankings(black_box(standings.clone()), 100, 20));
    });
}

criterion_group!(benches, bench_apply_result, bench_pairing_selection, bench_rankings_page);
criterion_main!(benches);
