// Integration tests for Filmmash: rating service and HTTP API over the in-memory store

use actix_web::middleware::from_fn;
use actix_web::{http::StatusCode, test, web, App};
use filmmash::config::RankingSettings;
use filmmash::core::{apply_result, is_ranked, PairingPolicy, PairingSelector, RetryPolicy};
use filmmash::models::{
    ErrorResponse, Film, NewFilm, PairingResponse, RankingsResponse, RecentVotesResponse,
    VoteOutcome,
};
use filmmash::middleware::{request_id, track_requests};
use filmmash::routes::{configure_routes, AppState};
use filmmash::{InMemoryStore, Metrics, RatingError, RatingService, VoteProcessor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn build_service(max_attempts: u32) -> Arc<RatingService> {
    let store = Arc::new(InMemoryStore::new());
    let retry = RetryPolicy::new(max_attempts, Duration::from_micros(50), Duration::from_millis(2));
    let processor = VoteProcessor::new(store.clone(), 32.0, retry, true);

    Arc::new(RatingService::new(
        store,
        PairingSelector::new(PairingPolicy::ExposureBalanced),
        StdRng::seed_from_u64(1234),
        processor,
        1500.0,
        200,
    ))
}

async fn import(service: &RatingService, title: &str) -> Film {
    service
        .import_film(NewFilm {
            title: title.to_string(),
            release_year: None,
            metadata: serde_json::json!({}),
        })
        .await
        .unwrap()
}

fn app_state(service: Arc<RatingService>) -> AppState {
    AppState {
        service,
        rankings: RankingSettings::default(),
    }
}

#[tokio::test]
async fn test_integration_vote_then_rankings() {
    let service = build_service(5);
    let a = import(&service, "Alien").await;
    let b = import(&service, "Blade Runner").await;

    let outcome = service.submit_vote(a.id, b.id).await.unwrap();
    assert_eq!(outcome.winner.rating, 1516.0);
    assert_eq!(outcome.loser.rating, 1484.0);

    let rankings = service.list_rankings(0, 10).await.unwrap();
    assert_eq!(rankings.len(), 2);
    assert_eq!(rankings[0].id, a.id);
    assert_eq!(rankings[0].vote_count, 1);
    assert_eq!(rankings[1].id, b.id);
    assert_eq!(rankings[1].vote_count, 1);
}

#[tokio::test]
async fn test_rankings_stay_sorted_after_random_votes() {
    let service = build_service(5);
    let mut ids = Vec::new();
    for n in 0..12 {
        ids.push(import(&service, &format!("Film {}", n)).await.id);
    }

    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..300 {
        let winner = ids[rng.gen_range(0..ids.len())];
        let loser = ids[rng.gen_range(0..ids.len())];
        if winner == loser {
            continue;
        }
        service.submit_vote(winner, loser).await.unwrap();

        let rankings = service.list_rankings(0, 100).await.unwrap();
        assert!(is_ranked(&rankings));
    }

    // Ratings only ever move between films
    let rankings = service.list_rankings(0, 100).await.unwrap();
    let total: f64 = rankings.iter().map(|e| e.rating).sum();
    assert!((total - 1500.0 * ids.len() as f64).abs() < 1e-6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_votes_serialize_per_film() {
    let service = build_service(64);
    let a = import(&service, "Heat").await;
    let b = import(&service, "Ronin").await;

    let (a_id, b_id) = (a.id, b.id);
    let votes = 40;
    let handles: Vec<_> = (0..votes)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.submit_vote(a_id, b_id).await })
        })
        .collect();

    let mut committed = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => committed += 1,
            Err(RatingError::Conflict { .. }) => conflicts += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(committed + conflicts, votes);
    assert!(committed > 0);

    // Every committed vote had the same outcome, so the only valid serial
    // history is `committed` wins for A in a row.
    let mut expected_a = 1500.0;
    let mut expected_b = 1500.0;
    for _ in 0..committed {
        let change = apply_result(expected_a, expected_b, 32.0);
        expected_a = change.winner_after;
        expected_b = change.loser_after;
    }

    let a_now = service.get_film(a.id).await.unwrap();
    let b_now = service.get_film(b.id).await.unwrap();
    assert_eq!(a_now.vote_count, committed as i64);
    assert_eq!(b_now.vote_count, committed as i64);
    assert!((a_now.rating - expected_a).abs() < 1e-9);
    assert!((b_now.rating - expected_b).abs() < 1e-9);

    let trail = service.recent_votes(1000).await.unwrap();
    assert_eq!(trail.len(), committed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_disjoint_pairs_do_not_interfere() {
    let service = build_service(64);
    let films: Vec<Film> = {
        let mut films = Vec::new();
        for n in 0..8 {
            films.push(import(&service, &format!("Film {}", n)).await);
        }
        films
    };

    let handles: Vec<_> = films
        .chunks(2)
        .flat_map(|pair| {
            let (winner, loser) = (pair[0].id, pair[1].id);
            (0..10).map({
                let service = service.clone();
                move |_| {
                    let service = service.clone();
                    tokio::spawn(async move { service.submit_vote(winner, loser).await })
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for film in &films {
        assert_eq!(service.get_film(film.id).await.unwrap().vote_count, 10);
    }
}

#[actix_web::test]
async fn test_http_vote_flow() {
    let service = build_service(5);
    let a = import(&service, "Paris, Texas").await;
    let b = import(&service, "Wings of Desire").await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(service)))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/matches/pairing").to_request();
    let pairing: PairingResponse = test::call_and_read_body_json(&app, req).await;
    assert!(pairing.available);
    let proposal = pairing.pairing.unwrap();
    let mut shown = vec![proposal.first.id, proposal.second.id];
    shown.sort();
    let mut expected = vec![a.id, b.id];
    expected.sort();
    assert_eq!(shown, expected);

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/vote")
        .set_json(serde_json::json!({ "winnerId": a.id, "loserId": b.id }))
        .to_request();
    let outcome: VoteOutcome = test::call_and_read_body_json(&app, req).await;
    assert_eq!(outcome.winner.id, a.id);
    assert_eq!(outcome.winner.rating, 1516.0);
    assert_eq!(outcome.loser.rating, 1484.0);

    let req = test::TestRequest::get().uri("/api/v1/rankings?limit=1").to_request();
    let rankings: RankingsResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(rankings.rankings.len(), 1);
    assert_eq!(rankings.rankings[0].id, a.id);
    assert_eq!(rankings.rankings[0].position, 1);

    let req = test::TestRequest::get().uri("/api/v1/rankings?offset=1&limit=5").to_request();
    let rankings: RankingsResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(rankings.rankings.len(), 1);
    assert_eq!(rankings.rankings[0].id, b.id);
    assert_eq!(rankings.rankings[0].position, 2);

    let req = test::TestRequest::get().uri("/api/v1/votes?limit=10").to_request();
    let trail: RecentVotesResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(trail.count, 1);
    assert_eq!(trail.votes[0].id, outcome.vote_id);
}

#[actix_web::test]
async fn test_http_vote_errors() {
    let service = build_service(5);
    let a = import(&service, "Rashomon").await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(service)))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/vote")
        .set_json(serde_json::json!({ "winnerId": a.id, "loserId": a.id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "invalid_vote");

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/vote")
        .set_json(serde_json::json!({ "winnerId": Uuid::new_v4(), "loserId": a.id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "not_found");
    assert_eq!(body.status_code, 404);
}

#[actix_web::test]
async fn test_http_pairing_unavailable() {
    let service = build_service(5);
    import(&service, "Lonely Film").await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(service)))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/matches/pairing").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: PairingResponse = test::read_body_json(resp).await;
    assert!(!body.available);
    assert!(body.pairing.is_none());
}

#[actix_web::test]
async fn test_http_film_import() {
    let service = build_service(5);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(service)))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/films")
        .set_json(serde_json::json!({ "title": "Stalker", "releaseYear": 1979, "metadata": { "director": "Tarkovsky" } }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let film: Film = test::read_body_json(resp).await;
    assert_eq!(film.rating, 1500.0);
    assert_eq!(film.vote_count, 0);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/films/{}", film.id))
        .to_request();
    let fetched: Film = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched.title, "Stalker");
    assert_eq!(fetched.metadata["director"], "Tarkovsky");

    // Same title and year again
    let req = test::TestRequest::post()
        .uri("/api/v1/films")
        .set_json(serde_json::json!({ "title": "Stalker", "releaseYear": 1979 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/v1/films")
        .set_json(serde_json::json!({ "title": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/films/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_http_health() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(build_service(5))))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rankings_consistent_during_concurrent_votes() {
    let service = build_service(64);
    let mut ids = Vec::new();
    for n in 0..40 {
        ids.push(import(&service, &format!("Film {}", n)).await.id);
    }
    let expected_total = 1500.0 * ids.len() as f64;

    let voters: Vec<_> = (0..3u64)
        .map(|seed| {
            let service = service.clone();
            let ids = ids.clone();
            tokio::spawn(async move {
                let mut rng = StdRng::seed_from_u64(seed);
                for _ in 0..200 {
                    let winner = ids[rng.gen_range(0..ids.len())];
                    let loser = ids[rng.gen_range(0..ids.len())];
                    if winner != loser {
                        // Conflicts are fine here; only committed votes matter
                        let _ = service.submit_vote(winner, loser).await;
                    }
                }
            })
        })
        .collect();

    for _ in 0..1000 {
        let rankings = service.list_rankings(0, 100).await.unwrap();
        let total: f64 = rankings.iter().map(|e| e.rating).sum();
        assert!(
            (total - expected_total).abs() < 1e-6,
            "leaderboard total drifted to {}",
            total
        );
        assert!(is_ranked(&rankings));
    }

    for voter in voters {
        voter.await.unwrap();
    }
}

#[actix_web::test]
async fn test_http_huge_offset_is_empty_page() {
    let service = build_service(5);
    import(&service, "Tokyo Story").await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(service)))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/rankings?offset={}&limit=10", u64::MAX))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: RankingsResponse = test::read_body_json(resp).await;
    assert!(body.rankings.is_empty());
}

#[actix_web::test]
async fn test_http_error_body_has_request_id() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(build_service(5))))
            .configure(configure_routes)
            .wrap(from_fn(request_id)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/films/{}", Uuid::new_v4()))
        .insert_header(("X-Request-ID", "req-404"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.meta.unwrap().request_id, "req-404");

    // Malformed payloads go through the same envelope
    let req = test::TestRequest::post()
        .uri("/api/v1/films")
        .insert_header(("X-Request-ID", "req-400"))
        .set_json(serde_json::json!({ "title": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "validation_failed");
    assert_eq!(body.meta.unwrap().request_id, "req-400");
}

#[actix_web::test]
async fn test_http_metrics_endpoint() {
    let store = Arc::new(InMemoryStore::new());
    let metrics = Arc::new(Metrics::new().unwrap());
    let retry = RetryPolicy::new(5, Duration::from_micros(50), Duration::from_millis(2));
    let processor = VoteProcessor::new(store.clone(), 32.0, retry, true).with_metrics(metrics.clone());
    let service = Arc::new(RatingService::new(
        store,
        PairingSelector::default(),
        StdRng::seed_from_u64(5),
        processor,
        1500.0,
        200,
    ));
    let a = import(&service, "Yojimbo").await;
    let b = import(&service, "Sanjuro").await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(service)))
            .app_data(web::Data::from(metrics.clone()))
            .configure(configure_routes)
            .wrap(from_fn(track_requests)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/vote")
        .set_json(serde_json::json!({ "winnerId": a.id, "loserId": b.id }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/films/{}", Uuid::new_v4()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains(r#"filmmash_votes_total{outcome="committed"} 1"#));
    assert!(body.contains(
        r#"filmmash_http_requests_total{method="POST",route="/api/v1/matches/vote",status="200"} 1"#
    ));
    assert!(body.contains(r#"filmmash_http_errors_total{error="not_found",route="/api/v1/films/{id}"} 1"#));

    let req = test::TestRequest::get().uri("/metrics/filmmash_votes").to_request();
    let body = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
    assert!(body.contains("filmmash_votes_total"));
    assert!(!body.contains("filmmash_http_requests_total"));
}
