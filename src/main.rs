use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use filmmash::config::{CorsSettings, LoggingSettings, Settings, StorageBackend};
use filmmash::error::{handle_json_payload_error, handle_path_error, handle_query_payload_error};
use filmmash::routes::{self, AppState};
use filmmash::services::spawn_metrics_refresh;
use filmmash::{InMemoryStore, Metrics, PairingSelector, PostgresStore, RatingService, RatingStore, VoteProcessor};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn build_cors(settings: &CorsSettings) -> Cors {
    if settings.allowed_origins.iter().any(|origin| origin == "*") {
        return Cors::permissive();
    }

    settings
        .allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
}

async fn connect_store(settings: &Settings) -> io::Result<Arc<dyn RatingStore>> {
    match settings.database.backend {
        StorageBackend::Memory => {
            info!("Using in-memory rating store; ratings are lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let db = &settings.database;
            let max_connections = db.max_connections.unwrap_or(10);
            let store = PostgresStore::connect(
                &db.url,
                max_connections,
                db.min_connections.unwrap_or(1),
                db.acquire_timeout(),
                db.idle_timeout(),
                db.run_migrations,
            )
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                io::Error::new(io::ErrorKind::Other, e)
            })?;

            info!("PostgreSQL store initialized (max: {} connections)", max_connections);
            Ok(Arc::new(store))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    init_tracing(&settings.logging);
    info!("Starting Filmmash rating service...");

    let store = connect_store(&settings).await?;

    let metrics = Arc::new(Metrics::new().map_err(|e| {
        error!("Failed to register metrics: {}", e);
        io::Error::new(io::ErrorKind::Other, e)
    })?);

    let rating = &settings.rating;
    let processor = VoteProcessor::new(
        store.clone(),
        rating.k_factor,
        rating.retry_policy(),
        rating.record_votes,
    )
    .with_metrics(metrics.clone());

    let rng = match settings.pairing.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let selector = PairingSelector::new(settings.pairing.policy);

    info!(
        "Rating cycle configured: k_factor={}, initial_rating={}, max_attempts={}, pairing={:?}, seed={:?}",
        rating.k_factor,
        rating.initial_rating,
        rating.max_attempts,
        selector.policy(),
        settings.pairing.seed
    );

    let service = Arc::new(RatingService::new(
        store,
        selector,
        rng,
        processor,
        rating.initial_rating,
        settings.pairing.candidate_pool,
    ));

    spawn_metrics_refresh(service.clone(), metrics.clone(), settings.metrics.refresh_interval());

    let app_state = AppState {
        service,
        rankings: settings.rankings.clone(),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);
    let cors_settings = settings.cors.clone();

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::Data::from(metrics.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(build_cors(&cors_settings))
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .wrap(middleware::from_fn(filmmash::middleware::track_requests))
            .wrap(middleware::from_fn(filmmash::middleware::request_id))
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
