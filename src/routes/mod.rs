// Route exports
pub mod films;
pub mod health;
pub mod matches;
pub mod metrics;

use crate::config::RankingSettings;
use crate::services::RatingService;
use actix_web::web;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RatingService>,
    pub rankings: RankingSettings,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure)
        .configure(metrics::configure)
        .service(
        web::scope("/api/v1")
            .configure(matches::configure)
            .configure(films::configure),
    );
}
