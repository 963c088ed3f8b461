use crate::metrics::Metrics;
use actix_web::{web, HttpResponse};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(all_metrics))
        .route("/metrics/{prefix}", web::get().to(metrics_by_prefix));
}

/// GET /metrics
async fn all_metrics(metrics: web::Data<Metrics>) -> HttpResponse {
    exposition(metrics.render())
}

/// GET /metrics/{prefix}
///
/// Only families whose name starts with `prefix`, e.g. `/metrics/filmmash_votes`
async fn metrics_by_prefix(metrics: web::Data<Metrics>, prefix: web::Path<String>) -> HttpResponse {
    exposition(metrics.render_prefix(&prefix))
}

fn exposition(rendered: Result<String, prometheus::Error>) -> HttpResponse {
    match rendered {
        Ok(body) => HttpResponse::Ok().content_type(PROMETHEUS_CONTENT_TYPE).body(body),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
