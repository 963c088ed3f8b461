use crate::metrics::Metrics;
use crate::services::rating::RatingService;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const CATALOG_JOB: &str = "refresh_catalog_metrics";

/// Refresh catalog gauges once
pub async fn refresh_catalog_metrics(service: &RatingService, metrics: &Metrics) {
    let result = metrics
        .track_job(CATALOG_JOB, async {
            let films = service.film_count().await?;
            metrics.films.set(i64::try_from(films).unwrap_or(i64::MAX));
            Ok::<_, crate::error::RatingError>(())
        })
        .await;

    if let Err(e) = result {
        tracing::warn!("{} failed: {}", CATALOG_JOB, e);
    }
}

/// Keep catalog gauges fresh for as long as the server runs
pub fn spawn_metrics_refresh(
    service: Arc<RatingService>,
    metrics: Arc<Metrics>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            refresh_catalog_metrics(&service, &metrics).await;
        }
    })
}
