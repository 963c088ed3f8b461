use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::future::Future;
use std::time::Instant;

/// Request latency buckets in seconds
const LATENCY_BUCKETS: &[f64] = &[0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5];

/// Prometheus metrics of the rating service
///
/// Everything is registered on a private registry, so several instances can
/// live side by side (one per test, for example).
pub struct Metrics {
    registry: Registry,
    pub http_requests: IntCounterVec,
    pub http_latency: HistogramVec,
    pub http_errors: IntCounterVec,
    pub votes: IntCounterVec,
    pub vote_conflicts: IntCounter,
    pub vote_retries: IntCounter,
    pub films: IntGauge,
    pub job_runs: IntCounterVec,
    pub job_failures: IntCounterVec,
    pub job_duration: HistogramVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests = IntCounterVec::new(
            Opts::new("filmmash_http_requests_total", "Total HTTP requests"),
            &["method", "route", "status"],
        )?;
        let http_latency = HistogramVec::new(
            HistogramOpts::new("filmmash_http_request_duration_seconds", "HTTP request latency")
                .buckets(LATENCY_BUCKETS.to_vec()),
            &["method", "route"],
        )?;
        let http_errors = IntCounterVec::new(
            Opts::new("filmmash_http_errors_total", "HTTP responses with an error status"),
            &["route", "error"],
        )?;
        let votes = IntCounterVec::new(
            Opts::new("filmmash_votes_total", "Submitted votes by outcome"),
            &["outcome"],
        )?;
        let vote_conflicts = IntCounter::new(
            "filmmash_vote_conflicts_total",
            "Vote commits rejected because a film changed since it was read",
        )?;
        let vote_retries = IntCounter::new(
            "filmmash_vote_retries_total",
            "Vote attempts repeated after a conflict",
        )?;
        let films = IntGauge::new("filmmash_films", "Films in the catalog")?;
        let job_runs = IntCounterVec::new(
            Opts::new("filmmash_background_job_runs_total", "Background job executions"),
            &["job_name"],
        )?;
        let job_failures = IntCounterVec::new(
            Opts::new("filmmash_background_job_failures_total", "Failed background job executions"),
            &["job_name"],
        )?;
        let job_duration = HistogramVec::new(
            HistogramOpts::new(
                "filmmash_background_job_duration_seconds",
                "Background job execution time",
            ),
            &["job_name"],
        )?;

        registry.register(Box::new(http_requests.clone()))?;
        registry.register(Box::new(http_latency.clone()))?;
        registry.register(Box::new(http_errors.clone()))?;
        registry.register(Box::new(votes.clone()))?;
        registry.register(Box::new(vote_conflicts.clone()))?;
        registry.register(Box::new(vote_retries.clone()))?;
        registry.register(Box::new(films.clone()))?;
        registry.register(Box::new(job_runs.clone()))?;
        registry.register(Box::new(job_failures.clone()))?;
        registry.register(Box::new(job_duration.clone()))?;

        // CPU and memory of this process
        #[cfg(target_os = "linux")]
        registry.register(Box::new(prometheus::process_collector::ProcessCollector::for_self()))?;

        Ok(Self {
            registry,
            http_requests,
            http_latency,
            http_errors,
            votes,
            vote_conflicts,
            vote_retries,
            films,
            job_runs,
            job_failures,
            job_duration,
        })
    }

    /// Record one served HTTP request
    pub fn observe_request(&self, method: &str, route: &str, status: u16, seconds: f64) {
        self.http_requests
            .with_label_values(&[method, route, &status.to_string()])
            .inc();
        self.http_latency.with_label_values(&[method, route]).observe(seconds);
    }

    pub fn observe_error(&self, route: &str, error: &str) {
        self.http_errors.with_label_values(&[route, error]).inc();
    }

    pub fn observe_vote(&self, outcome: &str) {
        self.votes.with_label_values(&[outcome]).inc();
    }

    /// Run one background job iteration, counting runs, failures and time
    pub async fn track_job<T, E, F>(&self, job_name: &str, job: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        self.job_runs.with_label_values(&[job_name]).inc();
        let started = Instant::now();

        let result = job.await;
        if result.is_err() {
            self.job_failures.with_label_values(&[job_name]).inc();
        }

        self.job_duration
            .with_label_values(&[job_name])
            .observe(started.elapsed().as_secs_f64());
        result
    }

    /// Every metric in the Prometheus text format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        self.encode(self.registry.gather())
    }

    /// Only the metric families whose name starts with `prefix`
    pub fn render_prefix(&self, prefix: &str) -> Result<String, prometheus::Error> {
        let families = self
            .registry
            .gather()
            .into_iter()
            .filter(|family| family.get_name().starts_with(prefix))
            .collect();
        self.encode(families)
    }

    fn encode(&self, families: Vec<prometheus::proto::MetricFamily>) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
