// Prometheus metrics definitions for the ladder service.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Counters ─────────────────────────────────────────────────────

    /// Total HTTP requests, by method/endpoint/status.
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("ladder_http_requests_total", "Total HTTP requests"),
        &["method", "endpoint", "status"],
    )
    .unwrap();

    /// Full ladder recomputations (cache misses that hit the database).
    pub static ref LADDER_COMPUTATIONS_TOTAL: IntCounter = IntCounter::new(
        "ladder_computations_total",
        "Full ladder recomputations",
    )
    .unwrap();

    /// Games folded into a ranking, summed across recomputations.
    pub static ref GAMES_RANKED_TOTAL: IntCounter = IntCounter::new(
        "ladder_games_ranked_total",
        "Games folded into rankings",
    )
    .unwrap();

    /// Ladder responses served from the cache.
    pub static ref CACHE_HITS_TOTAL: IntCounter = IntCounter::new(
        "ladder_cache_hits_total",
        "Responses served from cache",
    )
    .unwrap();

    /// Ladder requests that missed the cache.
    pub static ref CACHE_MISSES_TOTAL: IntCounter = IntCounter::new(
        "ladder_cache_misses_total",
        "Requests that missed the cache",
    )
    .unwrap();

    // ── Histograms ───────────────────────────────────────────────────

    /// HTTP request duration in seconds, by endpoint.
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "ladder_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]),
        &["endpoint"],
    )
    .unwrap();
}

/// Register all metrics with the custom registry. Call once at startup.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(LADDER_COMPUTATIONS_TOTAL.clone()),
        Box::new(GAMES_RANKED_TOTAL.clone()),
        Box::new(CACHE_HITS_TOTAL.clone()),
        Box::new(CACHE_MISSES_TOTAL.clone()),
        Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()),
    ];

    for c in collectors {
        REGISTRY.register(c).expect("failed to register metric");
    }
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Normalize a URL path for metric labels: replace numeric path segments with
/// `:id` to prevent cardinality explosion.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.parse::<i64>().is_ok() {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
