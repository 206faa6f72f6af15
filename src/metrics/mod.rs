//! Prometheus metrics for the search service.
//!
//! Covers request throughput and latency per search view, result ceiling
//! clamps, and backend failures per operation.
//!
//! # Example
//! ```no_run
//! use vcr_search::metrics::SEARCH_REQUESTS_TOTAL;
//!
//! SEARCH_REQUESTS_TOTAL
//!     .with_label_values(&["credential_topic_search", "200"])
//!     .inc();
//! ```

use lazy_static::lazy_static;
use prometheus::{CounterVec, Gauge, HistogramOpts, HistogramVec, Opts, Registry};

const NAMESPACE: &str = "vcr_search";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    /// Search requests handled
    ///
    /// Labels: view, status
    pub static ref SEARCH_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("search_requests_total", "Total number of search requests")
            .namespace(NAMESPACE),
        &["view", "status"]
    ).expect("Failed to create SEARCH_REQUESTS_TOTAL metric");

    /// Search request duration in seconds
    ///
    /// Labels: view
    pub static ref SEARCH_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "search_request_duration_seconds",
            "Search request duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["view"]
    ).expect("Failed to create SEARCH_REQUEST_DURATION_SECONDS metric");

    /// Requests whose count or window was cut down to the result ceiling
    ///
    /// Labels: view
    pub static ref SEARCH_RESULTS_CLAMPED_TOTAL: CounterVec = CounterVec::new(
        Opts::new("search_results_clamped_total", "Total number of clamped result sets")
            .namespace(NAMESPACE),
        &["view"]
    ).expect("Failed to create SEARCH_RESULTS_CLAMPED_TOTAL metric");

    /// Search backend failures
    ///
    /// Labels: op (count, fetch, facet_counts, index)
    pub static ref SEARCH_BACKEND_ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("search_backend_errors_total", "Total number of search backend errors")
            .namespace(NAMESPACE),
        &["op"]
    ).expect("Failed to create SEARCH_BACKEND_ERRORS_TOTAL metric");

    /// Documents currently in the search index
    pub static ref INDEXED_DOCUMENTS: Gauge = Gauge::with_opts(
        Opts::new("indexed_documents", "Documents currently in the search index")
            .namespace(NAMESPACE)
    ).expect("Failed to create INDEXED_DOCUMENTS metric");
}

/// Register every metric with the Prometheus registry
///
/// Safe to call more than once; metrics that are already registered are skipped.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(SEARCH_REQUESTS_TOTAL.clone()),
        Box::new(SEARCH_REQUEST_DURATION_SECONDS.clone()),
        Box::new(SEARCH_RESULTS_CLAMPED_TOTAL.clone()),
        Box::new(SEARCH_BACKEND_ERRORS_TOTAL.clone()),
        Box::new(INDEXED_DOCUMENTS.clone()),
    ];

    for collector in collectors {
        match PROMETHEUS_REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(e),
        }
    }

    tracing::debug!("Prometheus metrics initialized");
    Ok(())
}

/// Generate Prometheus text format metrics
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics_is_repeatable() {
        assert!(init_metrics().is_ok());
        assert!(init_metrics().is_ok());
    }

    #[test]
    fn test_gather_metrics() {
        init_metrics().unwrap();
        SEARCH_REQUESTS_TOTAL
            .with_label_values(&["topics", "200"])
            .inc();

        let metrics = gather_metrics();
        assert!(metrics.contains("vcr_search_search_requests_total"));
    }
}
