//! Geocoding run metrics
//!
//! Counters and histograms recorded by the pipeline. Without an installed
//! recorder the macros are no-ops, so the exporter is opt-in via config.

use std::net::SocketAddr;

use tracing::{info, warn};

const REQUESTS_TOTAL: &str = "address_to_utm_geocode_requests_total";
const REQUEST_DURATION: &str = "address_to_utm_geocode_request_duration_seconds";
const OUTCOMES_TOTAL: &str = "address_to_utm_geocode_outcomes_total";
const ROWS_WRITTEN_TOTAL: &str = "address_to_utm_rows_written_total";
const PAUSES_TOTAL: &str = "address_to_utm_rate_limit_pauses_total";

/// Installs the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => {
            info!("Prometheus exporter listening on http://{}/metrics", addr);
            GeocodeMetrics::register_metrics();
        }
        Err(e) => {
            warn!("Prometheus exporter install failed: {}", e);
        }
    }
}

pub struct GeocodeMetrics;

impl GeocodeMetrics {
    pub fn record_request(duration_secs: f64) {
        ::metrics::counter!(REQUESTS_TOTAL).increment(1);
        ::metrics::histogram!(REQUEST_DURATION).record(duration_secs);
    }

    /// Record the service status of one response, e.g. `OK` or `ZERO_RESULTS`
    pub fn record_outcome(status: &str) {
        ::metrics::counter!(OUTCOMES_TOTAL, "status" => status.to_string()).increment(1);
    }

    pub fn record_row_written() {
        ::metrics::counter!(ROWS_WRITTEN_TOTAL).increment(1);
    }

    pub fn record_pause() {
        ::metrics::counter!(PAUSES_TOTAL).increment(1);
    }

    pub fn register_metrics() {
        use ::metrics::{counter, histogram};

        let _ = counter!(REQUESTS_TOTAL);
        let _ = counter!(ROWS_WRITTEN_TOTAL);
        let _ = counter!(PAUSES_TOTAL);
        let _ = histogram!(REQUEST_DURATION);
    }

    pub fn metric_names() -> Vec<&'static str> {
        vec![
            REQUESTS_TOTAL,
            REQUEST_DURATION,
            OUTCOMES_TOTAL,
            ROWS_WRITTEN_TOTAL,
            PAUSES_TOTAL,
        ]
    }
}
