//! Prometheus metrics for HTTP traffic.
//!
//! Three series are tracked per request:
//! - request count, labelled by method and endpoint
//! - request latency histogram, labelled by method and endpoint
//! - error count for non-2xx responses, labelled by method, endpoint and status

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::error::Result;

// === Metric Name Constants ===

/// HTTP requests counter metric name.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";
/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_seconds";
/// HTTP error responses counter metric name.
pub const METRIC_HTTP_ERRORS: &str = "http_errors_total";

/// Content type of the Prometheus text exposition format.
pub const CONTENT_TYPE_LATEST: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Latency buckets in seconds.
const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the global Prometheus recorder and register metric descriptions.
///
/// Safe to call more than once: later calls return the handle created by
/// the first.
pub fn install() -> Result<PrometheusHandle> {
    HANDLE
        .get_or_try_init(|| -> Result<PrometheusHandle> {
            let handle = PrometheusBuilder::new()
                .set_buckets_for_metric(
                    Matcher::Full(METRIC_HTTP_REQUEST_LATENCY.to_string()),
                    LATENCY_BUCKETS,
                )?
                .install_recorder()?;
            describe_metrics();
            debug!("Metrics initialized");
            Ok(handle)
        })
        .cloned()
}

fn describe_metrics() {
    describe_counter!(METRIC_HTTP_REQUESTS, "Total HTTP requests");
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        Unit::Seconds,
        "HTTP request latency in seconds"
    );
    describe_counter!(METRIC_HTTP_ERRORS, "Total HTTP responses with an error status");
}

/// Increment the request counter.
pub fn inc_requests(method: &str, endpoint: &str) {
    counter!(
        METRIC_HTTP_REQUESTS,
        "method" => method.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
}

/// Record request latency.
pub fn record_latency(start: Instant, method: &str, endpoint: &str) {
    histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "method" => method.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Increment the error counter.
pub fn inc_errors(method: &str, endpoint: &str, status: StatusCode) {
    counter!(
        METRIC_HTTP_ERRORS,
        "method" => method.to_string(),
        "endpoint" => endpoint.to_string(),
        "status_code" => status.as_u16().to_string()
    )
    .increment(1);
}

/// Endpoint label shared by every request that matched no route.
pub const UNMATCHED_ENDPOINT: &str = "unmatched";

/// Endpoint label for a request: the matched route template when routing
/// succeeded, [`UNMATCHED_ENDPOINT`] otherwise.
pub fn endpoint_label(req: &Request) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ENDPOINT.to_string())
}

/// Middleware counting every request before its handler runs and recording
/// latency and error status once it completes.
pub async fn track_http(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let endpoint = endpoint_label(&req);

    inc_requests(&method, &endpoint);

    let response = next.run(req).await;

    record_latency(start, &method, &endpoint);
    let status = response.status();
    if !status.is_success() {
        inc_errors(&method, &endpoint, status);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http;

    #[test]
    fn endpoint_label_without_route_is_unmatched() {
        let req = http::Request::builder()
            .uri("/pessoa/123?x=1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(endpoint_label(&req), UNMATCHED_ENDPOINT);
    }

    #[test]
    fn install_is_idempotent() {
        let first = install().unwrap();
        let second = install().unwrap();

        inc_requests("GET", "/idempotent");
        assert!(first.render().contains(r#"endpoint="/idempotent""#));
        assert!(second.render().contains(r#"endpoint="/idempotent""#));
    }

    #[test]
    fn latency_renders_as_histogram() {
        let handle = install().unwrap();
        record_latency(Instant::now(), "GET", "/histogram");
        inc_errors("GET", "/histogram", StatusCode::NOT_FOUND);

        let rendered = handle.render();
        assert!(rendered.contains("http_request_latency_seconds_bucket"));
        assert!(rendered.contains(r#"status_code="404""#));
    }
}
