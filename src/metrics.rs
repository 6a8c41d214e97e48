use anyhow::{Context, Result};
use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;
use tracing::info;

/// Metric name prefix for all guide-notifier metrics
const PREFIX: &str = "guide_notifier";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Execution Metrics
    pub static ref EXECUTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_executions_total"), "Total job executions by outcome"),
        &["trigger", "outcome"]
    ).expect("Failed to create executions_total metric");

    pub static ref EXECUTION_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_execution_duration_seconds"),
            "Job execution duration in seconds"
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["trigger"]
    ).expect("Failed to create execution_duration_seconds metric");

    // Delivery Metrics
    pub static ref DELIVERIES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_deliveries_total"), "Notification deliveries by result"),
        &["result"]
    ).expect("Failed to create deliveries_total metric");

    // Registry Metrics
    pub static ref REGISTRATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_registrations_total"), "Periodic job registrations by result"),
        &["result"]
    ).expect("Failed to create registrations_total metric");

    pub static ref PERIODIC_JOB_ACTIVE: GaugeVec = GaugeVec::new(
        Opts::new(
            format!("{PREFIX}_periodic_job_active"),
            "Whether a periodic job is scheduled (1) or not (0)"
        ),
        &["job"]
    ).expect("Failed to create periodic_job_active metric");
}

pub fn init_metrics() {
    // Ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(EXECUTIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(EXECUTION_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(DELIVERIES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(REGISTRATIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PERIODIC_JOB_ACTIVE.clone()));
}

/// Record a finished execution
pub fn record_execution(trigger: &str, outcome: &str, duration: Duration) {
    EXECUTIONS_TOTAL
        .with_label_values(&[trigger, outcome])
        .inc();

    EXECUTION_DURATION_SECONDS
        .with_label_values(&[trigger])
        .observe(duration.as_secs_f64());
}

/// Record a delivery result: `delivered`, `suppressed` or `failed`
pub fn record_delivery(result: &str) {
    DELIVERIES_TOTAL.with_label_values(&[result]).inc();
}

/// Record a periodic registration: `scheduled`, `replaced`, `kept` or `refused`
pub fn record_registration(result: &str) {
    REGISTRATIONS_TOTAL.with_label_values(&[result]).inc();
}

pub fn set_periodic_job_active(job: &str, active: bool) {
    PERIODIC_JOB_ACTIVE
        .with_label_values(&[job])
        .set(if active { 1.0 } else { 0.0 });
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}

/// Serve `/metrics` on 127.0.0.1:`port` until the process exits.
pub async fn run_metrics_server(port: u16) -> Result<()> {
    let app = Router::new().route("/metrics", get(metrics_handler));
    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind metrics server to port {}", port))?;
    info!("Metrics available at port {}", port);
    axum::serve(listener, app)
        .await
        .context("Metrics server stopped")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find_family(name: &str) -> Option<prometheus::proto::MetricFamily> {
        REGISTRY
            .gather()
            .into_iter()
            .find(|m| m.get_name() == format!("{PREFIX}_{name}"))
    }

    #[test]
    fn test_metrics_initialization() {
        init_metrics();
        // Calling twice must not panic
        init_metrics();

        record_registration("scheduled");
        assert!(!REGISTRY.gather().is_empty(), "Metrics should be registered");
    }

    #[test]
    fn test_record_execution() {
        init_metrics();

        record_execution("one_off", "success", Duration::from_millis(5));

        let family = find_family("executions_total").expect("executions metric should exist");
        assert!(!family.get_metric().is_empty());
        assert!(find_family("execution_duration_seconds").is_some());
    }

    #[test]
    fn test_record_delivery() {
        init_metrics();

        let before = DELIVERIES_TOTAL.with_label_values(&["suppressed"]).get();
        record_delivery("suppressed");
        let after = DELIVERIES_TOTAL.with_label_values(&["suppressed"]).get();

        assert!(after >= before + 1.0);
    }

    #[test]
    fn test_periodic_job_gauge() {
        init_metrics();

        set_periodic_job_active("metrics-test-job", true);
        assert_eq!(
            PERIODIC_JOB_ACTIVE
                .with_label_values(&["metrics-test-job"])
                .get(),
            1.0
        );
        set_periodic_job_active("metrics-test-job", false);
        assert_eq!(
            PERIODIC_JOB_ACTIVE
                .with_label_values(&["metrics-test-job"])
                .get(),
            0.0
        );
    }

    #[tokio::test]
    async fn test_metrics_handler_returns_text() {
        init_metrics();
        record_delivery("delivered");

        let response = metrics_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
