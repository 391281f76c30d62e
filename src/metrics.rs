use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder (once per process) and describe our series.
    pub fn init() -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| {
                let handle = PrometheusBuilder::new().install_recorder()?;
                describe();
                Ok::<_, anyhow::Error>(handle)
            })?
            .clone();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!(
        "outcomes_scored_total",
        "Outcome scores computed on create or rating update."
    );
    describe_counter!(
        "weather_fetch_total",
        "Weather fetch requests by result (cached, fetched, error)."
    );
    describe_counter!(
        "dashboard_requests_total",
        "Dashboard views served, labelled by view."
    );
    describe_counter!(
        "http_auth_failures_total",
        "Requests rejected by bearer authentication."
    );
    describe_histogram!(
        "weather_fetch_duration_ms",
        "Upstream weather call latency in milliseconds."
    );
}
