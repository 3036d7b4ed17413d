use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and describe the report series.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder()?;

        describe_counter!("report_tasks_spawned_total", "Fetch tasks spawned, by kind.");
        describe_counter!("report_task_errors_total", "Fetch tasks that failed, by kind.");
        describe_counter!("report_tasks_reaped_total", "Finished tasks destroyed by reap.");
        describe_histogram!("report_task_ms", "Fetch + parse time per task in milliseconds.");
        describe_gauge!("report_sessions_active", "Reports currently alive.");

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
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
