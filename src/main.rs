//! Trust report service binary entrypoint.
//! Loads config, compiles the phrase table, and serves the report API.

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wiki_trust_report::{api, metrics::Metrics, orchestrator_from_config, TrustConfig};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// `RUST_LOG` drives the filter; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("report=info,tasks=info,wiki_trust_report=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = TrustConfig::load().context("loading report config")?;
    // Malformed interest patterns stop startup here.
    let orchestrator = orchestrator_from_config(&cfg)?;
    tracing::info!(
        fanout_limit = cfg.fanout_limit,
        phrases = cfg.phrases.len(),
        timeout_secs = cfg.task_timeout_secs,
        "report config loaded"
    );

    let mut app = api::router(api::AppState::new(orchestrator));
    match Metrics::init() {
        Ok(m) => app = app.merge(m.router()),
        Err(e) => tracing::warn!(error = %e, "metrics recorder not installed"),
    }

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
