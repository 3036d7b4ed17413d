// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod phrases;
pub mod presentation;
pub mod registry;
pub mod report;
pub mod subject;
pub mod tasks;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::config::TrustConfig;
pub use crate::orchestrator::{Orchestrator, OrchestratorState, ReportSession};
pub use crate::phrases::{find_snippets, InterestPattern, PhraseTable, Snippet};
pub use crate::report::{Report, ReportAggregator};

use std::sync::Arc;

/// Build an orchestrator from config with the real HTTP fetcher.
/// Fails when the phrase table does not compile.
pub fn orchestrator_from_config(cfg: &TrustConfig) -> anyhow::Result<Orchestrator> {
    let ctx = tasks::TaskContext::from_config(cfg)?;
    Ok(Orchestrator::new(Arc::new(ctx)).with_fanout_limit(cfg.fanout_limit))
}
