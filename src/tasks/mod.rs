// src/tasks/mod.rs
//! Fetch tasks: one remote fetch, a synchronous parse on arrival, and exactly
//! one [`Completion`] sent to the owning report's coordinator.

pub mod extract;
pub mod fetcher;
pub mod kinds;
pub mod types;

use futures::FutureExt;
use metrics::{counter, histogram};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{Endpoints, TrustConfig};
use crate::error::{FetchError, TaskError};
use crate::phrases::PhraseTable;
use crate::tasks::fetcher::{Fetcher, HttpFetcher};
use crate::tasks::kinds::{ContributorListTask, EditSummariesTask, TalkPageTask, UserProfileTask};
use crate::tasks::types::{Completion, TaskId, TaskKind, TaskOutput};

/// Shared, read-only inputs for every task of every report.
pub struct TaskContext {
    pub fetcher: Arc<dyn Fetcher>,
    pub phrases: Arc<PhraseTable>,
    pub endpoints: Endpoints,
    pub contributor_cap: usize,
    pub history_limit: usize,
    pub timeout: Option<Duration>,
}

impl TaskContext {
    /// Build from config with the real HTTP fetcher. Fails if a phrase does not compile.
    pub fn from_config(cfg: &TrustConfig) -> anyhow::Result<Self> {
        let fetcher = HttpFetcher::new(&cfg.user_agent, cfg.task_timeout())?;
        Self::with_fetcher(cfg, Arc::new(fetcher))
    }

    pub fn with_fetcher(cfg: &TrustConfig, fetcher: Arc<dyn Fetcher>) -> anyhow::Result<Self> {
        Ok(Self {
            fetcher,
            phrases: Arc::new(cfg.phrase_table()?),
            endpoints: cfg.endpoints.clone(),
            contributor_cap: cfg.contributor_cap,
            history_limit: cfg.history_limit,
            timeout: cfg.task_timeout(),
        })
    }
}

/// One resource kind: where to fetch it and how to read it.
pub trait FetchTask: Send + Sync {
    fn kind(&self) -> TaskKind;
    fn url(&self, ctx: &TaskContext) -> String;
    fn parse(&self, body: &str, ctx: &TaskContext) -> Result<TaskOutput, TaskError>;
}

/// Concrete task for `kind` about `subject`.
pub fn task_for(kind: &TaskKind, subject: &str) -> Box<dyn FetchTask> {
    match kind {
        TaskKind::ContributorList => Box::new(ContributorListTask {
            title: subject.to_string(),
        }),
        TaskKind::EditSummaries => Box::new(EditSummariesTask {
            title: subject.to_string(),
        }),
        TaskKind::UserProfile(editor) => Box::new(UserProfileTask {
            editor: editor.clone(),
        }),
        TaskKind::TalkPage => Box::new(TalkPageTask {
            title: subject.to_string(),
        }),
    }
}

/// Fetch + parse. All failures come back as `Err`, never as a panic.
pub async fn run_task(task: &dyn FetchTask, ctx: &TaskContext) -> Result<TaskOutput, TaskError> {
    let url = task.url(ctx);
    tracing::debug!(target: "tasks", kind = %task.kind(), %url, "fetching");

    let fetch = ctx.fetcher.fetch(&url);
    let body = match ctx.timeout {
        Some(limit) => tokio::time::timeout(limit, fetch)
            .await
            .map_err(|_| FetchError::Timeout(limit.as_secs()))??,
        None => fetch.await?,
    };
    task.parse(&body, ctx)
}

/// Spawn `kind` on the runtime. The returned handle is the task's resource;
/// aborting it guarantees the completion is never sent.
pub fn spawn_task(
    id: TaskId,
    kind: TaskKind,
    subject: &str,
    ctx: Arc<TaskContext>,
    done_tx: mpsc::Sender<Completion>,
) -> JoinHandle<()> {
    let task = task_for(&kind, subject);
    counter!("report_tasks_spawned_total", "kind" => kind.label()).increment(1);

    tokio::spawn(async move {
        let t0 = Instant::now();
        let result = AssertUnwindSafe(run_task(task.as_ref(), &ctx))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(TaskError::Panicked(panic_message(payload.as_ref()))));
        let elapsed = t0.elapsed();

        histogram!("report_task_ms", "kind" => kind.label()).record(elapsed.as_secs_f64() * 1_000.0);
        if result.is_err() {
            counter!("report_task_errors_total", "kind" => kind.label()).increment(1);
        }

        // A closed channel means the report was discarded; nothing to deliver.
        let _ = done_tx
            .send(Completion {
                id,
                kind,
                result,
                elapsed,
            })
            .await;
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
