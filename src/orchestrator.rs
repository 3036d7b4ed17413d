// src/orchestrator.rs
//! # Report orchestration
//! One coordination loop per report. The loop spawns the three root tasks,
//! reacts to their completions, fans out UserProfile tasks once the
//! contributor list arrives, and is the only writer of the report's
//! [`TaskRegistry`] and [`ReportAggregator`].
//!
//! State flow: `Idle -> SubjectResolving -> RootTasksRunning -> FanoutRunning
//! -> Settled`, with `Discarded` reachable from anywhere. Discard destroys every
//! outstanding task and stops all further `report_changed` signals.

use metrics::gauge;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_FANOUT_LIMIT, MAX_FANOUT_LIMIT};
use crate::error::SubjectResolutionError;
use crate::presentation::{AlwaysActive, LogPresenter, Presenter, QueuedOpener, UrlOpener, ViewActivity};
use crate::registry::TaskRegistry;
use crate::report::{Report, ReportAggregator};
use crate::subject::{SubjectResolver, WikiSubjectResolver};
use crate::tasks::spawn_task;
use crate::tasks::types::{Completion, EditorRef, TaskKind, TaskOutput, TaskStatus};
use crate::tasks::TaskContext;

/// Buffer size for the per-report completion channel.
const COMPLETION_BUFFER: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorState {
    Idle,
    SubjectResolving,
    RootTasksRunning,
    FanoutRunning,
    Settled,
    Discarded,
}

impl OrchestratorState {
    pub fn is_final(self) -> bool {
        matches!(self, OrchestratorState::Settled | OrchestratorState::Discarded)
    }
}

/// Builds report sessions. Holds the collaborators every report shares.
#[derive(Clone)]
pub struct Orchestrator {
    ctx: Arc<TaskContext>,
    resolver: Arc<dyn SubjectResolver>,
    presenter: Arc<dyn Presenter>,
    view: Arc<dyn ViewActivity>,
    opener: Arc<dyn UrlOpener>,
    fanout_limit: usize,
}

impl Orchestrator {
    pub fn new(ctx: Arc<TaskContext>) -> Self {
        Self {
            ctx,
            resolver: Arc::new(WikiSubjectResolver),
            presenter: Arc::new(LogPresenter),
            view: Arc::new(AlwaysActive),
            opener: Arc::new(QueuedOpener::default()),
            fanout_limit: DEFAULT_FANOUT_LIMIT,
        }
    }

    /// Limits fan-out per report. Values above [`MAX_FANOUT_LIMIT`] are clamped.
    pub fn with_fanout_limit(mut self, limit: usize) -> Self {
        self.fanout_limit = limit.min(MAX_FANOUT_LIMIT);
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn SubjectResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_presenter(mut self, presenter: Arc<dyn Presenter>) -> Self {
        self.presenter = presenter;
        self
    }

    pub fn with_view(mut self, view: Arc<dyn ViewActivity>) -> Self {
        self.view = view;
        self
    }

    pub fn with_opener(mut self, opener: Arc<dyn UrlOpener>) -> Self {
        self.opener = opener;
        self
    }

    /// Resolve the loaded page and, if it is a subject view, start its report.
    pub fn open_page(&self, page_url: &str) -> Result<ReportSession, SubjectResolutionError> {
        let (state_tx, state_rx) = watch::channel(OrchestratorState::Idle);
        state_tx.send_replace(OrchestratorState::SubjectResolving);

        match self.resolver.resolve(page_url) {
            Ok(title) => Ok(self.launch(title, state_tx, state_rx)),
            Err(e) => {
                warn!(target: "report", %page_url, error = %e, "subject resolution failed");
                Err(e)
            }
        }
    }

    /// Start a report for an already-resolved subject title.
    pub fn start(&self, subject_title: impl Into<String>) -> ReportSession {
        let (state_tx, state_rx) = watch::channel(OrchestratorState::Idle);
        state_tx.send_replace(OrchestratorState::SubjectResolving);
        self.launch(subject_title.into(), state_tx, state_rx)
    }

    /// Forward a presentation-side "open this URL" request. The URL is passed
    /// through unchanged.
    pub fn open_url(&self, url: &str) {
        self.opener.open_in_background(url);
    }

    fn launch(
        &self,
        subject: String,
        state_tx: watch::Sender<OrchestratorState>,
        state_rx: watch::Receiver<OrchestratorState>,
    ) -> ReportSession {
        let report = ReportAggregator::new(subject.clone());
        let cancel = CancellationToken::new();
        let (done_tx, done_rx) = mpsc::channel(COMPLETION_BUFFER);

        let coordinator = Coordinator {
            subject: subject.clone(),
            ctx: self.ctx.clone(),
            registry: TaskRegistry::new(),
            report: report.clone(),
            presenter: self.presenter.clone(),
            view: self.view.clone(),
            state: state_tx,
            done_tx,
            cancel: cancel.clone(),
            fanout_limit: self.fanout_limit,
            contributors_done: false,
            fanout_spawned: 0,
        };
        info!(target: "report", %subject, "report started");
        let handle = tokio::spawn(coordinator.run(done_rx));

        ReportSession {
            subject,
            report,
            state: state_rx,
            cancel,
            coordinator: Some(handle),
        }
    }
}

/// A live report for one subject view. Dropping it discards the report.
pub struct ReportSession {
    subject: String,
    report: ReportAggregator,
    state: watch::Receiver<OrchestratorState>,
    cancel: CancellationToken,
    coordinator: Option<JoinHandle<()>>,
}

impl ReportSession {
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Current (possibly partial) report.
    pub fn snapshot(&self) -> Report {
        self.report.snapshot()
    }

    pub fn state(&self) -> OrchestratorState {
        *self.state.borrow()
    }

    pub fn state_watch(&self) -> watch::Receiver<OrchestratorState> {
        self.state.clone()
    }

    /// Wait until every task has completed (or the report was discarded).
    pub async fn settled(&self) -> OrchestratorState {
        let mut rx = self.state.clone();
        let reached = rx.wait_for(|s| s.is_final()).await.map(|s| *s);
        match reached {
            Ok(s) => s,
            Err(_) => *rx.borrow(),
        }
    }

    /// Navigate away: destroy all outstanding tasks and drop the report. Once
    /// this returns, no further signal is emitted for this report.
    pub async fn discard(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.coordinator.take() {
            if let Err(e) = handle.await {
                warn!(target: "report", subject = %self.subject, error = %e, "coordinator ended abnormally");
            }
        }
    }
}

impl Drop for ReportSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Coordinator {
    subject: String,
    ctx: Arc<TaskContext>,
    registry: TaskRegistry,
    report: ReportAggregator,
    presenter: Arc<dyn Presenter>,
    view: Arc<dyn ViewActivity>,
    state: watch::Sender<OrchestratorState>,
    done_tx: mpsc::Sender<Completion>,
    cancel: CancellationToken,
    fanout_limit: usize,
    contributors_done: bool,
    fanout_spawned: usize,
}

impl Coordinator {
    async fn run(mut self, mut done_rx: mpsc::Receiver<Completion>) {
        gauge!("report_sessions_active").increment(1.0);

        self.spawn(TaskKind::ContributorList);
        self.spawn(TaskKind::EditSummaries);
        self.spawn(TaskKind::TalkPage);
        self.set_state(OrchestratorState::RootTasksRunning);

        let cancel = self.cancel.clone();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(done) = done_rx.recv() => self.handle(done),
            }
        }

        // Discard: close the channel first so late senders fail, then every task.
        done_rx.close();
        let closed = self.registry.teardown();
        self.set_state(OrchestratorState::Discarded);
        self.presenter.report_cleared();
        gauge!("report_sessions_active").decrement(1.0);
        info!(target: "report", subject = %self.subject, closed, "report discarded");
    }

    fn spawn(&mut self, kind: TaskKind) {
        let id = self.registry.next_id();
        let handle = spawn_task(id, kind.clone(), &self.subject, self.ctx.clone(), self.done_tx.clone());
        self.registry.register(id, kind, handle);
    }

    fn set_state(&self, next: OrchestratorState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            debug!(target: "report", subject = %self.subject, ?prev, ?next, "state");
        }
    }

    fn handle(&mut self, done: Completion) {
        let Completion {
            id,
            kind,
            result,
            elapsed,
        } = done;

        if !self.registry.status(id).is_some_and(TaskStatus::is_running) {
            debug!(target: "report", %id, %kind, "stale completion ignored");
            return;
        }

        let (status, changed) = match result {
            Ok(output) => (TaskStatus::Succeeded, self.merge(&kind, output)),
            Err(e) => {
                warn!(target: "report", subject = %self.subject, %id, %kind, error = %e, "task failed");
                if kind == TaskKind::ContributorList {
                    self.begin_fanout(Vec::new());
                }
                (TaskStatus::Failed(e.to_string()), false)
            }
        };
        debug!(target: "report", %id, %kind, ms = elapsed.as_millis() as u64, ok = matches!(status, TaskStatus::Succeeded), "task completed");

        self.registry.mark_done(id, status);
        self.registry.reap();

        if changed && !self.cancel.is_cancelled() && self.view.is_subject_view_active() {
            self.presenter.report_changed(&self.report.snapshot());
        }

        if self.contributors_done && self.registry.running() == 0 {
            if self.state.borrow().is_final() {
                return;
            }
            info!(target: "report", subject = %self.subject, fanout = self.fanout_spawned, "report settled");
            self.set_state(OrchestratorState::Settled);
        }
    }

    /// Apply a successful output. Returns true when visible report content changed.
    fn merge(&mut self, kind: &TaskKind, output: TaskOutput) -> bool {
        match (kind, output) {
            (TaskKind::ContributorList, TaskOutput::Editors(editors)) => {
                self.begin_fanout(editors);
                false
            }
            (TaskKind::EditSummaries, TaskOutput::Snippets(s)) => {
                self.report.append_edit_summary_snippets(s);
                true
            }
            (TaskKind::TalkPage, TaskOutput::Snippets(s)) => {
                self.report.set_talk_page_snippets(s);
                true
            }
            (TaskKind::UserProfile(editor), TaskOutput::Snippets(s)) => {
                self.report.set_contributor_snippets(editor.clone(), s);
                true
            }
            (kind, _) => {
                warn!(target: "report", %kind, "output does not match task kind; dropped");
                if *kind == TaskKind::ContributorList {
                    self.begin_fanout(Vec::new());
                }
                false
            }
        }
    }

    /// Spawn one UserProfile task per editor in the bounded prefix.
    fn begin_fanout(&mut self, mut editors: Vec<EditorRef>) {
        if self.contributors_done {
            return;
        }
        self.contributors_done = true;

        editors.truncate(self.fanout_limit);
        self.report.set_contributors(editors.clone());
        for editor in editors {
            self.spawn(TaskKind::UserProfile(editor));
            self.fanout_spawned += 1;
        }
        self.set_state(OrchestratorState::FanoutRunning);
    }
}
