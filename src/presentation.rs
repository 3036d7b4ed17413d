// src/presentation.rs
//! Presentation-side collaborators. Rendering lives elsewhere; the
//! orchestrator only emits signals through these traits.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::report::Report;

/// Receives report lifecycle signals.
pub trait Presenter: Send + Sync {
    fn report_changed(&self, report: &Report);
    fn report_cleared(&self);
}

/// Whether the subject's view is the one the user is looking at.
pub trait ViewActivity: Send + Sync {
    fn is_subject_view_active(&self) -> bool;
}

/// Opens a URL in a background view on the presentation side's behalf.
pub trait UrlOpener: Send + Sync {
    fn open_in_background(&self, url: &str);
}

/// Logs every signal via `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn report_changed(&self, report: &Report) {
        tracing::info!(
            target: "report",
            subject = %report.subject_title,
            contributors = report.contributor_snippets.len(),
            summaries = report.edit_summary_snippets.len(),
            talk = report.talk_page_snippets.len(),
            "report changed"
        );
    }

    fn report_cleared(&self) {
        tracing::info!(target: "report", "report cleared");
    }
}

/// View tracker for headless use: the subject view is always considered active.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysActive;

impl ViewActivity for AlwaysActive {
    fn is_subject_view_active(&self) -> bool {
        true
    }
}

/// Requests kept while nobody polls; the oldest are dropped beyond this.
pub const OPEN_QUEUE_CAP: usize = 64;

/// Keeps requested URLs so a client can poll and open them.
#[derive(Debug, Default)]
pub struct QueuedOpener {
    pending: Mutex<VecDeque<String>>,
}

impl QueuedOpener {
    /// Take every URL requested since the last call, oldest first.
    pub fn drain(&self) -> Vec<String> {
        let mut q = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        Vec::from(std::mem::take(&mut *q))
    }
}

impl UrlOpener for QueuedOpener {
    fn open_in_background(&self, url: &str) {
        tracing::debug!(target: "report", %url, "open in background requested");
        let mut q = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if q.len() >= OPEN_QUEUE_CAP {
            if let Some(dropped) = q.pop_front() {
                tracing::warn!(target: "report", url = %dropped, "open queue full; oldest request dropped");
            }
        }
        q.push_back(url.to_string());
    }
}
