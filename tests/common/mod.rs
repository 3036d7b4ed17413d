// tests/common/mod.rs
// Shared fakes: a URL-routed fetcher and a recording presenter.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use wiki_trust_report::config::{Endpoints, TrustConfig};
use wiki_trust_report::error::FetchError;
use wiki_trust_report::presentation::{Presenter, ViewActivity};
use wiki_trust_report::tasks::fetcher::Fetcher;
use wiki_trust_report::tasks::TaskContext;
use wiki_trust_report::{Orchestrator, Report};

pub fn test_config() -> TrustConfig {
    TrustConfig {
        task_timeout_secs: 5,
        endpoints: Endpoints {
            contributors: "http://stats.test/top/{title}".into(),
            edit_history: "http://wiki.test/history/{title}".into(),
            user_profile: "http://wiki.test/user/{editor}".into(),
            talk_page: "http://wiki.test/talk/{title}".into(),
        },
        ..TrustConfig::default()
    }
}

pub fn contributors_json(names: &[&str]) -> String {
    let rows: Vec<String> = names
        .iter()
        .enumerate()
        .map(|(i, n)| format!(r#"{{"username":"{n}","count":{}}}"#, 100 - i))
        .collect();
    format!(r#"{{"top_editors":[{}]}}"#, rows.join(","))
}

pub fn history_html(summaries: &[&str]) -> String {
    let items: Vec<String> = summaries
        .iter()
        .map(|s| format!(r#"<li><span class="comment comment--without-parentheses">{s}</span></li>"#))
        .collect();
    format!(r#"<ul id="pagehistory">{}</ul>"#, items.join("\n"))
}

pub fn page_html(body: &str) -> String {
    format!(r#"<html><body><div id="bodyContent"><p>{body}</p></div></body></html>"#)
}

/// Canned response per URL. `Err(status)` simulates an HTTP error.
#[derive(Default)]
pub struct FakeFetcher {
    routes: Mutex<HashMap<String, Result<String, u16>>>,
    hang_prefix: Mutex<Option<String>>,
    panic_prefix: Mutex<Option<String>>,
    pub calls: Mutex<Vec<String>>,
    pub cancelled: Arc<AtomicUsize>,
}

impl FakeFetcher {
    pub fn route(self, url: &str, resp: Result<String, u16>) -> Self {
        self.routes.lock().unwrap().insert(url.to_string(), resp);
        self
    }

    /// Fetches whose URL starts with `prefix` never complete.
    pub fn hang(self, prefix: &str) -> Self {
        *self.hang_prefix.lock().unwrap() = Some(prefix.to_string());
        self
    }

    /// Fetches whose URL starts with `prefix` panic.
    pub fn explode(self, prefix: &str) -> Self {
        *self.panic_prefix.lock().unwrap() = Some(prefix.to_string());
        self
    }

    pub fn calls_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.starts_with(prefix))
            .cloned()
            .collect()
    }
}

/// Counts fetch futures dropped before finishing (i.e. aborted).
struct CancelGuard {
    counter: Arc<AtomicUsize>,
    armed: bool,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if self.armed {
            self.counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        let explode = self
            .panic_prefix
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|p| url.starts_with(p));
        if explode {
            panic!("fake fetcher exploded on {url}");
        }
        let mut guard = CancelGuard {
            counter: self.cancelled.clone(),
            armed: true,
        };

        let hang = self
            .hang_prefix
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|p| url.starts_with(p));
        if hang {
            std::future::pending::<()>().await;
        }
        // let sibling tasks interleave
        tokio::task::yield_now().await;

        guard.armed = false;
        let route = self.routes.lock().unwrap().get(url).cloned();
        match route {
            Some(Ok(body)) => Ok(body),
            Some(Err(status)) => Err(FetchError::Status {
                status,
                url: url.to_string(),
            }),
            None => Err(FetchError::Status {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub struct RecordingPresenter {
    pub changes: AtomicUsize,
    pub cleared: AtomicUsize,
    pub last: Mutex<Option<Report>>,
}

impl Presenter for RecordingPresenter {
    fn report_changed(&self, report: &Report) {
        self.changes.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(report.clone());
    }

    fn report_cleared(&self) {
        self.cleared.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FixedView(pub bool);

impl ViewActivity for FixedView {
    fn is_subject_view_active(&self) -> bool {
        self.0
    }
}

pub fn orchestrator(fetcher: Arc<FakeFetcher>, presenter: Arc<RecordingPresenter>) -> Orchestrator {
    let cfg = test_config();
    let ctx = TaskContext::with_fetcher(&cfg, fetcher).expect("task context");
    Orchestrator::new(Arc::new(ctx))
        .with_fanout_limit(cfg.fanout_limit)
        .with_presenter(presenter)
}

/// Poll `cond` until it holds or a second passes.
pub async fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
