// src/report.rs
//! Report state and its merge operations.
//!
//! Every merge touches a disjoint slice of the report, so merges commute and
//! can be applied in whatever order task completions arrive. Readers may take
//! a snapshot at any time and must expect partially filled sections.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::phrases::Snippet;
use crate::tasks::types::EditorRef;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub subject_title: String,
    /// Editors chosen for fan-out, most active first.
    pub contributors: Vec<EditorRef>,
    pub contributor_snippets: BTreeMap<EditorRef, Vec<Snippet>>,
    pub edit_summary_snippets: Vec<Snippet>,
    pub talk_page_snippets: Vec<Snippet>,
}

impl Report {
    pub fn new(subject_title: impl Into<String>) -> Self {
        Self {
            subject_title: subject_title.into(),
            ..Default::default()
        }
    }

    /// Contributor sections for display: ranked editors first, in rank order,
    /// then any editor with snippets but no rank, by name.
    pub fn contributor_sections(&self) -> Vec<(&EditorRef, &[Snippet])> {
        let mut out: Vec<(&EditorRef, &[Snippet])> = self
            .contributors
            .iter()
            .filter_map(|e| self.contributor_snippets.get(e).map(|s| (e, s.as_slice())))
            .collect();
        for (e, s) in &self.contributor_snippets {
            if !self.contributors.contains(e) {
                out.push((e, s.as_slice()));
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.contributor_snippets.is_empty()
            && self.edit_summary_snippets.is_empty()
            && self.talk_page_snippets.is_empty()
    }
}

/// Shared, incrementally merged report. Cloning shares the same state.
#[derive(Debug, Clone, Default)]
pub struct ReportAggregator {
    inner: Arc<RwLock<Report>>,
}

impl ReportAggregator {
    pub fn new(subject_title: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Report::new(subject_title))),
        }
    }

    // A panicking writer cannot leave a merge half-applied, so poison is ignored.
    fn read(&self) -> RwLockReadGuard<'_, Report> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Report> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> Report {
        self.read().clone()
    }

    pub fn subject_title(&self) -> String {
        self.read().subject_title.clone()
    }

    pub fn set_contributors(&self, ranked: Vec<EditorRef>) {
        self.write().contributors = ranked;
    }

    pub fn set_contributor_snippets(&self, editor: EditorRef, snippets: Vec<Snippet>) {
        self.write().contributor_snippets.insert(editor, snippets);
    }

    pub fn append_edit_summary_snippets(&self, snippets: Vec<Snippet>) {
        self.write().edit_summary_snippets.extend(snippets);
    }

    pub fn set_talk_page_snippets(&self, snippets: Vec<Snippet>) {
        self.write().talk_page_snippets = snippets;
    }
}
