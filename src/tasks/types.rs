// src/tasks/types.rs
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TaskError;
use crate::phrases::Snippet;

/// Unique per spawn within one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Contributor identifier, as returned by the ranked contributor list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditorRef(pub String);

impl EditorRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EditorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EditorRef {
    fn from(s: &str) -> Self {
        EditorRef(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TaskKind {
    ContributorList,
    EditSummaries,
    UserProfile(EditorRef),
    TalkPage,
}

impl TaskKind {
    /// Static label for logs and metric labels.
    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::ContributorList => "contributor_list",
            TaskKind::EditSummaries => "edit_summaries",
            TaskKind::UserProfile(_) => "user_profile",
            TaskKind::TalkPage => "talk_page",
        }
    }

    pub fn is_root(&self) -> bool {
        !matches!(self, TaskKind::UserProfile(_))
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::UserProfile(editor) => write!(f, "user_profile({editor})"),
            other => f.write_str(other.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutput {
    Editors(Vec<EditorRef>),
    Snippets(Vec<Snippet>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TaskStatus {
    Running,
    Succeeded,
    Failed(String),
}

impl TaskStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, TaskStatus::Running)
    }
}

/// What a finished task sends back to its report's coordinator. Sent at most once.
#[derive(Debug)]
pub struct Completion {
    pub id: TaskId,
    pub kind: TaskKind,
    pub result: Result<TaskOutput, TaskError>,
    pub elapsed: Duration,
}
