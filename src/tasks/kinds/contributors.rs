// src/tasks/kinds/contributors.rs
use serde::Deserialize;

use crate::config::render_url;
use crate::error::{ParseError, TaskError};
use crate::tasks::types::{EditorRef, TaskKind, TaskOutput};
use crate::tasks::{FetchTask, TaskContext};

#[derive(Debug, Deserialize)]
struct TopEditors {
    top_editors: Vec<TopEditor>,
}

#[derive(Debug, Deserialize)]
struct TopEditor {
    username: String,
    #[allow(dead_code)] // ranking is already encoded in list order
    #[serde(default)]
    count: Option<u64>,
}

/// Ranked contributor list for a subject, most active first.
pub struct ContributorListTask {
    pub title: String,
}

impl FetchTask for ContributorListTask {
    fn kind(&self) -> TaskKind {
        TaskKind::ContributorList
    }

    fn url(&self, ctx: &TaskContext) -> String {
        let cap = ctx.contributor_cap.to_string();
        render_url(
            &ctx.endpoints.contributors,
            &[("title", self.title.as_str()), ("cap", cap.as_str())],
        )
    }

    fn parse(&self, body: &str, ctx: &TaskContext) -> Result<TaskOutput, TaskError> {
        Ok(TaskOutput::Editors(parse_top_editors(body, ctx.contributor_cap)?))
    }
}

pub fn parse_top_editors(body: &str, cap: usize) -> Result<Vec<EditorRef>, ParseError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyBody);
    }
    let parsed: TopEditors = serde_json::from_str(trimmed)?;
    Ok(parsed
        .top_editors
        .into_iter()
        .map(|e| e.username.trim().to_string())
        .filter(|name| !name.is_empty())
        .map(EditorRef)
        .take(cap)
        .collect())
}
