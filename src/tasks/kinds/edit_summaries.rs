// src/tasks/kinds/edit_summaries.rs
use crate::config::render_url;
use crate::error::{ParseError, TaskError};
use crate::tasks::extract::{elements_with, remove_elements, visible_text};
use crate::tasks::types::{TaskKind, TaskOutput};
use crate::tasks::{FetchTask, TaskContext};

/// Human-written summaries from the subject's recent edit history.
pub struct EditSummariesTask {
    pub title: String,
}

impl FetchTask for EditSummariesTask {
    fn kind(&self) -> TaskKind {
        TaskKind::EditSummaries
    }

    fn url(&self, ctx: &TaskContext) -> String {
        let limit = ctx.history_limit.to_string();
        render_url(
            &ctx.endpoints.edit_history,
            &[("title", self.title.as_str()), ("limit", limit.as_str())],
        )
    }

    fn parse(&self, body: &str, ctx: &TaskContext) -> Result<TaskOutput, TaskError> {
        let summaries = extract_summaries(body)?;
        Ok(TaskOutput::Snippets(ctx.phrases.find_snippets(&summaries.join("\n"))))
    }
}

/// Summary texts in page order, section markers (`autocomment`) removed.
pub fn extract_summaries(html: &str) -> Result<Vec<String>, ParseError> {
    if html.trim().is_empty() {
        return Err(ParseError::EmptyBody);
    }
    if !html.contains(r#"id="pagehistory""#) && !html.contains("mw-history") {
        return Err(ParseError::MissingElement("pagehistory"));
    }
    let out = elements_with(html, "span", r#"class="comment"#)
        .into_iter()
        .map(|inner| remove_elements(inner, "span", r#"class="autocomment""#))
        .map(|s| visible_text(&s).replace('\n', " "))
        .filter(|s| !s.is_empty())
        .collect();
    Ok(out)
}
