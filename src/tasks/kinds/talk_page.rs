// src/tasks/kinds/talk_page.rs
use crate::config::render_url;
use crate::error::TaskError;
use crate::tasks::extract::body_content_text;
use crate::tasks::types::{TaskKind, TaskOutput};
use crate::tasks::{FetchTask, TaskContext};

/// The subject's discussion page.
pub struct TalkPageTask {
    pub title: String,
}

impl FetchTask for TalkPageTask {
    fn kind(&self) -> TaskKind {
        TaskKind::TalkPage
    }

    fn url(&self, ctx: &TaskContext) -> String {
        render_url(&ctx.endpoints.talk_page, &[("title", self.title.as_str())])
    }

    fn parse(&self, body: &str, ctx: &TaskContext) -> Result<TaskOutput, TaskError> {
        let text = body_content_text(body)?;
        Ok(TaskOutput::Snippets(ctx.phrases.find_snippets(&text)))
    }
}
