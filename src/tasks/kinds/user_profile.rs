// src/tasks/kinds/user_profile.rs
use crate::config::render_url;
use crate::error::TaskError;
use crate::tasks::extract::body_content_text;
use crate::tasks::types::{EditorRef, TaskKind, TaskOutput};
use crate::tasks::{FetchTask, TaskContext};

/// A contributor's profile page, scanned for interest phrases.
pub struct UserProfileTask {
    pub editor: EditorRef,
}

impl FetchTask for UserProfileTask {
    fn kind(&self) -> TaskKind {
        TaskKind::UserProfile(self.editor.clone())
    }

    fn url(&self, ctx: &TaskContext) -> String {
        render_url(&ctx.endpoints.user_profile, &[("editor", self.editor.as_str())])
    }

    fn parse(&self, body: &str, ctx: &TaskContext) -> Result<TaskOutput, TaskError> {
        let text = body_content_text(body)?;
        Ok(TaskOutput::Snippets(ctx.phrases.find_snippets(&text)))
    }
}
