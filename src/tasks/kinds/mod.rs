// src/tasks/kinds/mod.rs
pub mod contributors;
pub mod edit_summaries;
pub mod talk_page;
pub mod user_profile;

pub use contributors::ContributorListTask;
pub use edit_summaries::EditSummariesTask;
pub use talk_page::TalkPageTask;
pub use user_profile::UserProfileTask;
