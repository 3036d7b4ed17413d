//! Error taxonomy for trust-report assembly.
//!
//! Fetch tasks never let these escape as panics: every failure is turned into a
//! [`TaskError`] and delivered to the coordinator as the task's single outcome.

use thiserror::Error;

/// A malformed interest pattern. `index` and `label` locate the offending
/// entry in the phrase table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("interest pattern #{index} ({label}) is invalid: {message}")]
pub struct PatternError {
    pub index: usize,
    pub label: String,
    pub message: String,
}

/// Network-level failures while retrieving a remote page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("fetch timed out after {0}s")]
    Timeout(u64),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Network(e.to_string())
    }
}

/// The fetched page did not have the shape we expected.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("page has no `{0}` element")]
    MissingElement(&'static str),

    #[error("empty response body")]
    EmptyBody,

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The loaded page is not a subject view we can report on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubjectResolutionError {
    #[error("not a wiki article URL: {0}")]
    NotAnArticle(String),

    #[error("special namespace `{0}` is not a subject view")]
    SpecialNamespace(String),

    #[error("article title is empty")]
    EmptyTitle,
}

/// The single opaque error value a fetch task hands to its completion.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("task panicked: {0}")]
    Panicked(String),
}
