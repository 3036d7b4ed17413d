// src/subject.rs
//! Subject resolution: loaded page URL -> canonical article title.

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::error::SubjectResolutionError;

/// Namespaces that are never the subject of a report.
const SPECIAL_NAMESPACES: &[&str] = &[
    "Talk",
    "User",
    "User_talk",
    "Wikipedia",
    "Wikipedia_talk",
    "File",
    "File_talk",
    "MediaWiki",
    "MediaWiki_talk",
    "Template",
    "Template_talk",
    "Help",
    "Help_talk",
    "Category",
    "Category_talk",
    "Portal",
    "Portal_talk",
    "Book",
    "Book_talk",
    "Draft",
    "Draft_talk",
    "Education_Program",
    "Education_Program_talk",
    "TimedText",
    "TimedText_talk",
    "Module",
    "Module_talk",
    "Special",
    "Media",
];

pub trait SubjectResolver: Send + Sync {
    fn resolve(&self, page_url: &str) -> Result<String, SubjectResolutionError>;
}

/// Resolves `https://<lang>.wikipedia.org/wiki/<Title>` article URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct WikiSubjectResolver;

fn re_article() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^https?://[a-z0-9.-]*\.wikipedia\.org/wiki/([^?#]*)").expect("article url regex")
    })
}

impl SubjectResolver for WikiSubjectResolver {
    fn resolve(&self, page_url: &str) -> Result<String, SubjectResolutionError> {
        let raw = re_article()
            .captures(page_url.trim())
            .and_then(|c| c.get(1))
            .ok_or_else(|| SubjectResolutionError::NotAnArticle(page_url.to_string()))?
            .as_str();

        let decoded = urlencoding::decode(raw)
            .map(|c| c.into_owned())
            .unwrap_or_else(|_| raw.to_string());

        if let Some((ns, _)) = decoded.split_once(':') {
            let ns = ns.replace(' ', "_");
            if let Some(hit) = SPECIAL_NAMESPACES.iter().find(|s| s.eq_ignore_ascii_case(&ns)) {
                return Err(SubjectResolutionError::SpecialNamespace((*hit).to_string()));
            }
        }

        let title = decoded.replace('_', " ").trim().to_string();
        if title.is_empty() {
            return Err(SubjectResolutionError::EmptyTitle);
        }
        Ok(title)
    }
}
