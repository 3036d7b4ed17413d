// src/phrases.rs
//! Interest phrases: pattern table, compilation and snippet extraction.
//!
//! A snippet is the first match of a pattern plus up to [`CONTEXT_CHARS`]
//! characters of context on either side, all on the same line. The context is
//! captured by embedding the pattern in a wider expression so the window
//! follows the pattern's own match boundaries.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::PatternError;

/// Context kept on each side of a match, in characters.
pub const CONTEXT_CHARS: usize = 40;

/// Raw pattern + human description, as written in config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InterestPattern {
    pub pattern: String,
    pub label: String,
}

impl InterestPattern {
    pub fn new(pattern: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            label: label.into(),
        }
    }
}

/// Bounded context window around a pattern match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snippet {
    pub text: String,
    pub label: String,
}

/// Built-in phrase table used when config does not provide one.
pub fn default_patterns() -> Vec<InterestPattern> {
    vec![
        InterestPattern::new("pa(y|ying|id|yment)", "pay/paying/paid/payment"),
        InterestPattern::new(
            "compensat(e|ed|ion|ing)",
            "compensate/compensated/compensation/compensating",
        ),
        InterestPattern::new("hire(d|s|ing)?", "hire/hired/hires/hiring"),
        InterestPattern::new(
            "disclos(e|ed|ure|ing)",
            "disclose/disclosed/disclosure/disclosing",
        ),
        InterestPattern::new(
            "contribut(e|ed|ion|ing)",
            "contribute/contributed/contribution/contributing",
        ),
        InterestPattern::new("affiliat(e|ed|ion)", "affiliate/affiliated/affiliation"),
        InterestPattern::new("client(ele)?", "client/clientele"),
        InterestPattern::new(
            "employ(ee|er|ed|ing)?",
            "employ/employee/employer/employed/employing",
        ),
        InterestPattern::new("work(s|ed|ing)?", "work/works/worked/working"),
    ]
}

#[derive(Debug)]
struct CompiledPhrase {
    label: String,
    bare: Regex,
    context: Regex,
}

/// Compiled, validated phrase table. Built once at startup and shared
/// read-only by every task.
#[derive(Debug)]
pub struct PhraseTable {
    phrases: Vec<CompiledPhrase>,
}

impl PhraseTable {
    /// Compile every pattern. Fails on the first malformed one; no partial table.
    pub fn compile(patterns: &[InterestPattern]) -> Result<Self, PatternError> {
        let phrases = patterns
            .iter()
            .enumerate()
            .map(|(index, p)| {
                let err = |e: regex::Error| PatternError {
                    index,
                    label: p.label.clone(),
                    message: e.to_string(),
                };
                let bare = build(&p.pattern).map_err(err)?;
                let context = build(&context_expr(&p.pattern)).map_err(err)?;
                Ok(CompiledPhrase {
                    label: p.label.clone(),
                    bare,
                    context,
                })
            })
            .collect::<Result<Vec<_>, PatternError>>()?;
        Ok(Self { phrases })
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// At most one snippet per phrase, in table order.
    pub fn find_snippets(&self, text: &str) -> Vec<Snippet> {
        let mut out = Vec::new();
        for ph in &self.phrases {
            if !ph.bare.is_match(text) {
                continue;
            }
            if let Some(m) = ph.context.find(text) {
                out.push(Snippet {
                    text: m.as_str().to_string(),
                    label: ph.label.clone(),
                });
            }
        }
        out
    }
}

/// One-shot extraction over raw patterns. Either every pattern compiles and
/// the full result is returned, or the call fails with the first bad pattern.
pub fn find_snippets(text: &str, patterns: &[InterestPattern]) -> Result<Vec<Snippet>, PatternError> {
    Ok(PhraseTable::compile(patterns)?.find_snippets(text))
}

fn build(expr: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(expr)
        .case_insensitive(true)
        .multi_line(true)
        .build()
}

fn context_expr(pattern: &str) -> String {
    format!("(?:.){{0,{n}}}(?:{pattern})(?:.){{0,{n}}}", n = CONTEXT_CHARS)
}
