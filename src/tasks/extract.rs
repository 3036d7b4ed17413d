// src/tasks/extract.rs
//! Minimal HTML helpers: balanced element lookup and visible-text extraction.
//! MediaWiki markup is regular enough that a tag scanner is all we need.

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::error::ParseError;

fn re_script_style() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script\b.*?</script>|<style\b.*?</style>|<!--.*?-->")
            .expect("script/style regex")
    })
}

fn re_tags() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?s)</?[a-zA-Z][^>]*>").expect("tag regex"))
}

fn re_blanks() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"[ \t\u{00A0}]+").expect("blank regex"))
}

/// Inner HTML of the element whose opening tag starts at `open_start`, plus the
/// byte offset just past its closing tag. Unclosed elements run to the end.
pub(crate) fn balanced_inner<'a>(html: &'a str, open_start: usize, tag: &str) -> Option<(&'a str, usize)> {
    let open_end = open_start + html[open_start..].find('>')? + 1;
    let open_pat = format!("<{tag}");
    let close_pat = format!("</{tag}>");

    let mut depth = 1usize;
    let mut pos = open_end;
    loop {
        let Some(close) = html[pos..].find(&close_pat).map(|i| pos + i) else {
            return Some((&html[open_end..], html.len()));
        };
        match html[pos..].find(&open_pat).map(|i| pos + i) {
            Some(open) if open < close => {
                depth += 1;
                pos = open + open_pat.len();
            }
            _ => {
                depth -= 1;
                pos = close + close_pat.len();
                if depth == 0 {
                    return Some((&html[open_end..close], pos));
                }
            }
        }
    }
}

/// Start offset (at or after `from`) of the opening tag that carries `marker`
/// (e.g. `id="bodyContent"`). Occurrences of `marker` in plain text are skipped.
fn opening_tag_with(html: &str, marker: &str, mut from: usize) -> Option<usize> {
    loop {
        let at = from + html[from..].find(marker)?;
        let tag_start = html[from..at].rfind('<').map(|i| from + i);
        match tag_start {
            Some(start) if !html[start..at].contains('>') => return Some(start),
            _ => from = at + marker.len(),
        }
    }
}

/// Inner HTML of every `tag` element whose opening tag contains `marker`.
pub(crate) fn elements_with<'a>(html: &'a str, tag: &str, marker: &str) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut from = 0;
    while let Some(start) = opening_tag_with(html, marker, from) {
        match balanced_inner(html, start, tag) {
            Some((inner, end)) => {
                out.push(inner);
                from = end;
            }
            None => break,
        }
    }
    out
}

/// Remove every `tag` element carrying `marker`, content included.
pub(crate) fn remove_elements(html: &str, tag: &str, marker: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut from = 0;
    while let Some(start) = opening_tag_with(html, marker, from) {
        let Some((_, end)) = balanced_inner(html, start, tag) else {
            break;
        };
        out.push_str(&html[from..start]);
        from = end;
    }
    out.push_str(&html[from..]);
    out
}

/// Tag-stripped, entity-decoded text. Source line breaks are kept; runs of
/// blanks collapse to one space and empty lines are dropped.
pub fn visible_text(fragment: &str) -> String {
    let no_code = re_script_style().replace_all(fragment, "");
    let no_tags = re_tags().replace_all(&no_code, "");
    let decoded = html_escape::decode_html_entities(&no_tags);

    decoded
        .lines()
        .map(|l| re_blanks().replace_all(l, " ").trim().to_string())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Visible text of the page's `bodyContent` element.
pub fn body_content_text(html: &str) -> Result<String, ParseError> {
    if html.trim().is_empty() {
        return Err(ParseError::EmptyBody);
    }
    let start =
        opening_tag_with(html, r#"id="bodyContent""#, 0).ok_or(ParseError::MissingElement("bodyContent"))?;
    let (inner, _) = balanced_inner(html, start, "div").ok_or(ParseError::MissingElement("bodyContent"))?;
    Ok(visible_text(inner))
}
