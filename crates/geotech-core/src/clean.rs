//! Cleaning of raw model output.
//!
//! Models asked for JSON frequently wrap it in a Markdown code block anyway.
//! [`clean`] removes those fences; [`extract_object_span`] is the fallback for
//! replies that surround the object with prose.

const FENCE: &str = "```";

/// Tags stripped even when the content follows with no whitespace.
const KNOWN_TAGS: &[&str] = &["json"];

/// Strip leading and trailing Markdown code fences from `text`.
///
/// The leading fence may carry a language tag (` ```json `). An unknown word
/// only counts as a tag when whitespace follows it. Stripping repeats
/// until the text no longer changes, so `clean(clean(x)) == clean(x)`. Text
/// without fences comes back trimmed and otherwise untouched.
pub fn clean(text: &str) -> String {
    let mut current = text.trim();
    loop {
        let next = strip_once(current);
        if next.len() == current.len() {
            return current.to_string();
        }
        current = next;
    }
}

fn strip_once(text: &str) -> &str {
    let mut out = text.trim();
    if let Some(rest) = out.strip_prefix(FENCE) {
        out = strip_language_tag(rest).trim();
    }
    if let Some(rest) = out.strip_suffix(FENCE) {
        out = rest.trim();
    }
    out
}

fn strip_language_tag(text: &str) -> &str {
    let tag_len = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+')))
        .unwrap_or(text.len());
    let (tag, after) = text.split_at(tag_len);
    if KNOWN_TAGS.iter().any(|known| tag.eq_ignore_ascii_case(known)) {
        return after;
    }
    if tag_len == 0
        || after.is_empty()
        || after.starts_with(char::is_whitespace)
        || after.starts_with(FENCE)
    {
        after
    } else {
        text
    }
}

/// Locate the outermost `{ ... }` span in `text`.
///
/// Returns `None` when there is no opening brace followed by a closing one.
pub fn extract_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
