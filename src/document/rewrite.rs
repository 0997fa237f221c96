//! Markdown link rewriting for fetched READMEs and release notes

use std::sync::LazyLock;

use regex::{Captures, Regex};

static BARE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https://\S+").expect("bare link pattern"));
static ANCHOR_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]\(#(.*?)\)").expect("anchor link pattern"));

/// An unclosed `(` earlier on the same line means the URL is already a link target.
/// Nested parentheses are not tracked.
fn inside_parentheses(text: &str, at: usize) -> bool {
    let line_start = text[..at].rfind('\n').map_or(0, |i| i + 1);
    let before = &text[line_start..at];
    match before.rfind('(') {
        Some(open) => !before[open..].contains(')'),
        None => false,
    }
}

/// Turn bare `https://` URLs into `[url](url)` links.
///
/// A URL counts as bare unless an unclosed `(` precedes it on its line, so
/// the visible text of `[https://a](https://a)` is wrapped as well, and the
/// match runs up to the next whitespace.
pub fn wrap_bare_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for m in BARE_LINK.find_iter(text) {
        if inside_parentheses(text, m.start()) {
            continue;
        }
        out.push_str(&text[last..m.start()]);
        out.push_str(&format!("[{0}]({0})", m.as_str()));
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Point `[text](#fragment)` links at `canonical_link#fragment`.
///
/// An empty `canonical_link` leaves the links relative.
pub fn rewrite_anchor_links(text: &str, canonical_link: &str) -> String {
    ANCHOR_LINK
        .replace_all(text, |caps: &Captures| {
            format!("[{}]({}#{})", &caps[1], canonical_link, &caps[2])
        })
        .into_owned()
}

/// Both rewrites, in the order the viewer expects
pub fn prepare_for_display(text: &str, canonical_link: &str) -> String {
    rewrite_anchor_links(&wrap_bare_links(text), canonical_link)
}
