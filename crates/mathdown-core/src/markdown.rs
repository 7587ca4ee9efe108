//! Markdown-to-HTML text transform.
//!
//! Operates on text whose math and code spans have already been replaced by
//! placeholder tokens, so every rule here is a plain textual substitution
//! with a fixed precedence:
//!
//! 1. bold (before italic, so `**` is never eaten as emphasis)
//! 2. italic
//! 3. headings (`#` is the largest rendered heading, mapped to `<h2>`)
//! 4. links (forced into a new tab, tab-nabbing disabled)
//! 5. list runs (one line pass for `<ul>` and `<ol>`)
//! 6. newline runs to explicit breaks
//!
//! Every rule is best-effort: malformed input degrades to imperfect output,
//! never to an error.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::placeholder;

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*\n]+)\*\*").expect("bold pattern"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\n]+)\*").expect("italic pattern"));
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,4})[ \t]+(.+)$").expect("heading pattern"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]\n]+)\]\(([^)\n]+)\)").expect("link pattern"));
static ORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s+(.+)$").expect("ordered item pattern"));

/// Transforms Markdown text (with opaque placeholder tokens) into HTML.
pub fn to_html(text: &str) -> String {
    let text = BOLD.replace_all(text, "<strong>${1}</strong>");
    let text = ITALIC.replace_all(&text, "<em>${1}</em>");
    let text = HEADING.replace_all(&text, |caps: &Captures| {
        // Inverted depth: one `#` maps to the largest rendered heading.
        let level = caps[1].len() + 1;
        format!("<h{level}>{}</h{level}>", &caps[2])
    });
    let text = LINK.replace_all(
        &text,
        "<a href=\"${2}\" target=\"_blank\" rel=\"noopener noreferrer\">${1}</a>",
    );
    let text = wrap_lists(&text);
    line_breaks(&text)
}

enum Run {
    None,
    Unordered(Vec<String>),
    Ordered(Vec<String>),
}

/// Converts contiguous runs of list-item lines into `<ul>`/`<ol>` blocks.
///
/// A line whose entire content is a placeholder token is never given list
/// semantics; it passes through unchanged and terminates the current run.
fn wrap_lists(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut run = Run::None;

    fn flush(run: &mut Run, out: &mut Vec<String>) {
        match std::mem::replace(run, Run::None) {
            Run::None => {}
            Run::Unordered(items) => out.push(format!("<ul>{}</ul>", items.concat())),
            Run::Ordered(items) => out.push(format!("<ol>{}</ol>", items.concat())),
        }
    }

    for line in text.split('\n') {
        if placeholder::is_token(line) {
            flush(&mut run, &mut out);
            out.push(line.to_string());
            continue;
        }

        let unordered = line
            .strip_prefix("- ")
            .or_else(|| line.strip_prefix("* "))
            .filter(|item| !placeholder::is_token(item));
        let ordered = ORDERED_ITEM
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .filter(|item| !placeholder::is_token(item));

        if let Some(item) = unordered {
            if let Run::Unordered(items) = &mut run {
                items.push(format!("<li>{item}</li>"));
            } else {
                flush(&mut run, &mut out);
                run = Run::Unordered(vec![format!("<li>{item}</li>")]);
            }
        } else if let Some(item) = ordered {
            if let Run::Ordered(items) = &mut run {
                items.push(format!("<li>{item}</li>"));
            } else {
                flush(&mut run, &mut out);
                run = Run::Ordered(vec![format!("<li>{item}</li>")]);
            }
        } else {
            flush(&mut run, &mut out);
            out.push(line.to_string());
        }
    }
    flush(&mut run, &mut out);
    out.join("\n")
}

/// Replaces newline runs with explicit breaks.
///
/// Two or more newlines become a paragraph gap; a single newline becomes one
/// break unless the next character already opens a tag (block elements carry
/// their own spacing).
fn line_breaks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\n' {
            out.push(c);
            continue;
        }
        let mut count = 1;
        while chars.peek() == Some(&'\n') {
            chars.next();
            count += 1;
        }
        if count >= 2 {
            out.push_str("<br><br>");
        } else if chars.peek() == Some(&'<') {
            out.push('\n');
        } else {
            out.push_str("<br>");
        }
    }
    out
}
