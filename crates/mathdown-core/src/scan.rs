//! Delimiter scanning for math and code spans.
//!
//! A single forward pass over the buffer identifies every delimiter-bounded
//! region (block math `$$...$$`, inline math `$...$`, fenced code, inline
//! code) and records whether its closing delimiter has arrived yet. Scanning is first-open-wins: a `$`
//! inside an open code span is plain content, and a backtick inside an open
//! formula is plain content. At a given position ```` ``` ```` is tried
//! before `` ` `` and `$$` before `$`, since the longer delimiter is a
//! superset prefix of the shorter one.

/// What a span contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    BlockMath,
    InlineMath,
    CodeBlock,
    InlineCode,
}

/// A delimiter-bounded region of one buffer snapshot.
///
/// Offsets are byte positions into the snapshot the span was scanned from;
/// `start..end` covers the region including its delimiters. Spans never
/// overlap and are ordered by `start`. Spans are recomputed on every render
/// pass and never persist across snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub kind: SpanKind,
    /// Byte offset of the opening delimiter.
    pub start: usize,
    /// Byte offset one past the closing delimiter (buffer end if unclosed).
    pub end: usize,
    /// Raw content between the delimiters.
    pub content: String,
    /// Language tag of a fenced code block, when present.
    pub lang: Option<String>,
    /// False while the closing delimiter has not arrived.
    pub closed: bool,
}

/// Scans a buffer snapshot into ordered, non-overlapping spans.
pub fn scan(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        i = if rest.starts_with("```") {
            scan_code_block(text, i, &mut spans)
        } else if rest.starts_with('`') {
            scan_inline_code(text, i, &mut spans)
        } else if rest.starts_with("$$") {
            scan_block_math(text, i, &mut spans)
        } else if rest.starts_with('$') {
            scan_inline_math(text, i, &mut spans)
        } else {
            // Jump to the next delimiter candidate.
            match rest.find(['`', '$']) {
                Some(off) => i + off,
                None => break,
            }
        };
    }
    spans
}

/// Currency heuristic: `$100$`, `$3.50$` and friends are prices, not math.
pub fn numeric_only(content: &str) -> bool {
    let trimmed = content.trim();
    !trimmed.is_empty()
        && trimmed.chars().any(|c| c.is_ascii_digit())
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',') || c.is_whitespace())
}

fn scan_code_block(text: &str, open: usize, spans: &mut Vec<Span>) -> usize {
    let lang_start = open + 3;
    let lang_end = lang_start
        + text[lang_start..]
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
    let lang = &text[lang_start..lang_end];
    let lang = (!lang.is_empty()).then(|| lang.to_string());
    let body_start = if text[lang_end..].starts_with('\n') {
        lang_end + 1
    } else {
        lang_end
    };

    match text[body_start..].find("```") {
        Some(off) => {
            let end = body_start + off + 3;
            spans.push(Span {
                kind: SpanKind::CodeBlock,
                start: open,
                end,
                content: text[body_start..body_start + off]
                    .trim_matches('\n')
                    .to_string(),
                lang,
                closed: true,
            });
            end
        }
        None => {
            spans.push(Span {
                kind: SpanKind::CodeBlock,
                start: open,
                end: text.len(),
                content: text[body_start..].trim_matches('\n').to_string(),
                lang,
                closed: false,
            });
            text.len()
        }
    }
}

fn scan_inline_code(text: &str, open: usize, spans: &mut Vec<Span>) -> usize {
    let body_start = open + 1;
    match text[body_start..].find('`') {
        // Empty span: both backticks stay literal.
        Some(0) => body_start + 1,
        Some(off) => {
            let end = body_start + off + 1;
            spans.push(Span {
                kind: SpanKind::InlineCode,
                start: open,
                end,
                content: text[body_start..body_start + off].to_string(),
                lang: None,
                closed: true,
            });
            end
        }
        None => {
            spans.push(Span {
                kind: SpanKind::InlineCode,
                start: open,
                end: text.len(),
                content: text[body_start..].to_string(),
                lang: None,
                closed: false,
            });
            text.len()
        }
    }
}

fn scan_block_math(text: &str, open: usize, spans: &mut Vec<Span>) -> usize {
    let body_start = open + 2;
    match text[body_start..].find("$$") {
        Some(off) => {
            let end = body_start + off + 2;
            let content = &text[body_start..body_start + off];
            // An empty formula is not a span; the delimiters stay literal.
            if content.trim().is_empty() {
                return end;
            }
            spans.push(Span {
                kind: SpanKind::BlockMath,
                start: open,
                end,
                content: content.to_string(),
                lang: None,
                closed: true,
            });
            end
        }
        None => {
            spans.push(Span {
                kind: SpanKind::BlockMath,
                start: open,
                end: text.len(),
                content: text[body_start..].to_string(),
                lang: None,
                closed: false,
            });
            text.len()
        }
    }
}

fn scan_inline_math(text: &str, open: usize, spans: &mut Vec<Span>) -> usize {
    let body_start = open + 1;
    let rest = &text[body_start..];
    let close = rest.find('$');
    let newline = rest.find('\n');
    match (close, newline) {
        (Some(c), n) if n.is_none_or(|n| c < n) => {
            let end = body_start + c + 1;
            let content = &rest[..c];
            // Empty or price-like content is not math; both `$` stay literal.
            if content.trim().is_empty() || numeric_only(content) {
                return end;
            }
            spans.push(Span {
                kind: SpanKind::InlineMath,
                start: open,
                end,
                content: content.to_string(),
                lang: None,
                closed: true,
            });
            end
        }
        // A newline before any closing `$`: this was never inline math.
        (_, Some(_)) => open + 1,
        (_, None) => {
            spans.push(Span {
                kind: SpanKind::InlineMath,
                start: open,
                end: text.len(),
                content: rest.to_string(),
                lang: None,
                closed: false,
            });
            text.len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(spans: &[Span]) -> Vec<SpanKind> {
        spans.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_plain_text_has_no_spans() {
        assert!(scan("no delimiters here").is_empty());
    }

    #[test]
    fn test_inline_math_closed() {
        let spans = scan("force is $F=ma$ newtons");
        assert_eq!(kinds(&spans), vec![SpanKind::InlineMath]);
        assert_eq!(spans[0].content, "F=ma");
        assert!(spans[0].closed);
        assert_eq!(&"force is $F=ma$ newtons"[spans[0].start..spans[0].end], "$F=ma$");
    }

    #[test]
    fn test_inline_math_unclosed_at_buffer_end() {
        let spans = scan("force is $F=");
        assert_eq!(kinds(&spans), vec![SpanKind::InlineMath]);
        assert_eq!(spans[0].content, "F=");
        assert!(!spans[0].closed);
    }

    #[test]
    fn test_inline_math_abandoned_by_newline() {
        // `$` cannot open inline math when a newline arrives before the closer.
        let spans = scan("a $b\nc $d$ e");
        assert_eq!(kinds(&spans), vec![SpanKind::InlineMath]);
        assert_eq!(spans[0].content, "d");
    }

    #[test]
    fn test_currency_is_not_math() {
        assert!(scan("it costs $100$ total").is_empty());
        assert!(scan("it costs $3.50$ total").is_empty());
    }

    #[test]
    fn test_empty_inline_math_is_literal() {
        assert!(scan("a $ $ b").is_empty());
    }

    #[test]
    fn test_block_math_spans_lines() {
        let spans = scan("$$\nE = mc^2\n$$ tail");
        assert_eq!(kinds(&spans), vec![SpanKind::BlockMath]);
        assert_eq!(spans[0].content, "\nE = mc^2\n");
        assert!(spans[0].closed);
    }

    #[test]
    fn test_block_math_unclosed() {
        let spans = scan("so $$\\frac{1}{2}");
        assert_eq!(kinds(&spans), vec![SpanKind::BlockMath]);
        assert!(!spans[0].closed);
        assert_eq!(spans[0].content, "\\frac{1}{2}");
    }

    #[test]
    fn test_empty_block_math_is_literal() {
        assert!(scan("$$$$").is_empty());
        assert!(scan("$$ $$").is_empty());
    }

    #[test]
    fn test_block_math_checked_before_inline() {
        let spans = scan("$$x$$ and $y$");
        assert_eq!(kinds(&spans), vec![SpanKind::BlockMath, SpanKind::InlineMath]);
    }

    #[test]
    fn test_code_block_with_language() {
        let spans = scan("```rust\nfn main() {}\n```");
        assert_eq!(kinds(&spans), vec![SpanKind::CodeBlock]);
        assert_eq!(spans[0].lang.as_deref(), Some("rust"));
        assert_eq!(spans[0].content, "fn main() {}");
        assert!(spans[0].closed);
    }

    #[test]
    fn test_code_block_without_language() {
        let spans = scan("```\nplain\n```");
        assert_eq!(spans[0].lang, None);
        assert_eq!(spans[0].content, "plain");
    }

    #[test]
    fn test_code_block_unclosed() {
        let spans = scan("```python\nx = 1\n");
        assert_eq!(kinds(&spans), vec![SpanKind::CodeBlock]);
        assert!(!spans[0].closed);
        assert_eq!(spans[0].content, "x = 1");
    }

    #[test]
    fn test_inline_code_closed() {
        let spans = scan("use `cargo build` here");
        assert_eq!(kinds(&spans), vec![SpanKind::InlineCode]);
        assert_eq!(spans[0].content, "cargo build");
    }

    #[test]
    fn test_empty_inline_code_is_literal() {
        assert!(scan("a `` b").is_empty());
    }

    #[test]
    fn test_dollar_inside_inline_code_is_content() {
        // The backtick opens first, so the dollars are protected.
        let spans = scan("try `$x$` now");
        assert_eq!(kinds(&spans), vec![SpanKind::InlineCode]);
        assert_eq!(spans[0].content, "$x$");
    }

    #[test]
    fn test_backtick_inside_math_is_content() {
        let spans = scan("$a`b$");
        assert_eq!(kinds(&spans), vec![SpanKind::InlineMath]);
        assert_eq!(spans[0].content, "a`b");
    }

    #[test]
    fn test_math_inside_code_block_is_content() {
        let spans = scan("```\nlet price = $100;\n$$x$$\n```");
        assert_eq!(kinds(&spans), vec![SpanKind::CodeBlock]);
    }

    #[test]
    fn test_spans_do_not_overlap_and_are_ordered() {
        let text = "a $x$ b `y` c $$z$$ d";
        let spans = scan(text);
        assert_eq!(spans.len(), 3);
        for pair in spans.windows(2) {
            assert!(pair[0].end <= pair[1].start, "spans must not overlap");
        }
    }

    #[test]
    fn test_adjacent_inline_math() {
        let spans = scan("$a$$b$");
        // `$$` after a closed formula would be block math; here the first `$`
        // closes "a" and the remainder scans as inline "b".
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].content, "a");
        assert_eq!(spans[1].content, "b");
    }

    #[test]
    fn test_numeric_only_guard() {
        assert!(numeric_only("100"));
        assert!(numeric_only(" 3.50 "));
        assert!(numeric_only("1,000"));
        assert!(!numeric_only("100x"));
        assert!(!numeric_only("e"));
        assert!(!numeric_only("..."));
    }
}
