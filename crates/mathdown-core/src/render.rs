//! The render pipeline.
//!
//! [`Renderer::render`] is a pure function from a buffer snapshot (plus the
//! final/non-final flag) to HTML. All side effects (timers, channels, the
//! UI sink) live in the streaming layer; this keeps the delimiter handling
//! testable with plain strings.
//!
//! Pass shape: scan spans, render the eligible ones behind placeholder
//! tokens (math via the engine, code via escaping), Markdown-transform the
//! remaining text, then substitute the fragments back with code first and
//! math last, so formula source never meets the Markdown rules and
//! Markdown-generated tags never meet the engine.

use std::sync::Arc;

use crate::latex;
use crate::markdown;
use crate::math::{self, MathEngine};
use crate::placeholder::PlaceholderTable;
use crate::scan::{self, Span, SpanKind};

/// How one span is treated on this pass.
enum Treatment {
    /// Leave the raw delimited text in place.
    Literal,
    /// Typeset through the math engine.
    Math { display: bool },
    /// Escape and wrap as code.
    Code,
}

/// Streaming-safe Markdown+LaTeX renderer.
#[derive(Clone)]
pub struct Renderer {
    engine: Arc<dyn MathEngine>,
}

impl Renderer {
    pub fn new(engine: Arc<dyn MathEngine>) -> Self {
        Self { engine }
    }

    /// Renders one snapshot of a streaming buffer.
    ///
    /// Non-final passes defer anything that might still be growing: unclosed
    /// spans and closed formulas that fail the completeness check stay as
    /// literal text. The final pass renders every span best-effort; only a
    /// genuine engine failure falls back to the escaped error fragment.
    pub fn render(&self, buffer: &str, is_final: bool) -> String {
        let spans = scan::scan(buffer);
        let mut code = PlaceholderTable::new("c");
        let mut math_frags = PlaceholderTable::new("m");
        let mut working = String::with_capacity(buffer.len());
        let mut cursor = 0;

        for span in &spans {
            working.push_str(&buffer[cursor..span.start]);
            cursor = span.end;
            let raw = &buffer[span.start..span.end];
            match treatment(span, is_final) {
                Treatment::Literal => working.push_str(raw),
                Treatment::Code => working.push_str(&code.insert(code_fragment(span))),
                Treatment::Math { display } => {
                    working.push_str(&math_frags.insert(self.math_fragment(span, raw, display)));
                }
            }
        }
        working.push_str(&buffer[cursor..]);

        let html = markdown::to_html(&working);
        let html = code.restore(&html);
        let html = math_frags.restore(&html);

        tracing::debug!(
            bytes = buffer.len(),
            spans = spans.len(),
            rendered_math = math_frags.len(),
            rendered_code = code.len(),
            is_final,
            "render pass"
        );
        html
    }

    fn math_fragment(&self, span: &Span, raw: &str, display: bool) -> String {
        match self.engine.render(span.content.trim(), display) {
            Ok(html) => html,
            Err(err) => {
                tracing::warn!(%err, source = span.content.trim(), "falling back to raw formula");
                math::error_fragment(raw, &err)
            }
        }
    }
}

fn treatment(span: &Span, is_final: bool) -> Treatment {
    match span.kind {
        SpanKind::CodeBlock | SpanKind::InlineCode => {
            if span.closed || is_final {
                Treatment::Code
            } else {
                Treatment::Literal
            }
        }
        SpanKind::BlockMath => math_treatment(span, is_final, true),
        SpanKind::InlineMath => math_treatment(span, is_final, false),
    }
}

fn math_treatment(span: &Span, is_final: bool, display: bool) -> Treatment {
    if span.closed {
        // The completeness check only gates non-final passes.
        if is_final || latex::is_complete(span.content.trim()) {
            Treatment::Math { display }
        } else {
            Treatment::Literal
        }
    } else if is_final {
        // Force-render the truncated formula, unless the guards that made
        // closed spans literal apply to what did arrive.
        let content = span.content.trim();
        if content.is_empty() || scan::numeric_only(content) {
            Treatment::Literal
        } else {
            Treatment::Math { display }
        }
    } else {
        Treatment::Literal
    }
}

fn code_fragment(span: &Span) -> String {
    let escaped = html_escape::encode_text(&span.content);
    match span.kind {
        SpanKind::CodeBlock => match &span.lang {
            Some(lang) => format!("<pre><code class=\"language-{lang}\">{escaped}</code></pre>"),
            None => format!("<pre><code>{escaped}</code></pre>"),
        },
        _ => format!("<code>{escaped}</code>"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::math::MathError;
    use crate::placeholder;

    /// Deterministic engine for pipeline tests.
    struct EchoEngine;

    impl MathEngine for EchoEngine {
        fn render(&self, source: &str, display_mode: bool) -> Result<String, MathError> {
            let class = if display_mode { "math-block" } else { "math-inline" };
            Ok(format!("<span class=\"{class}\">{source}</span>"))
        }
    }

    /// Engine that rejects everything.
    struct FailingEngine;

    impl MathEngine for FailingEngine {
        fn render(&self, _source: &str, _display_mode: bool) -> Result<String, MathError> {
            Err(MathError::Engine("undefined control sequence".to_string()))
        }
    }

    fn renderer() -> Renderer {
        Renderer::new(Arc::new(EchoEngine))
    }

    #[test]
    fn test_truncated_formula_stays_literal_until_final() {
        let r = renderer();
        let partial = r.render("The force is $F=", false);
        assert!(partial.contains("$F="), "got: {partial}");
        assert!(!partial.contains("math-inline"));

        let full = r.render("The force is $F=ma$ newtons.", true);
        assert!(full.contains("<span class=\"math-inline\">F=ma</span>"), "got: {full}");
        assert!(!full.contains('$'));
    }

    #[test]
    fn test_closed_but_incomplete_formula_waits_one_pass() {
        let r = renderer();
        // Closed delimiters, but the brace count says the source is cut off.
        let partial = r.render("so $\\frac{1}{$ ...", false);
        assert!(partial.contains("$\\frac{1}{$"), "got: {partial}");
        assert!(!partial.contains("math-inline"));
    }

    #[test]
    fn test_final_pass_bypasses_completeness_check() {
        let r = renderer();
        let html = r.render("so $\\frac{1}{$", true);
        assert!(html.contains("math-inline"), "got: {html}");
    }

    #[test]
    fn test_final_pass_leaves_no_placeholder_tokens() {
        let r = renderer();
        let input = "# T\n$$a$$\n`x` and $y$\n```rust\nlet z = 1;\n```\ndone";
        let html = r.render(input, true);
        assert!(!placeholder::contains_token(&html), "unresolved tokens in: {html}");
    }

    #[test]
    fn test_math_inside_inline_code_is_escaped_literal() {
        let r = renderer();
        let html = r.render("type `$x$` to try", true);
        assert!(html.contains("<code>$x$</code>"), "got: {html}");
        assert!(!html.contains("math-inline"));
    }

    #[test]
    fn test_engine_failure_degrades_to_visible_fallback() {
        let r = Renderer::new(Arc::new(FailingEngine));
        let html = r.render("before $\\invalidcmd$ after", true);
        assert!(html.contains("math-error"), "got: {html}");
        assert!(html.contains("\\invalidcmd"));
        assert!(html.contains("before"));
        assert!(html.contains("after"));
    }

    #[test]
    fn test_block_math_renders_in_display_mode() {
        let r = renderer();
        let html = r.render("$$E=mc^2$$", true);
        assert!(html.contains("<span class=\"math-block\">E=mc^2</span>"), "got: {html}");
    }

    #[test]
    fn test_code_block_is_escaped_and_tagged() {
        let r = renderer();
        let html = r.render("```html\n<b>raw</b>\n```", true);
        assert!(html.contains("<pre><code class=\"language-html\">"), "got: {html}");
        assert!(html.contains("&lt;b&gt;raw&lt;/b&gt;"));
        assert!(!html.contains("<b>raw</b>"));
    }

    #[test]
    fn test_unclosed_code_block_literal_then_rendered() {
        let r = renderer();
        let partial = r.render("```rust\nlet x = 1;", false);
        assert!(partial.contains("```rust"), "got: {partial}");
        assert!(!partial.contains("<pre>"));

        let fin = r.render("```rust\nlet x = 1;", true);
        assert!(fin.contains("<pre><code class=\"language-rust\">let x = 1;</code></pre>"));
    }

    #[test]
    fn test_currency_stays_literal_even_on_final() {
        let r = renderer();
        let html = r.render("that costs $100", true);
        assert!(html.contains("$100"));
        assert!(!html.contains("math-inline"));
    }

    #[test]
    fn test_markdown_around_math_still_applies() {
        let r = renderer();
        let html = r.render("**mass** times $a$", true);
        assert!(html.contains("<strong>mass</strong>"));
        assert!(html.contains("<span class=\"math-inline\">a</span>"));
    }

    #[test]
    fn test_math_fragment_is_opaque_to_emphasis() {
        let r = renderer();
        // `*` inside the formula must not pair with `*` outside it.
        let html = r.render("*a* and $x * y * z$", true);
        assert!(html.contains("<em>a</em>"));
        assert!(html.contains("<span class=\"math-inline\">x * y * z</span>"), "got: {html}");
    }

    #[test]
    fn test_empty_buffer_renders_empty() {
        let r = renderer();
        assert_eq!(r.render("", true), "");
        assert_eq!(r.render("", false), "");
    }

    #[test]
    fn test_non_final_render_of_growing_buffer_is_monotonic_safe() {
        let r = renderer();
        // Every prefix renders without panicking and keeps the visible text.
        let full = "Newton: $$F = ma$$ and `code` end";
        for i in 0..=full.len() {
            if full.is_char_boundary(i) {
                let _ = r.render(&full[..i], false);
            }
        }
    }
}
