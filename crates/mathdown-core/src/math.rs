//! Math typesetting seam.
//!
//! The pipeline talks to a [`MathEngine`] rather than to KaTeX directly, so
//! tests and alternative backends can slot in. [`KatexEngine`] is the real
//! implementation; its options (including the macro table) are built once and
//! injected identically on every call.

use std::collections::HashMap;

use thiserror::Error;

/// Errors surfaced by a typesetting backend.
#[derive(Debug, Error)]
pub enum MathError {
    /// The backend rejected the formula source.
    #[error("math engine failed: {0}")]
    Engine(String),
    /// The backend options could not be constructed.
    #[error("math engine options rejected: {0}")]
    Options(String),
}

/// A synchronous formula-to-HTML typesetting backend.
pub trait MathEngine: Send + Sync {
    /// Renders one formula. `display_mode` selects block layout over inline.
    fn render(&self, source: &str, display_mode: bool) -> Result<String, MathError>;
}

/// KaTeX-backed [`MathEngine`].
pub struct KatexEngine {
    inline: katex::Opts,
    display: katex::Opts,
}

impl KatexEngine {
    /// Builds an engine with the given macro table.
    pub fn new(macros: HashMap<String, String>) -> Result<Self, MathError> {
        let build = |display_mode: bool| {
            let mut builder = katex::Opts::builder();
            builder.display_mode(display_mode);
            builder.throw_on_error(true);
            builder.macros(macros.clone());
            builder
                .build()
                .map_err(|e| MathError::Options(e.to_string()))
        };
        Ok(Self {
            inline: build(false)?,
            display: build(true)?,
        })
    }

    /// Builds an engine with the stock macro table.
    pub fn with_default_macros() -> Result<Self, MathError> {
        Self::new(default_macros())
    }
}

impl MathEngine for KatexEngine {
    fn render(&self, source: &str, display_mode: bool) -> Result<String, MathError> {
        let opts = if display_mode {
            &self.display
        } else {
            &self.inline
        };
        katex::render_with_opts(source, opts).map_err(|e| MathError::Engine(e.to_string()))
    }
}

/// Macro table applied when no configuration overrides it.
///
/// Physics notation defaults: arrow vectors and upright units.
pub fn default_macros() -> HashMap<String, String> {
    HashMap::from([
        ("\\vec".to_string(), "\\overrightarrow{#1}".to_string()),
        ("\\unit".to_string(), "\\,\\mathrm{#1}".to_string()),
    ])
}

/// Escaped, visibly flagged stand-in for a formula the engine rejected.
///
/// `original` is the delimited source as it appeared in the buffer; keeping
/// it visible means malformed input never silently disappears.
pub fn error_fragment(original: &str, err: &MathError) -> String {
    format!(
        "<span class=\"math-error\" title=\"{}\">{}</span>",
        html_escape::encode_double_quoted_attribute(&err.to_string()),
        html_escape::encode_text(original),
    )
}
