//! Placeholder tokens for rendered fragments.
//!
//! Rendered math and code must pass through the Markdown transform untouched:
//! typeset HTML contains `$`, backticks, and regex metacharacters that the
//! text rules would happily re-interpret. Each fragment is parked behind a
//! token bracketed by private-use-area characters (which no transform rule
//! matches) and substituted back with a literal, non-pattern replace once the
//! transform is done. The table lives for a single render pass.

/// Opens every placeholder token.
pub const TOKEN_OPEN: char = '\u{E000}';
/// Closes every placeholder token.
pub const TOKEN_CLOSE: char = '\u{E001}';

/// Ordered `(token, fragment)` pairs for one render pass.
#[derive(Debug, Default)]
pub struct PlaceholderTable {
    tag: &'static str,
    entries: Vec<(String, String)>,
}

impl PlaceholderTable {
    /// Creates an empty table; `tag` distinguishes token families.
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            entries: Vec::new(),
        }
    }

    /// Parks a fragment and returns its token.
    pub fn insert(&mut self, fragment: String) -> String {
        let token = format!("{TOKEN_OPEN}{}{}{TOKEN_CLOSE}", self.tag, self.entries.len());
        self.entries.push((token.clone(), fragment));
        token
    }

    /// Substitutes every token back with its fragment (exact string match).
    pub fn restore(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (token, fragment) in &self.entries {
            out = out.replace(token, fragment);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// True when `line` consists of nothing but a single placeholder token.
pub fn is_token(line: &str) -> bool {
    let t = line.trim();
    let mut chars = t.chars();
    chars.next() == Some(TOKEN_OPEN)
        && t.ends_with(TOKEN_CLOSE)
        && !chars.as_str().trim_end_matches(TOKEN_CLOSE).contains([TOKEN_OPEN, TOKEN_CLOSE])
}

/// True when `text` still contains any placeholder token marker.
pub fn contains_token(text: &str) -> bool {
    text.contains([TOKEN_OPEN, TOKEN_CLOSE])
}
