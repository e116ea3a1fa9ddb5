//! Post identifier extraction from raw profile page text.
//!
//! Profile pages arrive in several shapes: the origin's embedded JSON, the
//! same JSON with quotes escaped as `\u0022`, server-rendered anchors, or a
//! mirror's reformatted markdown. Each shape gets a pattern; patterns run in
//! order of decreasing specificity and the first hit wins.

use regex::Regex;

use crate::types::Shortcode;

/// A named regex whose first capture group is the candidate shortcode.
#[derive(Debug, Clone)]
pub struct IdentifierPattern {
    name: String,
    regex: Regex,
}

impl IdentifierPattern {
    pub fn new(name: &str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.to_string(),
            regex: Regex::new(pattern)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// First capture in `text` that is a valid shortcode.
    pub fn find(&self, text: &str) -> Option<Shortcode> {
        self.regex
            .captures_iter(text)
            .filter_map(|cap| cap.get(1))
            .find_map(|m| Shortcode::parse(m.as_str()))
    }
}

/// Which pattern produced the identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractMatch {
    pub shortcode: Shortcode,
    pub pattern: String,
}

pub struct IdentifierExtractor {
    patterns: Vec<IdentifierPattern>,
}

impl IdentifierExtractor {
    /// The built-in cascade:
    /// 1. `"shortcode":"<token>"`
    /// 2. the same field with `\u0022` quotes
    /// 3. `href=".../p/<token>/"`
    /// 4. JSON-escaped path `\/p\/<token>\/`
    /// 5. any bare `instagram.com/p/<token>`
    pub fn new() -> Self {
        let builtin = [
            ("structured-field", r#""shortcode"\s*:\s*"([A-Za-z0-9_-]{5,})""#),
            (
                "escaped-unicode-field",
                r"\\u0022shortcode\\u0022:\\u0022([A-Za-z0-9_-]{5,})\\u0022",
            ),
            (
                "anchor-href",
                r#"href\s*=\s*["'](?:https?://(?:www\.)?instagram\.com)?/p/([A-Za-z0-9_-]{5,})/"#,
            ),
            ("escaped-json-path", r"\\/p\\/([A-Za-z0-9_-]{5,})\\/"),
            ("bare-domain", r"instagram\.com/p/([A-Za-z0-9_-]{5,})"),
        ];

        let patterns = builtin
            .iter()
            .map(|(name, pattern)| IdentifierPattern::new(name, pattern).expect("valid regex"))
            .collect();

        Self { patterns }
    }

    pub fn with_patterns(patterns: Vec<IdentifierPattern>) -> Self {
        Self { patterns }
    }

    /// Appends a lower-priority pattern after the existing ones.
    pub fn push_pattern(mut self, pattern: IdentifierPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    pub fn patterns(&self) -> &[IdentifierPattern] {
        &self.patterns
    }

    pub fn extract_identifier(&self, text: &str) -> Option<Shortcode> {
        self.extract_match(text).map(|m| m.shortcode)
    }

    pub fn extract_match(&self, text: &str) -> Option<ExtractMatch> {
        self.patterns.iter().find_map(|pattern| {
            pattern.find(text).map(|shortcode| ExtractMatch {
                shortcode,
                pattern: pattern.name().to_string(),
            })
        })
    }
}

impl Default for IdentifierExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-line excerpt of page content for diagnosing pattern drift.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}
