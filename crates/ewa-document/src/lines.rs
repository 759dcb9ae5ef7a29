//! Line classifier for the report dialect.
//!
//! The backend emits a narrow markdown subset, so a single regex per
//! line-level construct is enough. Everything the section splitter does not
//! need to distinguish is `Content`.
use regex::Regex;

/// Marker the PDF export inserts before every chapter.
pub const PAGE_BREAK_MARKER: &str = "<div style='page-break-before: always;'>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Empty or whitespace-only.
    Blank,
    /// A `---` horizontal rule.
    Rule,
    /// A page-break `<div>` marker.
    PageBreak,
    /// `# Title`, with the heading text.
    DocumentTitle(&'a str),
    /// `## Section`, with the heading text.
    SectionHeading(&'a str),
    Content,
}

#[derive(Debug, Clone)]
pub struct LineClassifier {
    title_re: Regex,
    section_re: Regex,
}

impl LineClassifier {
    pub fn new() -> Self {
        Self {
            title_re: Regex::new(r"^#\s+(.*)$").expect("valid regex"),
            section_re: Regex::new(r"^##\s+(.*)$").expect("valid regex"),
        }
    }

    pub fn classify<'a>(&self, line: &'a str) -> LineKind<'a> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return LineKind::Blank;
        }
        if trimmed == "---" {
            return LineKind::Rule;
        }
        if line.trim_start().starts_with(PAGE_BREAK_MARKER) {
            return LineKind::PageBreak;
        }
        if let Some(caps) = self.section_re.captures(line) {
            let text = caps.get(1).map_or("", |m| m.as_str());
            return LineKind::SectionHeading(text.trim());
        }
        if let Some(caps) = self.title_re.captures(line) {
            let text = caps.get(1).map_or("", |m| m.as_str());
            return LineKind::DocumentTitle(text.trim());
        }
        LineKind::Content
    }
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new()
    }
}
