//! Text rendering: escaping, `**bold**` spans, headings, bullet lists and
//! paragraphs.
//!
//! Every line is HTML-escaped before any markdown is interpreted, so report
//! content can never inject markup. The only tag this module emits inside
//! node text is `<strong>`.
use regex::Regex;

use crate::model::DisplayNode;

/// Escape `&`, `<`, `>`, `"` and `'`. Not idempotent: `&amp;` becomes `&amp;amp;`.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct InlineRenderer {
    bold_re: Regex,
    heading_re: Regex,
}

impl InlineRenderer {
    pub fn new() -> Self {
        Self {
            bold_re: Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"),
            // Depths beyond 3 are accepted and clamped.
            heading_re: Regex::new(r"^(#{1,6})\s+(.*)$").expect("valid regex"),
        }
    }

    /// Replace `**x**` spans with `<strong>x</strong>`. Expects escaped input.
    pub fn render_bold(&self, escaped: &str) -> String {
        self.bold_re
            .replace_all(escaped, "<strong>$1</strong>")
            .into_owned()
    }

    /// Convert the lines of a text block into display nodes.
    pub fn text_block_to_display<S: AsRef<str>>(&self, lines: &[S]) -> Vec<DisplayNode> {
        let mut nodes: Vec<DisplayNode> = Vec::new();
        let mut list: Option<Vec<String>> = None;

        for line in lines {
            let escaped = escape_html(line.as_ref());
            let trimmed = escaped.trim();

            if trimmed.is_empty() {
                close_list(&mut nodes, &mut list);
                continue;
            }

            if let Some(caps) = self.heading_re.captures(trimmed) {
                close_list(&mut nodes, &mut list);
                let level = caps[1].len().min(3) as u8;
                nodes.push(DisplayNode::Heading {
                    level,
                    html: self.render_bold(caps[2].trim()),
                });
                continue;
            }

            if let Some(item) = list_item(trimmed) {
                list.get_or_insert_with(Vec::new)
                    .push(self.render_bold(item.trim()));
                continue;
            }

            close_list(&mut nodes, &mut list);
            nodes.push(DisplayNode::Paragraph {
                html: self.render_bold(trimmed),
            });
        }
        close_list(&mut nodes, &mut list);

        nodes
    }
}

impl Default for InlineRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn list_item(line: &str) -> Option<&str> {
    line.strip_prefix("- ").or_else(|| line.strip_prefix("* "))
}

fn close_list(nodes: &mut Vec<DisplayNode>, list: &mut Option<Vec<String>>) {
    if let Some(items) = list.take() {
        nodes.push(DisplayNode::List { items });
    }
}

/// Render display nodes as an HTML fragment, one element per line.
pub fn render_html(nodes: &[DisplayNode]) -> String {
    let mut out: Vec<String> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            DisplayNode::Heading { level, html } => {
                out.push(format!("<h{level}>{html}</h{level}>"));
            }
            DisplayNode::Paragraph { html } => out.push(format!("<p>{html}</p>")),
            DisplayNode::List { items } => {
                let items: String = items.iter().map(|i| format!("<li>{i}</li>")).collect();
                out.push(format!("<ul>{items}</ul>"));
            }
        }
    }
    out.join("\n")
}
