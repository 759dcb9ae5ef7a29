//! Markdown-to-document transform.
//!
//! Pipeline: header pre-pass → section split → per section, card fence
//! detection, block split, then table parsing and text rendering. Every
//! malformed construct degrades to escaped text; the transform never fails.
use tracing::debug;

use crate::blocks::split_blocks;
use crate::cards::{find_card_fence, parse_card_payload};
use crate::header::HeaderExtractor;
use crate::heuristics::{HeuristicSet, TableContext};
use crate::inline::InlineRenderer;
use crate::lines::LineClassifier;
use crate::model::{Block, Document, RenderedBlock, Section};
use crate::sections::{split_sections, RawSection};
use crate::table::parse_table;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    /// Run the header pre-pass and drop `#` headings from section bodies.
    pub extract_header: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            extract_header: true,
        }
    }
}

/// Reusable transformer. Holds compiled patterns and the column heuristics;
/// safe to share between threads.
#[derive(Debug)]
pub struct DocumentTransformer {
    options: TransformOptions,
    heuristics: HeuristicSet,
    classifier: LineClassifier,
    header: HeaderExtractor,
    inline: InlineRenderer,
}

impl DocumentTransformer {
    pub fn new(options: TransformOptions, heuristics: HeuristicSet) -> Self {
        Self {
            options,
            heuristics,
            classifier: LineClassifier::new(),
            header: HeaderExtractor::new(),
            inline: InlineRenderer::new(),
        }
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    pub fn heuristics(&self) -> &HeuristicSet {
        &self.heuristics
    }

    pub fn transform(&self, markdown: &str) -> Document {
        let lines: Vec<&str> = markdown.lines().collect();

        let scan = self
            .options
            .extract_header
            .then(|| self.header.scan(&lines));
        let raw_sections = split_sections(&lines, &self.classifier, scan.as_ref());

        let sections: Vec<Section> = raw_sections
            .into_iter()
            .map(|raw| self.render_section(raw))
            .collect();

        debug!(
            lines = lines.len(),
            sections = sections.len(),
            "transformed report"
        );

        Document {
            header: scan.and_then(|s| s.info),
            sections,
        }
    }

    fn render_section(&self, raw: RawSection<'_>) -> Section {
        let raw_body = raw.body();
        let mut blocks: Vec<RenderedBlock> = Vec::new();

        match find_card_fence(&raw_body) {
            Ok(Some(fence)) => match parse_card_payload(fence.payload) {
                Ok(group) => {
                    self.render_text(&raw.title, fence.before, &mut blocks);
                    blocks.push(RenderedBlock::Cards(group));
                    self.render_text(&raw.title, fence.after, &mut blocks);
                }
                Err(e) => {
                    debug!(section = %raw.title, error = %e, "card block rendered as text");
                    self.render_lines(&raw.title, &raw.lines, &mut blocks);
                }
            },
            Ok(None) => self.render_lines(&raw.title, &raw.lines, &mut blocks),
            Err(e) => {
                debug!(section = %raw.title, error = %e, "card block rendered as text");
                self.render_lines(&raw.title, &raw.lines, &mut blocks);
            }
        }

        Section {
            title: raw.title,
            raw_body,
            blocks,
        }
    }

    fn render_text(&self, title: &str, text: &str, out: &mut Vec<RenderedBlock>) {
        let lines: Vec<&str> = text.lines().collect();
        self.render_lines(title, &lines, out);
    }

    fn render_lines(&self, title: &str, lines: &[&str], out: &mut Vec<RenderedBlock>) {
        for block in split_blocks(lines) {
            match block {
                Block::Text { lines } => out.push(self.text_block(lines)),
                Block::Table { lines } => match parse_table(&lines) {
                    Ok(table) => {
                        let ctx = TableContext {
                            section_title: title,
                        };
                        let cells = self.heuristics.annotate(&table, &ctx);
                        out.push(RenderedBlock::Table { table, cells });
                    }
                    Err(e) => {
                        debug!(section = %title, error = %e, "table rendered as text");
                        out.push(self.text_block(lines));
                    }
                },
            }
        }
    }

    fn text_block(&self, lines: Vec<String>) -> RenderedBlock {
        let nodes = self.inline.text_block_to_display(&lines);
        RenderedBlock::Text { lines, nodes }
    }
}

impl Default for DocumentTransformer {
    fn default() -> Self {
        Self::new(TransformOptions::default(), HeuristicSet::standard())
    }
}

/// Transform `markdown` with default options and the standard heuristics.
pub fn transform(markdown: &str) -> Document {
    DocumentTransformer::default().transform(markdown)
}
