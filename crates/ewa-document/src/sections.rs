//! Section splitter.
//!
//! A report is a flat run of `##` chapters. Lines before the first heading
//! form an implicit "Overview" section. Structural noise (rules, page breaks,
//! and with the header pre-pass the `#` title plus consumed header lines) is
//! dropped before it can reach a section body.
use crate::header::HeaderScan;
use crate::lines::{LineClassifier, LineKind};

pub const DEFAULT_SECTION_TITLE: &str = "Overview";

/// A section before block splitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSection<'a> {
    pub title: String,
    pub lines: Vec<&'a str>,
}

impl RawSection<'_> {
    pub fn body(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|line| line.trim().is_empty())
    }
}

/// Split `lines` into sections.
///
/// `header` is the result of the header pre-pass; pass `None` to keep `#`
/// headings and header lines as ordinary content.
pub fn split_sections<'a>(
    lines: &[&'a str],
    classifier: &LineClassifier,
    header: Option<&HeaderScan>,
) -> Vec<RawSection<'a>> {
    let mut sections: Vec<RawSection<'a>> = Vec::new();
    let mut current = RawSection {
        title: DEFAULT_SECTION_TITLE.to_string(),
        lines: Vec::new(),
    };

    for (i, line) in lines.iter().enumerate() {
        if header.is_some_and(|scan| scan.is_consumed(i)) {
            continue;
        }
        match classifier.classify(line) {
            LineKind::Rule | LineKind::PageBreak => continue,
            LineKind::DocumentTitle(_) if header.is_some() => continue,
            LineKind::SectionHeading(title) => {
                let next = RawSection {
                    title: title.to_string(),
                    lines: Vec::new(),
                };
                flush(&mut sections, std::mem::replace(&mut current, next));
            }
            _ => current.lines.push(*line),
        }
    }
    flush(&mut sections, current);

    sections
}

fn flush<'a>(sections: &mut Vec<RawSection<'a>>, section: RawSection<'a>) {
    if !section.is_blank() {
        sections.push(section);
    }
}
