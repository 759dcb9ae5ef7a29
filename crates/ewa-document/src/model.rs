use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::severity::SeverityTier;

/// A transformed EWA analysis report.
///
/// Built fresh for every load and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Report metadata from the header pre-pass, if any header line was found.
    pub header: Option<HeaderInfo>,
    /// Sections in source order. Sections with a blank body are never present.
    pub sections: Vec<Section>,
}

/// Metadata lifted out of the report preamble.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HeaderInfo {
    /// e.g. "EWA Analysis for PRD"
    pub title: Option<String>,
    /// Free text after `Analysis Period:`
    pub period: Option<String>,
    /// Risk label with surrounding quotes removed, e.g. "High"
    pub risk: Option<String>,
    /// Tier derived from `risk`; `None` when no risk line exists.
    pub risk_state: SeverityTier,
}

/// One `##`-delimited region of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Heading text, or "Overview" for content before the first heading.
    pub title: String,
    /// The section's source lines joined with `\n`.
    pub raw_body: String,
    /// Renderable blocks, in source order.
    pub blocks: Vec<RenderedBlock>,
}

/// Raw partition of a section body, before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Text { lines: Vec<String> },
    Table { lines: Vec<String> },
}

/// A block in the shape consumers walk to build native widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderedBlock {
    /// Free text. `lines` are the untouched source lines, `nodes` their display form.
    Text {
        lines: Vec<String>,
        nodes: Vec<DisplayNode>,
    },
    /// A pipe table with per-cell hints from the column heuristics.
    Table {
        table: ParsedTable,
        cells: Vec<Vec<TableCell>>,
    },
    /// Findings from an embedded ```json card fence.
    Cards(CardGroup),
}

/// Display form of one or more text lines.
///
/// `html` strings are already escaped; the only markup they may contain is
/// `<strong>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DisplayNode {
    Heading { level: u8, html: String },
    Paragraph { html: String },
    List { items: Vec<String> },
}

/// A pipe table split into cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTable {
    pub headers: Vec<String>,
    /// Data rows. A row may be shorter than `headers`.
    pub rows: Vec<Vec<String>>,
}

/// A table cell after the column heuristics ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<CellHint>,
}

/// Rendering hint a column heuristic attached to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CellHint {
    /// Status indicator (health tables).
    Status { tier: SeverityTier },
    /// Trend icon (KPI tables).
    Trend {
        direction: TrendDirection,
        tier: SeverityTier,
    },
    /// Badge around the cell text (positive findings).
    Badge { tier: SeverityTier },
}

/// Direction glyph found in a KPI `Trend` cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum TrendDirection {
    /// `↗`
    Up,
    /// `→`
    Flat,
    /// `↘`
    Down,
    /// `↓`
    SharpDown,
}

/// Findings parsed from a `{"layout": "cards", "items": [...]}` fence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CardGroup {
    pub items: Vec<Card>,
}

/// One finding. The record itself is opaque; accessors live in `cards`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub fields: Map<String, Value>,
    pub severity_tier: SeverityTier,
}

/// Nested `Estimated Effort` record of a card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedEffort {
    pub analysis: Option<String>,
    pub implementation: Option<String>,
}
