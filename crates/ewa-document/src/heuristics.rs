//! Column heuristics: optional per-cell rendering hints for known report tables.
//!
//! Each heuristic pairs a predicate over a parsed table with a per-cell
//! transform. They run in order and the first hint attached to a cell wins,
//! so new report tables can be supported by appending an entry instead of
//! touching the parser.
use std::fmt;

use crate::model::{CellHint, ParsedTable, TableCell, TrendDirection};
use crate::severity::SeverityTier;

/// What a heuristic may look at besides the table itself.
#[derive(Debug, Clone, Copy)]
pub struct TableContext<'a> {
    pub section_title: &'a str,
}

pub trait ColumnHeuristic: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this heuristic applies to `table` at all.
    fn matches(&self, table: &ParsedTable, ctx: &TableContext<'_>) -> bool;

    /// Hint for the cell at `column` holding `value`, if any.
    fn annotate(&self, table: &ParsedTable, column: usize, value: &str) -> Option<CellHint>;
}

/// Health overview: `Area | Status | ...`, status keywords colored.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthStatus;

impl ColumnHeuristic for HealthStatus {
    fn name(&self) -> &'static str {
        "health-status"
    }

    fn matches(&self, table: &ParsedTable, _ctx: &TableContext<'_>) -> bool {
        table.headers.first().is_some_and(|h| h == "Area")
            && table.headers.get(1).is_some_and(|h| h == "Status")
    }

    fn annotate(&self, _table: &ParsedTable, column: usize, value: &str) -> Option<CellHint> {
        (column == 1).then(|| CellHint::Status {
            tier: SeverityTier::from_status_label(value),
        })
    }
}

/// Glyph table for KPI trends. Fixed on purpose: a rising value is not
/// necessarily good, and the reports give no way to tell.
const TREND_GLYPHS: &[(char, TrendDirection, SeverityTier)] = &[
    ('↗', TrendDirection::Up, SeverityTier::Success),
    ('→', TrendDirection::Flat, SeverityTier::None),
    ('↘', TrendDirection::Down, SeverityTier::Warning),
    ('↓', TrendDirection::SharpDown, SeverityTier::Error),
];

/// KPI tables: any `Trend` column gets a trend icon.
#[derive(Debug, Clone, Copy, Default)]
pub struct KpiTrend;

impl ColumnHeuristic for KpiTrend {
    fn name(&self) -> &'static str {
        "kpi-trend"
    }

    fn matches(&self, table: &ParsedTable, _ctx: &TableContext<'_>) -> bool {
        table.column("Trend").is_some()
    }

    fn annotate(&self, table: &ParsedTable, column: usize, value: &str) -> Option<CellHint> {
        if table.headers.get(column).map(String::as_str) != Some("Trend") {
            return None;
        }
        TREND_GLYPHS
            .iter()
            .find(|(glyph, _, _)| value.contains(*glyph))
            .map(|&(_, direction, tier)| CellHint::Trend { direction, tier })
    }
}

/// `Positive Findings` section: the first column is always a success badge.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositiveFindings;

pub const POSITIVE_FINDINGS_TITLE: &str = "Positive Findings";

impl ColumnHeuristic for PositiveFindings {
    fn name(&self) -> &'static str {
        "positive-findings"
    }

    fn matches(&self, _table: &ParsedTable, ctx: &TableContext<'_>) -> bool {
        ctx.section_title == POSITIVE_FINDINGS_TITLE
    }

    fn annotate(&self, _table: &ParsedTable, column: usize, _value: &str) -> Option<CellHint> {
        (column == 0).then_some(CellHint::Badge {
            tier: SeverityTier::Success,
        })
    }
}

impl TrendDirection {
    /// Icon name renderers use for the direction.
    pub fn icon(self) -> &'static str {
        match self {
            TrendDirection::Up => "trend-up",
            TrendDirection::Flat => "trend-flat",
            TrendDirection::Down => "trend-down",
            TrendDirection::SharpDown => "trend-down-sharp",
        }
    }
}

/// Ordered list of heuristics applied to every valid table.
#[derive(Default)]
pub struct HeuristicSet {
    entries: Vec<Box<dyn ColumnHeuristic>>,
}

impl HeuristicSet {
    /// No heuristics: every cell is plain text.
    pub fn none() -> Self {
        Self::default()
    }

    /// Health, KPI and positive-findings heuristics, in that order.
    pub fn standard() -> Self {
        Self::none()
            .with(HealthStatus)
            .with(KpiTrend)
            .with(PositiveFindings)
    }

    pub fn with(mut self, heuristic: impl ColumnHeuristic + 'static) -> Self {
        self.entries.push(Box::new(heuristic));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|h| h.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build the cell grid for `table`, padding short rows to the table width.
    pub fn annotate(&self, table: &ParsedTable, ctx: &TableContext<'_>) -> Vec<Vec<TableCell>> {
        let width = table.width();
        let mut cells: Vec<Vec<TableCell>> = (0..table.rows.len())
            .map(|row| {
                (0..width)
                    .map(|col| TableCell {
                        text: table.cell(row, col).to_string(),
                        hint: None,
                    })
                    .collect()
            })
            .collect();

        for heuristic in self.entries.iter().filter(|h| h.matches(table, ctx)) {
            for row in cells.iter_mut() {
                for (col, cell) in row.iter_mut().enumerate() {
                    if cell.hint.is_none() {
                        cell.hint = heuristic.annotate(table, col, &cell.text);
                    }
                }
            }
        }

        cells
    }
}

impl fmt::Debug for HeuristicSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
