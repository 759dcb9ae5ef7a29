//! Document model for EWA analysis reports.
//!
//! The analysis backend emits a narrow markdown dialect: `#`/`##`/`###`
//! headings, `**bold**`, `- `/`* ` bullets, pipe tables, and ```json fences
//! holding finding cards. [`transform`] turns that text into a [`Document`]
//! of sections and typed blocks that a UI layer can map onto native widgets
//! without ever handling raw HTML.
//!
//! ```
//! let doc = ewa_document::transform("## Overview\nHello **world**\n");
//! assert_eq!(doc.sections[0].title, "Overview");
//! ```

pub mod blocks;
pub mod cards;
pub mod error;
pub mod header;
pub mod heuristics;
pub mod inline;
pub mod lines;
pub mod model;
pub mod sections;
pub mod severity;
pub mod table;
pub mod transform;

pub use heuristics::{ColumnHeuristic, HeuristicSet, TableContext};
pub use inline::{escape_html, render_html};
pub use model::{
    Block, Card, CardGroup, CellHint, DisplayNode, Document, EstimatedEffort, HeaderInfo,
    ParsedTable, RenderedBlock, Section, TableCell, TrendDirection,
};
pub use severity::SeverityTier;
pub use transform::{transform, DocumentTransformer, TransformOptions};
