//! Reasons a construct in a report was downgraded to plain text.
//!
//! None of these ever reach the caller of `transform`; they are logged at
//! debug level and the affected lines are rendered as text instead.

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("table needs a header and a separator line, got {lines} line(s)")]
    TooShort { lines: usize },

    #[error("second table line is not a `---` separator: {line}")]
    MissingSeparator { line: String },
}

#[derive(Debug, thiserror::Error)]
pub enum CardError {
    #[error("```json fence is never closed")]
    Unterminated,

    #[error("invalid card JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("card block layout is {found:?}, expected \"cards\"")]
    Layout { found: Option<String> },

    #[error("card block has no `items` array")]
    MissingItems,

    #[error("card item {index} is not a JSON object")]
    ItemNotObject { index: usize },
}
