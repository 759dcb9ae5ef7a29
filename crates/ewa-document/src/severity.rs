//! Severity tiers and the label tables that map free text onto them.
//!
//! Three label vocabularies exist in the reports: the overall risk line in the
//! header, the `Severity` field of finding cards, and the `Status` column of
//! health tables. Each has its own table below so renderers color them the
//! same way everywhere.
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Visual/semantic level derived from a severity or status label.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum SeverityTier {
    Error,
    Warning,
    Success,
    #[default]
    None,
}

/// Overall-risk keywords, matched as case-insensitive substrings in order.
const RISK_TIERS: &[(&str, SeverityTier)] = &[
    ("high", SeverityTier::Error),
    ("critical", SeverityTier::Error),
    ("medium", SeverityTier::Warning),
    ("fair", SeverityTier::Warning),
    ("low", SeverityTier::Success),
    ("good", SeverityTier::Success),
];

/// Card `Severity` labels, matched case-insensitively against the whole label.
/// Any label not listed here is `Success`.
pub const CARD_SEVERITY_TIERS: &[(&str, SeverityTier)] = &[
    ("critical", SeverityTier::Error),
    ("high", SeverityTier::Error),
    ("medium", SeverityTier::Warning),
];

/// Health-table status keywords, matched as case-insensitive substrings in order.
const STATUS_TIERS: &[(&str, SeverityTier)] = &[
    ("good", SeverityTier::Success),
    ("fair", SeverityTier::Warning),
    ("poor", SeverityTier::Error),
    ("critical", SeverityTier::Error),
];

impl SeverityTier {
    /// Tier for the header's overall risk label.
    pub fn from_risk_label(label: &str) -> Self {
        first_substring_match(RISK_TIERS, label).unwrap_or(SeverityTier::None)
    }

    /// Tier for a finding card's `Severity` field.
    pub fn from_card_severity(label: &str) -> Self {
        let label = label.trim();
        CARD_SEVERITY_TIERS
            .iter()
            .find(|(key, _)| label.eq_ignore_ascii_case(key))
            .map(|(_, tier)| *tier)
            .unwrap_or(SeverityTier::Success)
    }

    /// Tier for a health table `Status` cell. Unknown statuses are neutral.
    pub fn from_status_label(label: &str) -> Self {
        first_substring_match(STATUS_TIERS, label).unwrap_or(SeverityTier::None)
    }
}

fn first_substring_match(table: &[(&str, SeverityTier)], label: &str) -> Option<SeverityTier> {
    let lower = label.to_lowercase();
    table
        .iter()
        .find(|(key, _)| lower.contains(key))
        .map(|(_, tier)| *tier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_labels() {
        assert_eq!(SeverityTier::from_risk_label("High"), SeverityTier::Error);
        assert_eq!(SeverityTier::from_risk_label("CRITICAL"), SeverityTier::Error);
        assert_eq!(SeverityTier::from_risk_label("Medium"), SeverityTier::Warning);
        assert_eq!(SeverityTier::from_risk_label("fair"), SeverityTier::Warning);
        assert_eq!(SeverityTier::from_risk_label("Low"), SeverityTier::Success);
        assert_eq!(SeverityTier::from_risk_label("Good"), SeverityTier::Success);
        assert_eq!(SeverityTier::from_risk_label("Unknown"), SeverityTier::None);
        assert_eq!(SeverityTier::from_risk_label(""), SeverityTier::None);
    }

    #[test]
    fn card_severity_is_whole_label_match() {
        assert_eq!(SeverityTier::from_card_severity("critical"), SeverityTier::Error);
        assert_eq!(SeverityTier::from_card_severity(" High "), SeverityTier::Error);
        assert_eq!(SeverityTier::from_card_severity("MEDIUM"), SeverityTier::Warning);
        assert_eq!(SeverityTier::from_card_severity("low"), SeverityTier::Success);
        // Substrings do not count for cards.
        assert_eq!(SeverityTier::from_card_severity("very high"), SeverityTier::Success);
        assert_eq!(SeverityTier::from_card_severity(""), SeverityTier::Success);
    }

    #[test]
    fn status_labels() {
        assert_eq!(SeverityTier::from_status_label("Good"), SeverityTier::Success);
        assert_eq!(SeverityTier::from_status_label("Fair (2 warnings)"), SeverityTier::Warning);
        assert_eq!(SeverityTier::from_status_label("Poor"), SeverityTier::Error);
        assert_eq!(SeverityTier::from_status_label("critical"), SeverityTier::Error);
        assert_eq!(SeverityTier::from_status_label("n/a"), SeverityTier::None);
    }
}
