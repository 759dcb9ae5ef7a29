//! Card-group parser for ```json fences embedded in a section.
//!
//! The backend encodes key findings as
//! `{"layout": "cards", "items": [{...}, ...]}` inside a fenced block. Anything
//! that does not match that shape is left for ordinary text rendering.
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::CardError;
use crate::model::{Card, CardGroup, EstimatedEffort};
use crate::severity::SeverityTier;

pub const JSON_FENCE: &str = "```json";
const FENCE_CLOSE: &str = "```";

/// Well-known keys of a finding record.
pub mod keys {
    pub const ISSUE_ID: &str = "Issue ID";
    pub const AREA: &str = "Area";
    pub const SEVERITY: &str = "Severity";
    pub const SOURCE: &str = "Source";
    pub const FINDING: &str = "Finding";
    pub const IMPACT: &str = "Impact";
    pub const BUSINESS_IMPACT: &str = "Business impact";
    pub const ESTIMATED_EFFORT: &str = "Estimated Effort";
    pub const RESPONSIBLE_AREA: &str = "Responsible Area";
    pub const ACTION: &str = "Action";
    pub const PREVENTATIVE_ACTION: &str = "Preventative Action";
}

/// A located ```json fence, borrowed from the section body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardFence<'a> {
    /// Body text before the opening marker.
    pub before: &'a str,
    /// Text between the opening marker and the closing fence.
    pub payload: &'a str,
    /// Body text after the closing fence.
    pub after: &'a str,
}

/// Locate the first ```json fence. `Ok(None)` when the body has none.
pub fn find_card_fence(body: &str) -> Result<Option<CardFence<'_>>, CardError> {
    let Some(open) = body.find(JSON_FENCE) else {
        return Ok(None);
    };
    let payload_start = open + JSON_FENCE.len();
    let close = body[payload_start..]
        .find(FENCE_CLOSE)
        .map(|offset| payload_start + offset)
        .ok_or(CardError::Unterminated)?;

    Ok(Some(CardFence {
        before: &body[..open],
        payload: &body[payload_start..close],
        after: &body[close + FENCE_CLOSE.len()..],
    }))
}

/// Parse a fence payload into a card group.
pub fn parse_card_payload(payload: &str) -> Result<CardGroup, CardError> {
    let value: Value = serde_json::from_str(payload)?;

    let layout = value.get("layout").and_then(Value::as_str);
    if layout != Some("cards") {
        return Err(CardError::Layout {
            found: layout.map(str::to_string),
        });
    }

    let items = value
        .get("items")
        .and_then(Value::as_array)
        .ok_or(CardError::MissingItems)?;

    let items = items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => Ok(Card::new(fields.clone())),
            _ => Err(CardError::ItemNotObject { index }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CardGroup { items })
}

/// Card group of a section body, or `None` when there is none or it is malformed.
pub fn extract_card_group(body: &str) -> Option<CardGroup> {
    let fence = match find_card_fence(body) {
        Ok(Some(fence)) => fence,
        Ok(None) => return None,
        Err(e) => {
            debug!(error = %e, "card fence ignored");
            return None;
        }
    };
    parse_card_payload(fence.payload)
        .inspect_err(|e| debug!(error = %e, "card payload ignored"))
        .ok()
}

impl Card {
    pub fn new(fields: Map<String, Value>) -> Self {
        let severity_tier = fields
            .get(keys::SEVERITY)
            .and_then(Value::as_str)
            .map(SeverityTier::from_card_severity)
            .unwrap_or(SeverityTier::Success);
        Self {
            fields,
            severity_tier,
        }
    }

    /// Field as display text. Scalars are stringified; `null` and absent keys are `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        value_text(self.fields.get(key)?)
    }

    pub fn issue_id(&self) -> Option<String> {
        self.text(keys::ISSUE_ID)
    }

    pub fn severity(&self) -> Option<String> {
        self.text(keys::SEVERITY)
    }

    pub fn finding(&self) -> Option<String> {
        self.text(keys::FINDING)
    }

    /// The nested `Estimated Effort` record; `None` unless it is an object.
    pub fn estimated_effort(&self) -> Option<EstimatedEffort> {
        let effort = self.fields.get(keys::ESTIMATED_EFFORT)?.as_object()?;
        Some(EstimatedEffort {
            analysis: effort.get("analysis").and_then(value_text),
            implementation: effort.get("implementation").and_then(value_text),
        })
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FINDINGS: &str = r#"Intro text
```json
{"layout":"cards","items":[
  {"Issue ID":"KF-01","Area":"DB","Severity":"critical","Finding":"x",
   "Estimated Effort":{"analysis":"2h","implementation":"1d"}},
  {"Issue ID":"KF-02","Area":"OS","Severity":"Medium","Finding":"y","Source":null}
]}
```
Outro text"#;

    #[test]
    fn locates_fence_parts() {
        let fence = find_card_fence(FINDINGS).unwrap().expect("fence present");
        assert_eq!(fence.before, "Intro text\n");
        assert!(fence.payload.trim_start().starts_with("{\"layout\""));
        assert_eq!(fence.after, "\nOutro text");
    }

    #[test]
    fn parses_cards_and_severity() {
        let group = extract_card_group(FINDINGS).expect("card group");
        assert_eq!(group.items.len(), 2);

        let first = &group.items[0];
        assert_eq!(first.issue_id().as_deref(), Some("KF-01"));
        assert_eq!(first.severity_tier, SeverityTier::Error);
        assert_eq!(
            first.estimated_effort(),
            Some(EstimatedEffort {
                analysis: Some("2h".to_string()),
                implementation: Some("1d".to_string()),
            })
        );

        let second = &group.items[1];
        assert_eq!(second.severity_tier, SeverityTier::Warning);
        assert_eq!(second.text(keys::SOURCE), None);
        assert_eq!(second.estimated_effort(), None);
    }

    #[test]
    fn missing_severity_is_success() {
        let group = parse_card_payload(r#"{"layout":"cards","items":[{"Finding":"z","Severity":7}]}"#)
            .expect("card group");
        assert_eq!(group.items[0].severity_tier, SeverityTier::Success);
        assert_eq!(group.items[0].severity().as_deref(), Some("7"));
    }

    #[test]
    fn no_fence_is_none() {
        assert!(find_card_fence("plain text").unwrap().is_none());
        assert!(extract_card_group("plain text").is_none());
    }

    #[test]
    fn unterminated_fence_is_rejected() {
        assert!(matches!(
            find_card_fence("```json\n{}"),
            Err(CardError::Unterminated)
        ));
        assert!(extract_card_group("```json\n{}").is_none());
    }

    #[test]
    fn shape_mismatches_are_rejected() {
        assert!(matches!(
            parse_card_payload(r#"{"items":[]}"#),
            Err(CardError::Layout { found: None })
        ));
        assert!(matches!(
            parse_card_payload(r#"{"layout":"table","items":[]}"#),
            Err(CardError::Layout { found: Some(_) })
        ));
        assert!(matches!(
            parse_card_payload(r#"{"layout":"cards","items":{}}"#),
            Err(CardError::MissingItems)
        ));
        assert!(matches!(
            parse_card_payload(r#"{"layout":"cards","items":[{}, 3]}"#),
            Err(CardError::ItemNotObject { index: 1 })
        ));
        assert!(matches!(parse_card_payload("{not json"), Err(CardError::Json(_))));
    }

    #[test]
    fn empty_items_is_a_valid_group() {
        let group = parse_card_payload(r#"{"layout":"cards","items":[]}"#).expect("card group");
        assert!(group.items.is_empty());
    }
}
