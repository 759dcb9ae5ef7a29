//! Header pre-pass: lifts the report title, analysis period and overall risk
//! out of the preamble so they can be shown outside the section flow.
use regex::Regex;

use crate::model::HeaderInfo;
use crate::severity::SeverityTier;

const PERIOD_MARKER: &str = "Analysis Period:";
const RISK_MARKER: &str = "Overall Risk Assessment:";
const QUOTES: &[char] = &['\'', '"', '`'];

/// Result of scanning a report for its header lines.
#[derive(Debug, Clone, Default)]
pub struct HeaderScan {
    /// `None` when none of the three header lines exists.
    pub info: Option<HeaderInfo>,
    /// Indices of the lines that were consumed, in ascending order.
    pub consumed: Vec<usize>,
}

impl HeaderScan {
    pub fn is_consumed(&self, index: usize) -> bool {
        self.consumed.binary_search(&index).is_ok()
    }
}

#[derive(Debug, Clone)]
pub struct HeaderExtractor {
    title_re: Regex,
}

impl HeaderExtractor {
    pub fn new() -> Self {
        Self {
            title_re: Regex::new(r"^#\s+EWA Analysis").expect("valid regex"),
        }
    }

    /// Find the first title, period and risk line. Each kind is taken at most once.
    pub fn scan(&self, lines: &[&str]) -> HeaderScan {
        let mut title: Option<(usize, String)> = None;
        let mut period: Option<(usize, String)> = None;
        let mut risk: Option<(usize, String)> = None;

        for (i, line) in lines.iter().enumerate() {
            if title.is_none() && self.title_re.is_match(line) {
                let text = line.strip_prefix('#').unwrap_or(line).trim();
                title = Some((i, text.to_string()));
                continue;
            }
            if period.is_none() {
                if let Some(pos) = line.find(PERIOD_MARKER) {
                    let value = line[pos + PERIOD_MARKER.len()..].trim();
                    period = Some((i, value.to_string()));
                    continue;
                }
            }
            if risk.is_none() {
                if let Some(pos) = line.find(RISK_MARKER) {
                    let value = line[pos + RISK_MARKER.len()..]
                        .trim()
                        .trim_matches(QUOTES)
                        .trim();
                    risk = Some((i, value.to_string()));
                }
            }
            if title.is_some() && period.is_some() && risk.is_some() {
                break;
            }
        }

        let mut consumed: Vec<usize> = [&title, &period, &risk]
            .into_iter()
            .filter_map(|found| found.as_ref().map(|(i, _)| *i))
            .collect();
        consumed.sort_unstable();

        if consumed.is_empty() {
            return HeaderScan::default();
        }

        let risk_state = risk
            .as_ref()
            .map(|(_, label)| SeverityTier::from_risk_label(label))
            .unwrap_or_default();

        HeaderScan {
            info: Some(HeaderInfo {
                title: title.map(|(_, t)| t),
                period: period.map(|(_, p)| p),
                risk: risk.map(|(_, r)| r),
                risk_state,
            }),
            consumed,
        }
    }
}

impl Default for HeaderExtractor {
    fn default() -> Self {
        Self::new()
    }
}
