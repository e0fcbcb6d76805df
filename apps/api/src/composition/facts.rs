//! Fact extraction — case identifiers, day windows and promised email updates.
//!
//! Pure pattern matching, no model involvement. Never fails: no match means an
//! empty collection.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Upper bound on day windows carried into the hint.
const MAX_DAY_WINDOWS: usize = 3;
const MIN_CASE_ID_DIGITS: usize = 4;
const MAX_WINDOW_DAYS: u32 = 365;

/// A processing time window in days. `min == max` for a single number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFacts {
    /// Normalised digit strings, first-seen order.
    pub case_ids: Vec<String>,
    pub day_windows: Vec<DayWindow>,
    /// The sender said further updates will come by email.
    pub email_updates_promised: bool,
}

impl ExtractedFacts {
    pub fn is_empty(&self) -> bool {
        self.case_ids.is_empty() && self.day_windows.is_empty() && !self.email_updates_promised
    }
}

fn re_labelled_case_id() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:case|order|ref|reference|ticket|reklamationssag|sagsnummer|sag|ordrenummer|ordre)\b(?:\s*(?:no|nr|number|nummer|id)\b\.?)?\s*[:#.\-]?\s*#?(\d{2,}(?:[-/]\d{2,})*)",
        )
        .expect("case id regex")
    })
}

fn re_bare_case_id() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{6,}\b").expect("bare case id regex"))
}

fn re_day_window() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(\d{1,3})(?:\s*(?:-|–|—|to|til)\s*(\d{1,3}))?\s*(?:(?:business|working|calendar)\s+)?(?:days?|(?:arbejds|hver)?dage|dag)\b",
        )
        .expect("day window regex")
    })
}

fn re_email_updates() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bopdatering(?:er)?\b|\bupdates?\b|\bvia e-?mail\b|\be-mail\b")
            .expect("email updates regex")
    })
}

pub fn extract_facts(text: &str) -> ExtractedFacts {
    ExtractedFacts {
        case_ids: extract_case_ids(text),
        day_windows: extract_day_windows(text),
        email_updates_promised: re_email_updates().is_match(text),
    }
}

/// Labelled identifiers ("order 123456", "sag nr. 55-1234") first, then bare
/// digit runs of six or more. Deduplicated by digit string.
pub fn extract_case_ids(text: &str) -> Vec<String> {
    let labelled = re_labelled_case_id()
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str());
    let bare = re_bare_case_id().find_iter(text).map(|m| m.as_str());

    let mut seen = HashSet::new();
    labelled
        .chain(bare)
        .map(|raw| raw.chars().filter(char::is_ascii_digit).collect::<String>())
        .filter(|digits| digits.len() >= MIN_CASE_ID_DIGITS)
        .filter(|digits| seen.insert(digits.clone()))
        .collect()
}

/// "14 days", "14-30 days", "14 til 30 dage" → `{min, max}`.
pub fn extract_day_windows(text: &str) -> Vec<DayWindow> {
    let mut windows: Vec<DayWindow> = Vec::new();
    for caps in re_day_window().captures_iter(text) {
        let Some(first) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
            continue;
        };
        let second = caps
            .get(2)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(first);
        let window = DayWindow {
            min: first.min(second),
            max: first.max(second),
        };
        if window.min == 0 || window.max > MAX_WINDOW_DAYS {
            continue;
        }
        if !windows.contains(&window) {
            windows.push(window);
        }
        if windows.len() == MAX_DAY_WINDOWS {
            break;
        }
    }
    windows
}
