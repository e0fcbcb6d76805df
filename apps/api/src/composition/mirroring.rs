//! Mirroring hint — a short list of facts the model should acknowledge in its own words.
//!
//! Advisory prompt text only; nothing validates against it.

use crate::composition::facts::{DayWindow, ExtractedFacts};

/// Renders at most one clause per fact class, joined by semicolons:
/// `"case number: 123456; timeline: ~14–30 days"`. Empty when nothing was found.
pub fn build_mirroring_hint(facts: &ExtractedFacts) -> String {
    if facts.is_empty() {
        return String::new();
    }
    let mut clauses = Vec::new();

    if let Some(case_id) = facts.case_ids.first() {
        clauses.push(format!("case number: {case_id}"));
    }
    if let Some(window) = facts.day_windows.first() {
        clauses.push(format!("timeline: ~{}", render_window(window)));
    }
    if facts.email_updates_promised {
        clauses.push("further updates will come by email".to_string());
    }

    clauses.join("; ")
}

fn render_window(window: &DayWindow) -> String {
    if window.min == window.max {
        let unit = if window.min == 1 { "day" } else { "days" };
        format!("{} {unit}", window.min)
    } else {
        format!("{}–{} days", window.min, window.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::facts::extract_facts;

    #[test]
    fn test_hint_for_order_sentence() {
        let facts = extract_facts("Your order 123456 will be processed in 14-30 days");
        assert_eq!(build_mirroring_hint(&facts), "case number: 123456; timeline: ~14–30 days");
    }

    #[test]
    fn test_empty_facts_give_empty_hint() {
        assert_eq!(build_mirroring_hint(&ExtractedFacts::default()), "");
    }

    #[test]
    fn test_one_clause_per_class() {
        let facts = ExtractedFacts {
            case_ids: vec!["1111".into(), "2222".into()],
            day_windows: vec![DayWindow { min: 1, max: 1 }, DayWindow { min: 5, max: 10 }],
            email_updates_promised: true,
        };
        assert_eq!(
            build_mirroring_hint(&facts),
            "case number: 1111; timeline: ~1 day; further updates will come by email"
        );
    }
}
