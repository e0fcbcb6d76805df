//! Quality gate — detects parroting and replies signed with the sender's name.
//!
//! Both checks compare the model's draft body against the incoming email. A
//! flag sends the pipeline back to the prompt builder with a matching
//! correction directive; see `pipeline::compose_reply` for the retry loop.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::composition::catalog::{all_signoff_markers, match_signoff};
use crate::composition::signature::clean_name;

/// Closing lines inspected for attribution.
const CLOSING_WINDOW_LINES: usize = 3;
/// A line longer than this is prose, not a sign-off.
const MAX_SIGNOFF_LINE_WORDS: usize = 6;

/// Tuning knobs for the parroting check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParrotingThresholds {
    /// Word n-gram size.
    pub ngram_size: usize,
    /// Overlap ratio must exceed this.
    pub max_overlap_ratio: f64,
    /// A verbatim span must cover at least this many consecutive words.
    pub min_verbatim_run_words: usize,
}

impl Default for ParrotingThresholds {
    fn default() -> Self {
        Self {
            ngram_size: 3,
            max_overlap_ratio: 0.35,
            min_verbatim_run_words: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParrotingReport {
    /// Fraction of the draft's n-grams found in the source.
    pub overlap_ratio: f64,
    /// Draft n-grams belonging to a long verbatim run.
    pub verbatim_ngrams: usize,
    /// Longest verbatim run, in words.
    pub longest_run_words: usize,
}

/// Why a draft was rejected. Each flag maps to one retry directive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GateFlag {
    Parroting { overlap_ratio: f64, longest_run_words: usize },
    SignedAsSender { sender_name: String },
}

impl GateFlag {
    /// Same failure class, ignoring the measured numbers.
    pub fn same_kind(&self, other: &GateFlag) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn describe(&self) -> String {
        match self {
            GateFlag::Parroting {
                overlap_ratio,
                longest_run_words,
            } => format!(
                "draft repeats the incoming email (overlap {:.2}, verbatim run of {} words)",
                overlap_ratio, longest_run_words
            ),
            GateFlag::SignedAsSender { sender_name } => {
                format!("draft is signed with the sender's name ({sender_name})")
            }
        }
    }
}

fn re_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\p{L}\p{N}]+").expect("word regex"))
}

/// Lowercase word tokens; punctuation is dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    re_word()
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

fn ngrams(tokens: &[String], n: usize) -> Vec<String> {
    if n == 0 || tokens.len() < n {
        return Vec::new();
    }
    tokens.windows(n).map(|w| w.join(" ")).collect()
}

pub fn parroting_report(source: &str, draft: &str, thresholds: &ParrotingThresholds) -> ParrotingReport {
    let n = thresholds.ngram_size;
    let source_set: HashSet<String> = ngrams(&tokenize(source), n).into_iter().collect();
    let draft_grams = ngrams(&tokenize(draft), n);

    if source_set.is_empty() || draft_grams.is_empty() {
        return ParrotingReport {
            overlap_ratio: 0.0,
            verbatim_ngrams: 0,
            longest_run_words: 0,
        };
    }

    let overlapping: Vec<bool> = draft_grams.iter().map(|g| source_set.contains(g)).collect();
    let overlap_count = overlapping.iter().filter(|&&hit| hit).count();

    // A run of r consecutive shared n-grams covers r + n - 1 words.
    let min_run_grams = thresholds.min_verbatim_run_words.saturating_sub(n - 1).max(1);
    let mut verbatim_ngrams = 0;
    let mut longest_run = 0;
    let mut run = 0;
    for hit in overlapping.iter().copied().chain(std::iter::once(false)) {
        if hit {
            run += 1;
            continue;
        }
        if run >= min_run_grams {
            verbatim_ngrams += run;
        }
        longest_run = longest_run.max(run);
        run = 0;
    }

    ParrotingReport {
        overlap_ratio: overlap_count as f64 / draft_grams.len() as f64,
        verbatim_ngrams,
        longest_run_words: if longest_run == 0 { 0 } else { longest_run + n - 1 },
    }
}

/// Parroting needs both a high overall overlap and at least one long verbatim run.
pub fn is_parroting(report: &ParrotingReport, thresholds: &ParrotingThresholds) -> bool {
    report.overlap_ratio > thresholds.max_overlap_ratio && report.verbatim_ngrams > 0
}

/// True when the draft's closing lines carry the sender's name near a sign-off
/// instead of the recipient's.
pub fn signs_off_as_sender(body: &str, sender_name: &str, recipient_name: &str) -> bool {
    let sender = normalise(sender_name);
    if sender.is_empty() {
        return false;
    }
    let recipient = normalise(recipient_name);

    let lines: Vec<&str> = body.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let closing = &lines[lines.len().saturating_sub(CLOSING_WINDOW_LINES)..];
    let markers = all_signoff_markers();

    for (i, line) in closing.iter().enumerate() {
        let is_last = i + 1 == closing.len();
        let inline_signoff = match_signoff(line, &markers).is_some();
        let after_signoff = i > 0 && match_signoff(closing[i - 1], &markers).is_some();
        if !(is_last || inline_signoff || after_signoff) {
            continue;
        }
        // Without a sign-off, only a bare name on the last line is a signature.
        if !inline_signoff && !after_signoff && clean_name(line, 4).is_none() {
            continue;
        }
        if line.split_whitespace().count() > MAX_SIGNOFF_LINE_WORDS {
            continue;
        }

        let lower = normalise(line);
        if mentions(&lower, &sender) && (recipient.is_empty() || !mentions(&lower, &recipient)) {
            return true;
        }
    }
    false
}

/// Full-name substring, or the line reduced to the name's first token
/// ("Jane", "Jane,") when only a first name was used.
fn mentions(line: &str, name: &str) -> bool {
    if line.contains(name) {
        return true;
    }
    let Some(first) = name.split_whitespace().next() else {
        return false;
    };
    let words: Vec<&str> = line
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|w| !w.is_empty())
        .collect();
    words.last() == Some(&first) && words.len() <= 3
}

fn normalise(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Runs both checks. An empty result means the draft is accepted.
pub fn evaluate(
    draft_body: &str,
    incoming_body: &str,
    sender_name: Option<&str>,
    recipient_name: &str,
    thresholds: &ParrotingThresholds,
) -> Vec<GateFlag> {
    let mut flags = Vec::new();

    let report = parroting_report(incoming_body, draft_body, thresholds);
    if is_parroting(&report, thresholds) {
        flags.push(GateFlag::Parroting {
            overlap_ratio: report.overlap_ratio,
            longest_run_words: report.longest_run_words,
        });
    }

    if let Some(sender) = sender_name.filter(|s| !s.trim().is_empty()) {
        if signs_off_as_sender(draft_body, sender, recipient_name) {
            flags.push(GateFlag::SignedAsSender {
                sender_name: sender.trim().to_string(),
            });
        }
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "Dear John, Your order 123456 will be processed in 14-30 days. \
        We have forwarded the complaint to our warehouse team who will inspect the returned item \
        and decide whether a refund or a replacement is appropriate. Best regards, Jane Smith";

    #[test]
    fn test_tokenize_lowercases_and_drops_punctuation() {
        assert_eq!(tokenize("Hello, World! 14-30 dage"), vec!["hello", "world", "14", "30", "dage"]);
    }

    #[test]
    fn test_verbatim_long_copy_is_flagged() {
        let copy = "We have forwarded the complaint to our warehouse team who will inspect the returned item";
        let thresholds = ParrotingThresholds::default();
        let report = parroting_report(SOURCE, copy, &thresholds);
        assert!(report.overlap_ratio > 0.99);
        assert_eq!(report.longest_run_words, 15);
        assert!(is_parroting(&report, &thresholds));
    }

    #[test]
    fn test_copied_ten_word_order_sentence_is_flagged() {
        let source = "Dear John, Your order 123456 will be processed in 14-30 days. Best regards, Jane Smith";
        let thresholds = ParrotingThresholds::default();

        let sentence_only = parroting_report(source, "Your order 123456 will be processed in 14-30 days.", &thresholds);
        assert_eq!(sentence_only.longest_run_words, 10);
        assert!(is_parroting(&sentence_only, &thresholds));

        let draft = "Dear Jane,\n\nYour order 123456 will be processed in 14-30 days.\n\nBest regards,\nJohn Doe";
        let report = parroting_report(source, draft, &thresholds);
        assert_eq!(report.longest_run_words, 12);
        assert!(is_parroting(&report, &thresholds), "{report:?}");
        assert!(matches!(
            evaluate(draft, source, Some("Jane Smith"), "John Doe", &thresholds).as_slice(),
            [GateFlag::Parroting { .. }]
        ));
    }

    #[test]
    fn test_stop_word_overlap_is_not_flagged() {
        let draft = "Thank you for letting me know. I will wait for the outcome and \
            get back to you if anything changes on my side.";
        let source = "Thank you for your patience. We will let you know once the outcome is ready.";
        let thresholds = ParrotingThresholds::default();
        let report = parroting_report(source, draft, &thresholds);
        assert!(!is_parroting(&report, &thresholds), "{report:?}");
    }

    #[test]
    fn test_high_overlap_without_long_run_is_not_flagged() {
        let source = "order 123456 confirmed. refund is pending";
        let draft = "order 123456 confirmed. refund is pending";
        let thresholds = ParrotingThresholds::default();
        let report = parroting_report(source, draft, &thresholds);
        assert!(report.overlap_ratio > 0.35);
        assert!(!is_parroting(&report, &thresholds), "six words is not a long span");
    }

    #[test]
    fn test_long_run_diluted_by_own_text_is_not_flagged() {
        let draft = format!(
            "{} {}",
            "Thanks a lot for the note about the parcel, I had been wondering what happened to it and \
             appreciate that you took the time to explain it all so clearly to me today. In the meantime \
             I will keep the packaging around just in case anyone needs to look at it again later on, \
             and I am happy to drop it off at a pickup point if that makes things easier for your side.",
            "Your order 123456 will be processed in 14-30 days."
        );
        let thresholds = ParrotingThresholds::default();
        let report = parroting_report(SOURCE, &draft, &thresholds);
        assert!(report.verbatim_ngrams > 0);
        assert!(!is_parroting(&report, &thresholds));
    }

    #[test]
    fn test_empty_texts_yield_zero_report() {
        let report = parroting_report("", "anything at all here", &ParrotingThresholds::default());
        assert_eq!(report.overlap_ratio, 0.0);
        assert_eq!(report.longest_run_words, 0);
    }

    #[test]
    fn test_thresholds_are_tunable() {
        let copy = "order 123456 confirmed. refund is pending";
        let strict = ParrotingThresholds {
            min_verbatim_run_words: 5,
            ..ParrotingThresholds::default()
        };
        let report = parroting_report(copy, copy, &strict);
        assert!(is_parroting(&report, &strict));
    }

    #[test]
    fn test_body_ending_with_sender_name_is_flagged() {
        let body = "Thanks for the update on my order.\n\nBest regards,\nJane Smith";
        assert!(signs_off_as_sender(body, "Jane Smith", "John Doe"));
    }

    #[test]
    fn test_body_ending_with_recipient_name_is_not_flagged() {
        let body = "Thanks for the update on my order.\n\nBest regards,\nJohn Doe";
        assert!(!signs_off_as_sender(body, "Jane Smith", "John Doe"));
    }

    #[test]
    fn test_first_name_only_signature_is_flagged() {
        let body = "Noted, thank you.\n\nCheers,\nJane";
        assert!(signs_off_as_sender(body, "Jane Smith", "John Doe"));
    }

    #[test]
    fn test_inline_signoff_with_sender_name_is_flagged() {
        let body = "I will wait for the refund.\nMed venlig hilsen, Jane Smith";
        assert!(signs_off_as_sender(body, "Jane Smith", "John Doe"));
    }

    #[test]
    fn test_sender_name_in_prose_is_not_flagged() {
        let body = "Jane Smith mentioned the refund would be processed soon, thanks for that.\n\nBest regards,\nJohn Doe";
        assert!(!signs_off_as_sender(body, "Jane Smith", "John Doe"));
    }

    #[test]
    fn test_closing_addressed_to_sender_is_not_flagged() {
        let body = "I will wait for the refund.\n\nThanks again, Jane!";
        assert!(!signs_off_as_sender(body, "Jane Smith", "John Doe"));
    }

    #[test]
    fn test_bare_sender_name_on_last_line_is_flagged() {
        let body = "I will wait for the refund.\nJane Smith";
        assert!(signs_off_as_sender(body, "Jane Smith", "John Doe"));
    }

    #[test]
    fn test_unknown_sender_never_flags() {
        assert!(!signs_off_as_sender("Best regards,\nJane Smith", "", "John Doe"));
    }

    #[test]
    fn test_evaluate_collects_both_flags() {
        let draft = "We have forwarded the complaint to our warehouse team who will inspect the returned item\nBest regards,\nJane Smith";
        let flags = evaluate(draft, SOURCE, Some("Jane Smith"), "John Doe", &ParrotingThresholds::default());
        assert_eq!(flags.len(), 2);
        assert!(matches!(flags[0], GateFlag::Parroting { .. }));
        assert_eq!(
            flags[1],
            GateFlag::SignedAsSender {
                sender_name: "Jane Smith".into()
            }
        );
    }

    #[test]
    fn test_same_kind_ignores_measurements() {
        let a = GateFlag::Parroting {
            overlap_ratio: 0.5,
            longest_run_words: 12,
        };
        let b = GateFlag::Parroting {
            overlap_ratio: 0.9,
            longest_run_words: 30,
        };
        assert!(a.same_kind(&b));
    }
}
