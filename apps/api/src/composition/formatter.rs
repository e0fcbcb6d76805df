//! Reply formatting — deterministic greeting and sign-off injection.
//!
//! Detection uses the same catalog phrases that injection writes, which is what
//! makes `format_reply` idempotent: a second pass finds the greeting and the
//! recipient-signed closing it added on the first pass and changes nothing.

use crate::composition::catalog::{catalog, match_signoff, starts_with_greeting};
use crate::composition::signature::{clean_name, has_title};
use crate::models::format::{GreetingStyle, ReplyFormatConfig};

/// Closing lines searched for an existing sign-off.
const SIGNOFF_SEARCH_LINES: usize = 4;
const MAX_SIGNATURE_LINE_WORDS: usize = 4;

/// Ensures `body` opens with a greeting to the sender and closes with a
/// sign-off naming the recipient.
pub fn format_reply(
    body: &str,
    cfg: &ReplyFormatConfig,
    sender_name: Option<&str>,
    recipient_name: &str,
) -> String {
    let normalised = body.replace("\r\n", "\n");
    let mut text = normalised.trim().to_string();
    let lang = catalog(cfg.language);
    let sender_name = sender_name.map(str::trim).filter(|s| !s.is_empty());
    let recipient_name = recipient_name.trim();

    let first_line = text.lines().next().unwrap_or("");
    if !starts_with_greeting(first_line, &lang.greeting_openers()) {
        let greeting = choose_greeting(cfg, sender_name);
        let spacer = "\n".repeat(cfg.blank_lines_after_greeting);
        text = if text.is_empty() {
            greeting
        } else {
            format!("{greeting}\n{spacer}{text}")
        };
    }

    let lines: Vec<&str> = text.lines().collect();
    let markers = lang.signoff_markers();
    let signoff_at = find_signoff_line(&lines, &markers);

    let closing_ok = signoff_at.is_some_and(|idx| {
        let closing = lines[idx..].join("\n").to_lowercase();
        recipient_name.is_empty() || names_recipient(&closing, recipient_name)
    });
    if closing_ok {
        return text;
    }

    let kept = match signoff_at {
        Some(idx) => lines[..idx].join("\n"),
        None => text.clone(),
    };
    let phrase = lang.signoff_phrase(cfg.signoff_style);
    let spacer = "\n".repeat(cfg.blank_lines_before_signoff);
    let mut out = format!("{}\n{spacer}{phrase}", kept.trim_end());
    if !recipient_name.is_empty() {
        out.push('\n');
        out.push_str(recipient_name);
    }
    out
}

/// The greeting line for a style, with `{name}` filled.
///
/// `Auto` is NEUTRAL unless the sender carries a title, which favours FORMAL.
/// Named styles degrade to NEUTRAL when the sender is unknown.
pub fn choose_greeting(cfg: &ReplyFormatConfig, sender_name: Option<&str>) -> String {
    let style = match (cfg.greeting_style, sender_name) {
        (_, None) => GreetingStyle::Neutral,
        (GreetingStyle::Auto, Some(name)) if has_title(name) => GreetingStyle::Formal,
        (GreetingStyle::Auto, Some(_)) => GreetingStyle::Neutral,
        (style, Some(_)) => style,
    };
    let template = catalog(cfg.language).greeting_template(style);
    match sender_name {
        Some(name) if template.contains("{name}") => template.replace("{name}", &greeting_name(name)),
        _ => template.to_string(),
    }
}

/// First name, or the full name when it carries a title ("Dr. Hansen").
fn greeting_name(name: &str) -> String {
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if has_title(&collapsed) {
        return collapsed;
    }
    collapsed
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Index of the last sign-off line among the closing lines.
fn find_signoff_line(lines: &[&str], markers: &[String]) -> Option<usize> {
    let non_empty: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, _)| i)
        .collect();
    // The first line is the greeting; never treat it as a closing.
    non_empty
        .iter()
        .rev()
        .take(SIGNOFF_SEARCH_LINES)
        .copied()
        .filter(|&i| i > 0)
        .find(|&i| {
            is_closing_line(lines[i], markers)
                && lines[i + 1..]
                    .iter()
                    .all(|l| l.trim().is_empty() || is_signature_line(l))
        })
}

/// A line that can sit under a sign-off: a name, title or company.
fn is_signature_line(line: &str) -> bool {
    let line = line.trim();
    clean_name(line, MAX_SIGNATURE_LINE_WORDS).is_some()
        || (line.split_whitespace().count() <= MAX_SIGNATURE_LINE_WORDS
            && !line.ends_with(['.', '!', '?', ':', ';']))
}

/// A sign-off marker alone or followed by a name. "Thanks, noted." is prose.
fn is_closing_line(line: &str, markers: &[String]) -> bool {
    let Some(rest) = match_signoff(line, markers) else {
        return false;
    };
    let rest = rest.trim_start_matches(|c: char| !c.is_alphanumeric()).trim();
    rest.is_empty() || clean_name(rest, 4).is_some()
}

fn names_recipient(closing_lower: &str, recipient_name: &str) -> bool {
    let recipient = recipient_name.to_lowercase();
    if closing_lower.contains(&recipient) {
        return true;
    }
    // A closing signed with the recipient's first name alone is still theirs.
    let Some(first) = recipient.split_whitespace().next() else {
        return false;
    };
    closing_lower
        .lines()
        .skip(1)
        .any(|line| line.trim().trim_end_matches(['.', ',', '!']) == first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::format::{Language, SignOffStyle};

    fn cfg(greeting_style: GreetingStyle) -> ReplyFormatConfig {
        ReplyFormatConfig {
            greeting_style,
            ..ReplyFormatConfig::default()
        }
    }

    #[test]
    fn test_injects_formal_greeting_and_signoff() {
        let out = format_reply(
            "Thanks for the update on the order.",
            &cfg(GreetingStyle::Formal),
            Some("Jane Smith"),
            "John Doe",
        );
        assert_eq!(
            out,
            "Dear Jane,\n\nThanks for the update on the order.\n\nBest regards,\nJohn Doe"
        );
    }

    #[test]
    fn test_format_is_idempotent() {
        let c = ReplyFormatConfig {
            greeting_style: GreetingStyle::Casual,
            signoff_style: SignOffStyle::Cheers,
            blank_lines_after_greeting: 2,
            blank_lines_before_signoff: 0,
            language: Language::En,
        };
        for body in [
            "Thanks for the update.",
            "Hi Jane,\nNoted.\n\nKind regards,\nJohn Doe",
            "Noted.\n\nBest regards,\nJane Smith",
            "",
            "Tak for beskeden.\r\n\r\nMvh\r\nJohn",
        ] {
            let once = format_reply(body, &c, Some("Jane Smith"), "John Doe");
            let twice = format_reply(&once, &c, Some("Jane Smith"), "John Doe");
            assert_eq!(once, twice, "not idempotent for {body:?}");
        }
    }

    #[test]
    fn test_existing_greeting_is_kept() {
        let out = format_reply("Hello Jane,\n\nNoted.", &cfg(GreetingStyle::Formal), Some("Jane Smith"), "John Doe");
        assert!(out.starts_with("Hello Jane,\n\nNoted."));
    }

    #[test]
    fn test_wrong_name_signoff_is_replaced() {
        let out = format_reply(
            "Dear Jane,\n\nNoted.\n\nBest regards,\nJane Smith\nAcme Corp",
            &cfg(GreetingStyle::Formal),
            Some("Jane Smith"),
            "John Doe",
        );
        assert_eq!(out, "Dear Jane,\n\nNoted.\n\nBest regards,\nJohn Doe");
    }

    #[test]
    fn test_correct_signoff_in_other_style_is_kept() {
        let body = "Dear Jane,\n\nNoted.\n\nKind regards,\nJohn Doe\nSupport Team";
        let out = format_reply(body, &cfg(GreetingStyle::Formal), Some("Jane Smith"), "John Doe");
        assert_eq!(out, body);
    }

    #[test]
    fn test_first_name_signature_counts_as_recipient() {
        let body = "Hello,\n\nNoted.\n\nThanks,\nJohn";
        assert_eq!(format_reply(body, &cfg(GreetingStyle::Auto), None, "John Doe"), body);
    }

    #[test]
    fn test_thanks_line_followed_by_prose_keeps_the_prose() {
        let body = "Dear Jane,\n\nThank you!\nI will look into case 123456 and get back to you within a week.";
        let out = format_reply(body, &cfg(GreetingStyle::Formal), Some("Jane Smith"), "John Doe");
        assert_eq!(
            out,
            "Dear Jane,\n\nThank you!\nI will look into case 123456 and get back to you within a week.\n\nBest regards,\nJohn Doe"
        );
    }

    #[test]
    fn test_prose_starting_with_thanks_is_not_a_signoff() {
        let out = format_reply("Thanks, noted.", &cfg(GreetingStyle::Casual), Some("Jane Smith"), "John Doe");
        assert_eq!(out, "Hi Jane,\n\nThanks, noted.\n\nBest regards,\nJohn Doe");
    }

    #[test]
    fn test_auto_is_neutral_without_title_and_formal_with_title() {
        assert_eq!(choose_greeting(&cfg(GreetingStyle::Auto), Some("Jane Smith")), "Hello,");
        assert_eq!(choose_greeting(&cfg(GreetingStyle::Auto), Some("Dr. Lars Hansen")), "Dear Dr. Lars Hansen,");
    }

    #[test]
    fn test_unknown_sender_gets_neutral_greeting() {
        assert_eq!(choose_greeting(&cfg(GreetingStyle::Formal), None), "Hello,");
    }

    #[test]
    fn test_danish_catalog() {
        let c = ReplyFormatConfig {
            language: Language::Da,
            greeting_style: GreetingStyle::Formal,
            ..ReplyFormatConfig::default()
        };
        let out = format_reply("Tak for opdateringen.", &c, Some("Mette Nielsen"), "Jens Hansen");
        assert_eq!(out, "Kære Mette,\n\nTak for opdateringen.\n\nMed venlig hilsen,\nJens Hansen");
    }

    #[test]
    fn test_blank_line_counts_are_honoured() {
        let c = ReplyFormatConfig {
            greeting_style: GreetingStyle::Casual,
            blank_lines_after_greeting: 0,
            blank_lines_before_signoff: 2,
            ..ReplyFormatConfig::default()
        };
        let out = format_reply("Noted.", &c, Some("Jane"), "John");
        assert_eq!(out, "Hi Jane,\nNoted.\n\n\nBest regards,\nJohn");
    }
}
