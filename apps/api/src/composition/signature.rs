//! Sender name extraction from an email's closing signature.
//!
//! Best effort: returns `None` when no plausible name is found. Callers treat
//! `None` as "unknown" and must not invent a name.

use crate::composition::catalog::{all_greeting_openers, all_signoff_markers, match_signoff, starts_with_greeting};

/// Only the tail of the body is searched for a signature.
const SIGNATURE_WINDOW_LINES: usize = 6;
/// Tokens allowed in a name found after a sign-off (a title may precede it).
const MAX_NAME_TOKENS: usize = 4;
/// Tokens allowed in a bare trailing-line name (no sign-off seen).
const MAX_TRAILING_NAME_TOKENS: usize = 3;

const TITLES: &[&str] = &["mr.", "mrs.", "ms.", "dr.", "prof.", "hr.", "fru", "mr", "mrs", "ms", "dr", "prof"];
const NAME_PARTICLES: &[&str] = &["van", "von", "de", "der", "den", "la", "le", "af", "da", "di"];

/// Returns the probable sender name from the body's signature block.
pub fn extract_sender_name(body: &str) -> Option<String> {
    let lines: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return None;
    }

    let window = &lines[lines.len().saturating_sub(SIGNATURE_WINDOW_LINES)..];
    let segments: Vec<&str> = window.iter().flat_map(|l| sentence_segments(l)).collect();
    let markers = all_signoff_markers();

    // Bottom-up: the last sign-off in the window is the signature.
    for (idx, segment) in segments.iter().enumerate().rev() {
        let Some(rest) = match_signoff(segment, &markers) else {
            continue;
        };
        let inline = rest.trim_start_matches(|c: char| !c.is_alphanumeric()).trim();
        let candidate = if inline.is_empty() {
            match segments.get(idx + 1) {
                Some(next) => *next,
                None => continue,
            }
        } else {
            inline
        };
        if let Some(name) = clean_name(candidate, MAX_NAME_TOKENS) {
            return Some(name);
        }
    }

    trailing_line_name(lines[lines.len() - 1])
}

/// Fallback: a last line that looks like nothing but a name.
fn trailing_line_name(line: &str) -> Option<String> {
    if line.ends_with(['.', '!', '?', ':', ';']) {
        return None;
    }
    if starts_with_greeting(line, &all_greeting_openers())
        || match_signoff(line, &all_signoff_markers()).is_some()
    {
        return None;
    }
    clean_name(line, MAX_TRAILING_NAME_TOKENS)
}

/// Validates and tidies a name candidate: strips `<address>` parts and trailing
/// signature noise, rejects anything with digits or `@`, and requires every
/// token to be capitalised (name particles such as "van" excepted).
pub(crate) fn clean_name(raw: &str, max_tokens: usize) -> Option<String> {
    let head = raw
        .split(['<', '|', '(', '/'])
        .next()
        .unwrap_or(raw)
        .trim();
    if head.is_empty() || head.contains('@') || head.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let kept: String = head
        .chars()
        .filter(|c| c.is_alphabetic() || matches!(c, ' ' | '-' | '.' | '\''))
        .collect();
    let tokens: Vec<&str> = kept
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| c == '-' || c == '\''))
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() || tokens.len() > max_tokens {
        return None;
    }

    let mut name_tokens = 0;
    for (i, token) in tokens.iter().enumerate() {
        let lower = token.to_lowercase();
        if TITLES.contains(&lower.as_str()) {
            continue;
        }
        if i > 0 && NAME_PARTICLES.contains(&lower.as_str()) {
            continue;
        }
        if !token.chars().next().is_some_and(char::is_uppercase) {
            return None;
        }
        name_tokens += 1;
    }
    if name_tokens == 0 {
        return None;
    }

    let name = tokens.join(" ");
    let name = name.trim_end_matches(['.', ',']).to_string();
    Some(name)
}

/// True when the name carries an honorific ("Dr. Hansen", "Hr. Jensen").
pub(crate) fn has_title(name: &str) -> bool {
    name.split_whitespace()
        .next()
        .is_some_and(|first| TITLES.contains(&first.to_lowercase().as_str()))
}

/// Splits a line at sentence ends so that an inline sign-off
/// ("... 30 days. Best regards, Jane Smith") starts its own segment.
/// Abbreviated titles ("Dr.") do not end a sentence.
fn sentence_segments(line: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut chars = line.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let Some(&(next_i, next_c)) = chars.peek() else {
            break;
        };
        if !next_c.is_whitespace() {
            continue;
        }
        let word_start = line[..i]
            .rfind(char::is_whitespace)
            .map(|p| p + 1)
            .unwrap_or(0);
        let word = format!("{}.", line[word_start..i].to_lowercase());
        if c == '.' && TITLES.contains(&word.as_str()) {
            continue;
        }
        // Initials ("John F. Kennedy", "J. Smith").
        let mut letters = line[word_start..i].chars();
        if c == '.' && letters.next().is_some_and(char::is_alphabetic) && letters.next().is_none() {
            continue;
        }
        let segment = line[start..next_i].trim();
        if !segment.is_empty() {
            segments.push(segment);
        }
        start = next_i;
    }
    let tail = line[start..].trim();
    if !tail.is_empty() {
        segments.push(tail);
    }
    segments
}
