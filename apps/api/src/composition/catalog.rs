//! Greeting and sign-off catalogs, keyed by language and style.
//!
//! Adding a language means adding one `LanguageCatalog` and one match arm in
//! `catalog()`. Detection helpers derive their phrase lists from the same tables,
//! so anything the formatter injects is recognised on the next pass.

use crate::models::format::{GreetingStyle, Language, SignOffStyle};

/// All phrase data for one language.
#[derive(Debug)]
pub struct LanguageCatalog {
    /// Language name as written into prompts ("reply in ENGLISH").
    pub prompt_name: &'static str,
    /// `{name}` is replaced with the sender's name.
    pub greetings: &'static [(GreetingStyle, &'static str)],
    pub signoffs: &'static [(SignOffStyle, &'static str)],
    /// Closings recognised as sign-offs but never injected.
    pub extra_signoff_markers: &'static [&'static str],
    /// Openers recognised as greetings but never injected.
    pub extra_greeting_openers: &'static [&'static str],
    /// Example acknowledgement line shown to the model (to adapt, not copy).
    pub empathy_example: &'static str,
}

static ENGLISH: LanguageCatalog = LanguageCatalog {
    prompt_name: "ENGLISH",
    greetings: &[
        (GreetingStyle::Formal, "Dear {name},"),
        (GreetingStyle::Neutral, "Hello,"),
        (GreetingStyle::Casual, "Hi {name},"),
    ],
    signoffs: &[
        (SignOffStyle::BestRegards, "Best regards,"),
        (SignOffStyle::KindRegards, "Kind regards,"),
        (SignOffStyle::Regards, "Regards,"),
        (SignOffStyle::Cheers, "Cheers,"),
        (SignOffStyle::Thanks, "Thanks,"),
    ],
    extra_signoff_markers: &[
        "yours sincerely",
        "sincerely",
        "warm regards",
        "many thanks",
        "thank you",
        "all the best",
        "best wishes",
        "best",
    ],
    extra_greeting_openers: &["hey", "good morning", "good afternoon", "greetings"],
    empathy_example: "I appreciate the update on case 123456; I have noted the expected 14-30 day timeline.",
};

static DANISH: LanguageCatalog = LanguageCatalog {
    prompt_name: "DANISH",
    greetings: &[
        (GreetingStyle::Formal, "Kære {name},"),
        (GreetingStyle::Neutral, "Hej,"),
        (GreetingStyle::Casual, "Hej {name},"),
    ],
    signoffs: &[
        (SignOffStyle::BestRegards, "Med venlig hilsen,"),
        (SignOffStyle::KindRegards, "Venlig hilsen,"),
        (SignOffStyle::Regards, "Hilsen,"),
        (SignOffStyle::Cheers, "De bedste hilsner,"),
        (SignOffStyle::Thanks, "Tak,"),
    ],
    extra_signoff_markers: &["mvh", "bedste hilsner", "mange tak", "vh"],
    extra_greeting_openers: &["goddag", "godmorgen", "hejsa"],
    empathy_example: "Tak for opdateringen vedrørende sag 123456; jeg har noteret den forventede behandlingstid på ca. 14-30 dage.",
};

pub fn catalog(language: Language) -> &'static LanguageCatalog {
    match language {
        Language::En => &ENGLISH,
        Language::Da => &DANISH,
    }
}

impl LanguageCatalog {
    /// Template for a concrete style. `Auto` is resolved by the caller; here it
    /// falls back to the neutral greeting.
    pub fn greeting_template(&self, style: GreetingStyle) -> &'static str {
        let wanted = match style {
            GreetingStyle::Auto => GreetingStyle::Neutral,
            other => other,
        };
        self.greetings
            .iter()
            .find(|(s, _)| *s == wanted)
            .or_else(|| self.greetings.iter().find(|(s, _)| *s == GreetingStyle::Neutral))
            .map(|(_, t)| *t)
            .unwrap_or("Hello,")
    }

    pub fn signoff_phrase(&self, style: SignOffStyle) -> &'static str {
        self.signoffs
            .iter()
            .find(|(s, _)| *s == style)
            .map(|(_, p)| *p)
            .unwrap_or("Best regards,")
    }

    /// Lowercase greeting openers ("dear", "hello", "hi", ...), longest first.
    pub fn greeting_openers(&self) -> Vec<String> {
        let mut openers: Vec<String> = self
            .greetings
            .iter()
            .map(|(_, template)| {
                let head = template.split("{name}").next().unwrap_or(template);
                head.trim().trim_end_matches(',').trim().to_lowercase()
            })
            .chain(self.extra_greeting_openers.iter().map(|s| s.to_string()))
            .filter(|s| !s.is_empty())
            .collect();
        sort_longest_first(&mut openers);
        openers
    }

    /// Lowercase sign-off markers without trailing punctuation, longest first.
    pub fn signoff_markers(&self) -> Vec<String> {
        let mut markers: Vec<String> = self
            .signoffs
            .iter()
            .map(|(_, phrase)| phrase.trim_end_matches(',').trim().to_lowercase())
            .chain(self.extra_signoff_markers.iter().map(|s| s.to_string()))
            .collect();
        sort_longest_first(&mut markers);
        markers
    }
}

/// Sign-off markers of every supported language, longest first.
pub fn all_signoff_markers() -> Vec<String> {
    let mut markers: Vec<String> = Language::ALL
        .iter()
        .flat_map(|lang| catalog(*lang).signoff_markers())
        .collect();
    sort_longest_first(&mut markers);
    markers
}

/// Greeting openers of every supported language, longest first.
pub fn all_greeting_openers() -> Vec<String> {
    let mut openers: Vec<String> = Language::ALL
        .iter()
        .flat_map(|lang| catalog(*lang).greeting_openers())
        .collect();
    sort_longest_first(&mut openers);
    openers
}

fn sort_longest_first(items: &mut Vec<String>) {
    items.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    items.dedup();
}

/// Case-insensitive prefix strip that only matches at a word boundary, so
/// "hi" does not match "hiring" and "best" does not match "bestseller".
pub fn strip_phrase_prefix<'a>(line: &'a str, phrase: &str) -> Option<&'a str> {
    let head = line.get(..phrase.len())?;
    if !head.eq_ignore_ascii_case(phrase) && head.to_lowercase() != phrase {
        return None;
    }
    let rest = &line[phrase.len()..];
    match rest.chars().next() {
        Some(c) if c.is_alphanumeric() => None,
        _ => Some(rest),
    }
}

/// If `line` opens with one of `markers` (a sign-off such as "Best regards"),
/// returns whatever follows the marker on that line.
///
/// A marker only counts when it stands alone, is followed by punctuation, or is
/// followed by a capitalised word (an inline name: "Best regards Jane").
/// "Thanks for the update" is therefore not a sign-off.
pub fn match_signoff<'a>(line: &'a str, markers: &[String]) -> Option<&'a str> {
    let line = line.trim();
    for marker in markers {
        let Some(rest) = strip_phrase_prefix(line, marker) else {
            continue;
        };
        let after = rest.trim_start();
        match after.chars().next() {
            None => return Some(""),
            Some(c) if c.is_uppercase() || matches!(c, ',' | ';' | ':' | '!' | '.' | '-' | '–' | '—') => {
                return Some(rest)
            }
            _ => continue,
        }
    }
    None
}

/// True when the line opens with one of `openers`.
pub fn starts_with_greeting(line: &str, openers: &[String]) -> bool {
    let line = line.trim();
    openers
        .iter()
        .any(|opener| strip_phrase_prefix(line, opener).is_some())
}
