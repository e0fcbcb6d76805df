use serde::{Deserialize, Serialize};

/// Reply language. Drives the greeting/sign-off catalog and the prompt's target language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Da,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Da];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GreetingStyle {
    /// Resolved at format time: NEUTRAL unless the sender carries a title.
    #[default]
    Auto,
    Formal,
    Neutral,
    Casual,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignOffStyle {
    #[default]
    BestRegards,
    KindRegards,
    Regards,
    Cheers,
    Thanks,
}

/// Per-request formatting preferences. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyFormatConfig {
    pub language: Language,
    pub greeting_style: GreetingStyle,
    pub signoff_style: SignOffStyle,
    pub blank_lines_after_greeting: usize,
    pub blank_lines_before_signoff: usize,
}

impl Default for ReplyFormatConfig {
    fn default() -> Self {
        Self {
            language: Language::En,
            greeting_style: GreetingStyle::Auto,
            signoff_style: SignOffStyle::BestRegards,
            blank_lines_after_greeting: 1,
            blank_lines_before_signoff: 1,
        }
    }
}
