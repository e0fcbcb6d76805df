//! Prompt envelope construction.
//!
//! An envelope is built fresh for every attempt. A retry gets a new envelope with
//! the accumulated correction directives appended; the earlier one is never touched.

use serde::Serialize;

use crate::composition::catalog::catalog;
use crate::composition::prompts::{
    CORRECTIONS_HEADING, DEFAULT_TONE, EXTRA_NOTES_HEADING, MIRRORING_HEADING, NEW_EMAIL_PROMPT_TEMPLATE,
    NEW_EMAIL_SYSTEM_TEMPLATE, PARROTING_DIRECTIVE, REPLY_PROMPT_TEMPLATE, REPLY_SYSTEM_TEMPLATE,
    SIGNED_AS_SENDER_DIRECTIVE,
};
use crate::composition::quality_gate::GateFlag;
use crate::llm_client::prompts::{JSON_DRAFT_CONTRACT, RECIPIENT_POV_RULE};
use crate::models::format::{Language, SignOffStyle};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptEnvelope {
    pub system_instructions: String,
    pub user_instructions: String,
}

/// Everything the reply prompt is built from.
#[derive(Debug, Clone)]
pub struct ReplyPromptInputs<'a> {
    pub recipient_name: &'a str,
    pub sender_name_hint: Option<&'a str>,
    pub incoming_subject: &'a str,
    pub incoming_body: &'a str,
    pub tone_instructions: Option<&'a str>,
    pub extra_instructions: Option<&'a str>,
    pub mirroring_hint: &'a str,
    pub language: Language,
}

/// Builds the reply envelope. `retry_reasons` is empty on the first attempt and
/// holds one flag per failure class seen so far on retries.
pub fn build_reply_envelope(inputs: &ReplyPromptInputs<'_>, retry_reasons: &[GateFlag]) -> PromptEnvelope {
    let lang = catalog(inputs.language);
    let recipient = non_blank(Some(inputs.recipient_name)).unwrap_or("[recipient name]");
    let sender = non_blank(inputs.sender_name_hint);

    let sender_clause = sender.map(|s| format!(" ({s})")).unwrap_or_default();
    let corrections = render_corrections(retry_reasons, recipient);

    let system_instructions = fill_template(
        REPLY_SYSTEM_TEMPLATE,
        &[
            ("recipient_name", recipient),
            ("sender_clause", sender_clause.as_str()),
            ("language_name", lang.prompt_name),
            ("pov_rule", RECIPIENT_POV_RULE),
            ("output_contract", JSON_DRAFT_CONTRACT),
            ("corrections", corrections.as_str()),
        ],
    );

    let signoff_example = format!("{} {}", lang.signoff_phrase(SignOffStyle::BestRegards), recipient);
    let extra_notes = non_blank(inputs.extra_instructions)
        .map(|notes| format!("{EXTRA_NOTES_HEADING}{notes}"))
        .unwrap_or_default();
    let mirroring = non_blank(Some(inputs.mirroring_hint))
        .map(|hint| format!("{MIRRORING_HEADING}{hint}"))
        .unwrap_or_default();

    let user_instructions = fill_template(
        REPLY_PROMPT_TEMPLATE,
        &[
            ("recipient_name", recipient),
            ("language_name", lang.prompt_name),
            ("empathy_example", lang.empathy_example),
            ("sender_ref", sender.unwrap_or("(the sender)")),
            ("incoming_subject", non_blank(Some(inputs.incoming_subject)).unwrap_or("[no subject]")),
            ("tone", non_blank(inputs.tone_instructions).unwrap_or(DEFAULT_TONE)),
            ("signoff_example", signoff_example.as_str()),
            ("extra_notes", extra_notes.as_str()),
            ("mirroring", mirroring.as_str()),
            ("incoming_body", non_blank(Some(inputs.incoming_body)).unwrap_or("[no body]")),
        ],
    );

    PromptEnvelope {
        system_instructions,
        user_instructions,
    }
}

/// Envelope for drafting a fresh email from a topic description.
pub fn build_new_email_envelope(
    recipient_address: Option<&str>,
    subject_line: Option<&str>,
    topic: &str,
    language: Language,
) -> PromptEnvelope {
    let lang = catalog(language);
    let system_instructions = fill_template(
        NEW_EMAIL_SYSTEM_TEMPLATE,
        &[
            ("pov_rule", RECIPIENT_POV_RULE),
            ("language_name", lang.prompt_name),
            ("output_contract", JSON_DRAFT_CONTRACT),
        ],
    );
    let subject_hint = non_blank(subject_line)
        .map(|s| format!("Use this subject line: {s}"))
        .unwrap_or_default();
    let user_instructions = fill_template(
        NEW_EMAIL_PROMPT_TEMPLATE,
        &[
            ("recipient", non_blank(recipient_address).unwrap_or("[recipient]")),
            ("subject_hint", subject_hint.as_str()),
            ("topic", topic.trim()),
        ],
    );
    PromptEnvelope {
        system_instructions,
        user_instructions,
    }
}

pub fn retry_directive(flag: &GateFlag, recipient_name: &str) -> String {
    match flag {
        GateFlag::Parroting { .. } => PARROTING_DIRECTIVE.to_string(),
        GateFlag::SignedAsSender { sender_name } => fill_template(
            SIGNED_AS_SENDER_DIRECTIVE,
            &[("sender_name", sender_name.as_str()), ("recipient_name", recipient_name)],
        ),
    }
}

fn render_corrections(retry_reasons: &[GateFlag], recipient_name: &str) -> String {
    if retry_reasons.is_empty() {
        return String::new();
    }
    let mut out = CORRECTIONS_HEADING.to_string();
    for flag in retry_reasons {
        out.push_str("\n- ");
        out.push_str(&retry_directive(flag, recipient_name));
    }
    out
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Single-pass `{key}` substitution. Values are inserted verbatim and never
/// re-scanned, so email text containing `{...}` cannot expand placeholders.
/// Unknown braces (the JSON schema example) pass through untouched.
fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + vars.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substituted = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (*value, close))
        });
        match substituted {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
