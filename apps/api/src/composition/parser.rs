//! Response parsing — raw completion text to a `{subject, body}` draft.
//!
//! Strict path: the text (minus code fences or surrounding prose) is one JSON
//! object. Fallback path: `subject:` / `body:` labelled text. Neither yielding a
//! non-empty body is a `ParseError`.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::llm_client::strip_json_fences;
use crate::models::email::DraftReply;

const PREVIEW_CHARS: usize = 80;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("completion did not contain a draft body (starts with {preview:?})")]
    NoDraft { preview: String },
}

#[derive(Debug, Deserialize)]
struct RawDraft {
    #[serde(default, alias = "Subject")]
    subject: Option<String>,
    #[serde(default, alias = "Body")]
    body: Option<String>,
}

fn re_subject_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)^[ \t>*_#]*subject[ \t*_]*:[ \t]*(.*)$").expect("subject label regex"))
}

fn re_body_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?ims)^[ \t>*_#]*body[ \t*_]*:[ \t]*(.*)").expect("body label regex"))
}

pub fn parse_draft(raw: &str) -> Result<DraftReply, ParseError> {
    if let Some(draft) = parse_json_draft(raw) {
        return Ok(draft);
    }
    parse_labelled_draft(raw).ok_or_else(|| ParseError::NoDraft {
        preview: raw.trim().chars().take(PREVIEW_CHARS).collect(),
    })
}

fn parse_json_draft(raw: &str) -> Option<DraftReply> {
    let text = strip_json_fences(raw);
    let parsed = serde_json::from_str::<RawDraft>(text).ok().or_else(|| {
        // Prose around the object: take the outermost braces.
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        if end <= start {
            return None;
        }
        serde_json::from_str::<RawDraft>(&text[start..=end]).ok()
    })?;

    let body = parsed.body.map(|b| b.trim().to_string()).unwrap_or_default();
    if body.is_empty() {
        return None;
    }
    Some(DraftReply {
        subject: parsed.subject.map(|s| s.trim().to_string()).unwrap_or_default(),
        body,
    })
}

fn parse_labelled_draft(raw: &str) -> Option<DraftReply> {
    let text = strip_json_fences(raw);
    let body_caps = re_body_label().captures(text)?;
    let body = body_caps.get(1)?.as_str().trim().trim_matches(['"', '*']).trim();
    if body.is_empty() {
        return None;
    }
    let subject = re_subject_label()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().trim_matches(['"', '*']).trim().to_string())
        .unwrap_or_default();
    Some(DraftReply {
        subject,
        body: body.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_json() {
        let draft = parse_draft(r#"{"subject": "Re: Order", "body": "Thanks.\nJohn"}"#).unwrap();
        assert_eq!(draft.subject, "Re: Order");
        assert_eq!(draft.body, "Thanks.\nJohn");
    }

    #[test]
    fn test_json_in_code_fence() {
        let raw = "```json\n{\"subject\": \"Hi\", \"body\": \"Noted.\"}\n```";
        assert_eq!(parse_draft(raw).unwrap().body, "Noted.");
    }

    #[test]
    fn test_json_with_surrounding_prose() {
        let raw = "Here is the reply:\n{\"subject\": \"Hi\", \"body\": \"Noted.\"}\nHope this helps!";
        let draft = parse_draft(raw).unwrap();
        assert_eq!(draft.subject, "Hi");
        assert_eq!(draft.body, "Noted.");
    }

    #[test]
    fn test_capitalised_keys_accepted() {
        let draft = parse_draft(r#"{"Subject": "Hi", "Body": "Noted."}"#).unwrap();
        assert_eq!(draft.subject, "Hi");
    }

    #[test]
    fn test_missing_subject_is_empty_not_error() {
        let draft = parse_draft(r#"{"body": "Noted."}"#).unwrap();
        assert_eq!(draft.subject, "");
    }

    #[test]
    fn test_labelled_fallback() {
        let raw = "Subject: Re: Your order\nBody: Thanks for the update.\n\nBest regards,\nJohn Doe";
        let draft = parse_draft(raw).unwrap();
        assert_eq!(draft.subject, "Re: Your order");
        assert_eq!(draft.body, "Thanks for the update.\n\nBest regards,\nJohn Doe");
    }

    #[test]
    fn test_labelled_fallback_with_markdown_bold() {
        let raw = "**Subject:** Update\n**Body:**\nAll good here.";
        let draft = parse_draft(raw).unwrap();
        assert_eq!(draft.subject, "Update");
        assert_eq!(draft.body, "All good here.");
    }

    #[test]
    fn test_json_with_empty_body_falls_through_to_error() {
        let err = parse_draft(r#"{"subject": "Hi", "body": "  "}"#).unwrap_err();
        assert!(matches!(err, ParseError::NoDraft { .. }));
    }

    #[test]
    fn test_unintelligible_text_is_parse_error() {
        let err = parse_draft("I'm sorry, I can't help with that.").unwrap_err();
        assert_eq!(
            err,
            ParseError::NoDraft {
                preview: "I'm sorry, I can't help with that.".into()
            }
        );
    }
}
