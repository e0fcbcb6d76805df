//! Reply composition pipeline.
//!
//! Flow: resolve sender → extract facts → mirroring hint → envelope →
//!       complete → parse → quality gate (retry with directives) → format.
//!
//! The gate loop is bounded by `PipelineSettings::max_attempts`. Exhausting it
//! still delivers the last draft, flagged as unsatisfied. Only a `ServiceError`
//! or a run where no attempt could be parsed fails the request.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::composition::envelope::{build_new_email_envelope, build_reply_envelope, ReplyPromptInputs};
use crate::composition::facts::extract_facts;
use crate::composition::formatter::format_reply;
use crate::composition::mirroring::build_mirroring_hint;
use crate::composition::parser::{parse_draft, ParseError};
use crate::composition::quality_gate::{evaluate, GateFlag, ParrotingThresholds};
use crate::composition::signature::extract_sender_name;
use crate::llm_client::{CompletionClient, ServiceError};
use crate::models::email::{DraftReply, IncomingEmail};
use crate::models::format::{Language, ReplyFormatConfig};

const ORIGINAL_MESSAGE_SEPARATOR: &str = "--- Original message ---";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    /// Total completion attempts per reply, first attempt included.
    pub max_attempts: u32,
    pub thresholds: ParrotingThresholds,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            thresholds: ParrotingThresholds::default(),
        }
    }
}

fn default_recipient() -> String {
    "User".to_string()
}

/// Request body for reply mode.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplyRequest {
    #[serde(flatten)]
    pub incoming: IncomingEmail,
    #[serde(default = "default_recipient")]
    pub recipient_display_name: String,
    #[serde(default, alias = "tone_instructions")]
    pub tone: Option<String>,
    #[serde(default, alias = "extra_instructions")]
    pub extra: Option<String>,
    #[serde(flatten)]
    pub format: ReplyFormatConfig,
    #[serde(default)]
    pub include_original: bool,
}

/// Request body for new-email mode.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEmailRequest {
    #[serde(default)]
    pub recipient_address: Option<String>,
    #[serde(default)]
    pub subject_line: Option<String>,
    pub topic_description: String,
    #[serde(default)]
    pub language: Language,
}

/// The formatted reply plus how the gate loop ended.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedReply {
    pub subject: String,
    pub body: String,
    /// False when the attempt bound ran out with flags still raised.
    pub gate_satisfied: bool,
    pub attempts: u32,
    /// Flags raised against the delivered draft.
    pub unresolved: Vec<GateFlag>,
}

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Sender name for greetings and attribution checks.
///
/// A usable display name wins; otherwise the body's signature is consulted.
/// `None` means unknown.
pub fn resolve_sender_name(incoming: &IncomingEmail) -> Option<String> {
    incoming
        .sender_display_name
        .as_deref()
        .and_then(refine_display_name)
        .or_else(|| extract_sender_name(&incoming.body))
}

/// `"Smith, Jane" <jane@acme.com>` → `Jane Smith`. Bare addresses are rejected.
fn refine_display_name(raw: &str) -> Option<String> {
    let head = raw.split('<').next().unwrap_or(raw);
    let unquoted = head.trim().trim_matches(['"', '\'']).trim();
    if unquoted.is_empty() || unquoted.contains('@') {
        return None;
    }
    let reordered = match unquoted.split_once(',') {
        Some((last, first)) if !last.trim().is_empty() && !first.trim().is_empty() => {
            format!("{} {}", first.trim(), last.trim())
        }
        _ => unquoted.to_string(),
    };
    Some(reordered.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Runs the full reply pipeline against `client`.
pub async fn compose_reply(
    client: &dyn CompletionClient,
    request: &ReplyRequest,
    settings: &PipelineSettings,
) -> Result<ComposedReply, ComposeError> {
    let incoming = &request.incoming;
    let recipient_name = request.recipient_display_name.trim();
    let sender_name = resolve_sender_name(incoming);

    let facts = extract_facts(&incoming.body);
    debug!(
        "Extracted facts: {} case ids, {} day windows, email updates: {}",
        facts.case_ids.len(),
        facts.day_windows.len(),
        facts.email_updates_promised
    );
    let mirroring_hint = build_mirroring_hint(&facts);

    let inputs = ReplyPromptInputs {
        recipient_name,
        sender_name_hint: sender_name.as_deref(),
        incoming_subject: &incoming.subject,
        incoming_body: &incoming.body,
        tone_instructions: request.tone.as_deref(),
        extra_instructions: request.extra.as_deref(),
        mirroring_hint: &mirroring_hint,
        language: request.format.language,
    };

    let max_attempts = settings.max_attempts.max(1);
    let mut retry_reasons: Vec<GateFlag> = Vec::new();
    let mut last_draft: Option<(DraftReply, Vec<GateFlag>)> = None;
    let mut last_parse_error: Option<ParseError> = None;
    let mut attempts = 0;
    let mut accepted = false;

    while attempts < max_attempts {
        attempts += 1;
        info!("Reply attempt {}/{}", attempts, max_attempts);

        let envelope = build_reply_envelope(&inputs, &retry_reasons);
        let raw = client
            .complete(&envelope.system_instructions, &envelope.user_instructions)
            .await?;

        let draft = match parse_draft(&raw) {
            Ok(draft) => draft,
            Err(e) => {
                warn!("Reply attempt {}/{}: {}", attempts, max_attempts, e);
                last_parse_error = Some(e);
                continue;
            }
        };

        let flags = evaluate(
            &draft.body,
            &incoming.body,
            sender_name.as_deref(),
            recipient_name,
            &settings.thresholds,
        );
        if flags.is_empty() {
            last_draft = Some((draft, flags));
            accepted = true;
            break;
        }

        for flag in &flags {
            warn!("Reply attempt {}/{}: {}", attempts, max_attempts, flag.describe());
            if !retry_reasons.iter().any(|seen| seen.same_kind(flag)) {
                retry_reasons.push(flag.clone());
            }
        }
        last_draft = Some((draft, flags));
    }

    let Some((draft, unresolved)) = last_draft else {
        return Err(last_parse_error
            .unwrap_or_else(|| ParseError::NoDraft {
                preview: String::new(),
            })
            .into());
    };

    if accepted {
        info!("Reply accepted after {} attempt(s)", attempts);
    } else {
        warn!(
            "Reply gate not satisfied after {} attempts; delivering last draft",
            attempts
        );
    }

    let subject = reply_subject(&draft.subject, &incoming.subject);
    let mut body = format_reply(&draft.body, &request.format, sender_name.as_deref(), recipient_name);
    if request.include_original {
        body = append_original(&body, &incoming.body);
    }

    Ok(ComposedReply {
        subject,
        body,
        gate_satisfied: accepted,
        attempts,
        unresolved,
    })
}

/// Drafts a fresh email from a topic description. One attempt, no gate.
pub async fn compose_new_email(
    client: &dyn CompletionClient,
    request: &NewEmailRequest,
) -> Result<DraftReply, ComposeError> {
    let envelope = build_new_email_envelope(
        request.recipient_address.as_deref(),
        request.subject_line.as_deref(),
        &request.topic_description,
        request.language,
    );
    let raw = client
        .complete(&envelope.system_instructions, &envelope.user_instructions)
        .await?;
    let mut draft = parse_draft(&raw)?;

    if draft.subject.is_empty() {
        if let Some(subject) = request.subject_line.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            draft.subject = subject.to_string();
        }
    }
    info!("New email drafted");
    Ok(draft)
}

/// The draft's subject, or `Re: <incoming>` when the model left it blank.
fn reply_subject(draft_subject: &str, incoming_subject: &str) -> String {
    let draft_subject = draft_subject.trim();
    if !draft_subject.is_empty() {
        return draft_subject.to_string();
    }
    let incoming_subject = incoming_subject.trim();
    let already_reply = incoming_subject
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("re:"));
    if already_reply {
        incoming_subject.to_string()
    } else if incoming_subject.is_empty() {
        "Re:".to_string()
    } else {
        format!("Re: {incoming_subject}")
    }
}

fn append_original(body: &str, incoming_body: &str) -> String {
    format!(
        "{}\n\n{}\n{}",
        body.trim_end(),
        ORIGINAL_MESSAGE_SEPARATOR,
        incoming_body.trim()
    )
}
