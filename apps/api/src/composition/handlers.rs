//! Axum route handlers for the Assist API.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::composition::pipeline::{compose_new_email, compose_reply, NewEmailRequest, ReplyRequest};
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub request_id: Uuid,
    pub subject: String,
    pub body: String,
    pub gate_satisfied: bool,
    pub attempts: u32,
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct NewEmailResponse {
    pub request_id: Uuid,
    pub subject: String,
    pub body: String,
    pub generated_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/assist/reply
///
/// Drafts a reply to the incoming email as the recipient. A draft that never
/// cleared the quality gate is still returned, with `gate_satisfied = false`.
pub async fn handle_reply(
    State(state): State<AppState>,
    Json(request): Json<ReplyRequest>,
) -> Result<Json<ReplyResponse>, AppError> {
    if request.incoming.body.trim().is_empty() {
        return Err(AppError::Validation("incoming_body cannot be empty".to_string()));
    }

    let request_id = Uuid::new_v4();
    let span = info_span!("reply", %request_id, language = ?request.format.language);

    async move {
        info!("Composing reply ({} chars of incoming body)", request.incoming.body.len());
        let reply = compose_reply(state.completion.as_ref(), &request, &state.settings).await?;

        Ok::<_, AppError>(Json(ReplyResponse {
            request_id,
            subject: reply.subject,
            body: reply.body,
            gate_satisfied: reply.gate_satisfied,
            attempts: reply.attempts,
            warnings: reply.unresolved.iter().map(|f| f.describe()).collect(),
            generated_at: Utc::now(),
        }))
    }
    .instrument(span)
    .await
}

/// POST /api/v1/assist/compose
///
/// Drafts a new email from a topic description. No quality gate.
pub async fn handle_compose(
    State(state): State<AppState>,
    Json(request): Json<NewEmailRequest>,
) -> Result<Json<NewEmailResponse>, AppError> {
    if request.topic_description.trim().is_empty() {
        return Err(AppError::Validation("topic_description cannot be empty".to_string()));
    }

    let request_id = Uuid::new_v4();
    let span = info_span!("compose", %request_id, language = ?request.language);

    async move {
        let draft = compose_new_email(state.completion.as_ref(), &request).await?;
        Ok::<_, AppError>(Json(NewEmailResponse {
            request_id,
            subject: draft.subject,
            body: draft.body,
            generated_at: Utc::now(),
        }))
    }
    .instrument(span)
    .await
}
