use serde::{Deserialize, Serialize};

/// The email being replied to. Read-only input to the composition pipeline.
///
/// Field names on the wire follow the add-in payload (`incoming_*`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncomingEmail {
    #[serde(rename = "incoming_sender_name", default)]
    pub sender_display_name: Option<String>,
    /// Informational only; never used for name resolution.
    #[serde(rename = "incoming_sender_email", default)]
    pub sender_email: Option<String>,
    #[serde(rename = "incoming_subject", default)]
    pub subject: String,
    #[serde(rename = "incoming_body")]
    pub body: String,
}

/// A parsed candidate draft. Only the accepted one leaves the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftReply {
    pub subject: String,
    pub body: String,
}
