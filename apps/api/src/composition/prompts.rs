// Prompt templates for reply and new-email drafting.
// Cross-cutting fragments live in llm_client::prompts.

/// Reply system instruction.
/// Replace: {recipient_name}, {sender_clause}, {language_name}, {pov_rule}, {output_contract}, {corrections}
pub const REPLY_SYSTEM_TEMPLATE: &str = r#"ROLE: You are replying to an email AS the recipient, {recipient_name}. You are NOT the sender{sender_clause}.

HARD RULES:
1) Never copy phrases verbatim from the incoming email beyond short common words. Paraphrase everything you refer to.
2) Never sign the reply with the sender's name. Sign as {recipient_name}.
3) Respond only in {language_name}.
4) {pov_rule}

{output_contract}{corrections}"#;

/// Reply user instruction.
/// Replace: {recipient_name}, {language_name}, {empathy_example}, {sender_ref},
///          {incoming_subject}, {tone}, {signoff_example}, {extra_notes},
///          {mirroring}, {incoming_body} (last, so body text is never re-expanded)
pub const REPLY_PROMPT_TEMPLATE: &str = r#"ACT AS: You are writing an email REPLY as the recipient: {recipient_name}.

CRITICAL RULES:
1) DO NOT restate, translate, or quote the original message. Avoid copying phrases from it.
2) Write ONLY from the recipient's perspective.
3) NEVER sign or speak as the sender or the sender's organization.
4) Reply in {language_name}.
5) Output only a single JSON object. No extra text.

EMPATHY & MIRRORING:
- Include ONE short, natural sentence that acknowledges the most important detail(s) in your own words.
- That sentence must NOT quote or translate exact phrases.
- Example (do NOT copy; adapt to the context and language): "{empathy_example}"

REPLY OUTLINE (guidance, adapt as needed):
- Subject: 'Re: [incoming subject]' or a clear variant.
- Greeting to the sender by name if available.
- Acknowledgement sentence using the most important details.
- Next step(s): what you will do or need from them.
- Close politely.

OUTPUT SCHEMA:
{"subject": "...", "body": "..."}

REPLY REQUIREMENTS:
- Tone/Style: {tone}.
- Sign-off example: {signoff_example}{extra_notes}{mirroring}

CONTEXT (incoming email):
Sender (detected/provided): {sender_ref}
Subject: {incoming_subject}
Body:
{incoming_body}

Now produce the reply as a JSON object only."#;

pub const DEFAULT_TONE: &str = "concise and professional";

pub const EXTRA_NOTES_HEADING: &str = "\n\nADDITIONAL NOTES:\n";

pub const MIRRORING_HEADING: &str = "\n\nSALIENT FACTS (mirror in your own words, no quotes, in a single short sentence):\n";

pub const CORRECTIONS_HEADING: &str = "\n\nCORRECTIONS FROM PREVIOUS ATTEMPTS (mandatory):";

pub const PARROTING_DIRECTIVE: &str = "The previous draft repeated too much of the incoming email. \
    Paraphrase more aggressively: do not reuse any sequence of more than three words from it.";

/// Replace: {sender_name}, {recipient_name}
pub const SIGNED_AS_SENDER_DIRECTIVE: &str = "The previous draft was signed with the sender's name \
    ({sender_name}). Sign with the recipient's name ({recipient_name}) instead and write from the \
    recipient's point of view.";

/// New-email system instruction.
/// Replace: {pov_rule}, {language_name}, {output_contract}
pub const NEW_EMAIL_SYSTEM_TEMPLATE: &str = r#"ROLE: You write email DRAFTS for the person sending them.

MANDATES:
- {pov_rule}
- Keep it concise, professional, and actionable.
- Write in {language_name}.

{output_contract}"#;

/// New-email user instruction.
/// Replace: {recipient}, {subject_hint}, {topic}
pub const NEW_EMAIL_PROMPT_TEMPLATE: &str = r#"Draft a professional email to {recipient}.
{subject_hint}
The email is about:

{topic}

Include a clear subject line and a polite sign-off.

OUTPUT SCHEMA:
{"subject": "...", "body": "..."}"#;
