// Shared prompt fragments used by every completion request.
// Each composition mode keeps its own templates in composition::prompts.

/// Output contract appended to every system instruction.
pub const JSON_DRAFT_CONTRACT: &str = "OUTPUT: Return a single JSON object with exactly two string \
    fields, \"subject\" and \"body\". \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Point-of-view rule shared by reply and new-email drafting.
pub const RECIPIENT_POV_RULE: &str = "Write in the first person ('I' or 'we') as the person \
    sending THIS draft. Never speak as, or sign as, anyone else.";
