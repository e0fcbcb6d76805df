use std::sync::Arc;

use crate::composition::pipeline::PipelineSettings;
use crate::llm_client::CompletionClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable completion service. Default: the Anthropic-backed `LlmClient`.
    pub completion: Arc<dyn CompletionClient>,
    pub settings: PipelineSettings,
}
