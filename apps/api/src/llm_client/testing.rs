//! Scripted `CompletionClient` for tests. Never touches the network.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CompletionClient, ServiceError};

/// Replays a fixed script of responses. When the script runs out, the last
/// response is repeated. Every request is recorded.
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<String, ServiceError>>>,
    fallback: Mutex<Option<String>>,
    requests: Mutex<Vec<(String, String)>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Result<String, ServiceError>>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            fallback: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answers with `text`.
    pub fn always(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// `(system_instructions, user_instructions)` per call, in order.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        system_instructions: &str,
        user_instructions: &str,
    ) -> Result<String, ServiceError> {
        self.requests
            .lock()
            .unwrap()
            .push((system_instructions.to_string(), user_instructions.to_string()));

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => {
                *self.fallback.lock().unwrap() = Some(text.clone());
                Ok(text)
            }
            Some(Err(e)) => Err(e),
            None => self
                .fallback
                .lock()
                .unwrap()
                .clone()
                .ok_or(ServiceError::EmptyContent),
        }
    }
}
