use std::sync::Arc;

use super::{ToolErrorKind, ToolOutcome};
use crate::backend::{BackendError, GenerateRequest, GenerativeBackend};

/// General-purpose fallback: forwards the question to the generative backend.
pub struct LlmTool {
    backend: Arc<dyn GenerativeBackend>,
}

impl LlmTool {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }

    pub async fn execute(&self, question: &str) -> ToolOutcome {
        match self.backend.generate(GenerateRequest::text(question)).await {
            Ok(response) => {
                let text = response.text.unwrap_or_default();
                let text = text.trim();
                if text.is_empty() {
                    ToolOutcome::failure(
                        ToolErrorKind::EmptyResponse,
                        "the language model returned no text",
                    )
                } else {
                    ToolOutcome::Success(text.to_string())
                }
            }
            Err(BackendError::MissingApiKey) => ToolOutcome::failure(
                ToolErrorKind::MissingCredential,
                "GOOGLE_API_KEY is not configured",
            ),
            Err(e) => {
                log::warn!("LLM answer failed: {}", e);
                ToolOutcome::failure(
                    ToolErrorKind::UpstreamUnavailable,
                    format!("language model {}", e),
                )
            }
        }
    }
}
