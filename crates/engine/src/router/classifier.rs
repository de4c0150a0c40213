use serde_json::{json, Value};
use std::sync::Arc;
use switchboard_shared::{get_tools, FunctionDeclaration, ToolId};

use crate::backend::{BackendError, GenerateRequest, GenerativeBackend};

/// Declared alongside the tools so the backend has a way to refuse.
pub const UNROUTABLE: &str = "unroutable";

const INSTRUCTIONS: &str = "You route user requests to exactly one tool. \
    Call `math` for arithmetic calculations, passing only the bare expression. \
    Call `weather` for questions about current weather, passing only the place name. \
    Call `llm` for every other question, passing the question unchanged. \
    If the request mixes several of these in a way no single tool can answer, \
    or cannot be understood at all, call `unroutable` with a short reason. \
    Never answer the request yourself.";

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub tool: ToolId,
    pub arguments: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error("{0}")]
    Unroutable(String),

    #[error("{0}")]
    Upstream(String),

    #[error("generative backend API key is not configured")]
    MissingCredential,
}

fn unroutable_declaration() -> FunctionDeclaration {
    FunctionDeclaration {
        name: UNROUTABLE.to_string(),
        description: "Use when no single tool can serve the request.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "reason": {
                    "type": "string",
                    "description": "Why the request cannot be routed"
                }
            },
            "required": ["reason"]
        }),
    }
}

/// Picks the one tool that should serve a query.
pub struct IntentClassifier {
    backend: Arc<dyn GenerativeBackend>,
    declarations: Vec<FunctionDeclaration>,
}

impl IntentClassifier {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        let mut declarations = get_tools();
        declarations.push(unroutable_declaration());
        Self {
            backend,
            declarations,
        }
    }

    pub async fn classify(&self, query: &str) -> Result<Classification, ClassificationError> {
        let request = GenerateRequest {
            system: Some(INSTRUCTIONS.to_string()),
            prompt: query.to_string(),
            functions: self.declarations.clone(),
            force_function_call: true,
        };

        let response = self.backend.generate(request).await.map_err(|e| match e {
            BackendError::MissingApiKey => ClassificationError::MissingCredential,
            other => ClassificationError::Upstream(other.to_string()),
        })?;

        let call = response.function_call.ok_or_else(|| {
            ClassificationError::Unroutable("the classifier did not choose a tool".to_string())
        })?;

        if call.name == UNROUTABLE {
            let reason = call.arguments["reason"]
                .as_str()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .unwrap_or("the query does not match any single tool");
            return Err(ClassificationError::Unroutable(reason.to_string()));
        }

        let tool = ToolId::from_name(&call.name).ok_or_else(|| {
            ClassificationError::Unroutable(format!(
                "the classifier chose an unknown tool '{}'",
                call.name
            ))
        })?;

        Ok(Classification {
            tool,
            arguments: call.arguments,
        })
    }
}
