use switchboard_shared::{RoutedResponse, ToolId, ToolUsed};

use super::classifier::ClassificationError;
use super::extractor::ExtractionError;
use crate::tools::ToolError;

/// Why a request ended in the `Failed` state. Rendered into the response
/// `result` rather than surfaced as a transport error.
#[derive(Debug, thiserror::Error)]
pub enum DispatchFailure {
    #[error("Unable to route query: {0}")]
    Unroutable(String),

    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("{source}")]
    Extraction {
        tool: ToolId,
        source: ExtractionError,
    },

    #[error("{source}")]
    Execution { tool: ToolId, source: ToolError },
}

impl DispatchFailure {
    /// Best-known tool at the point of failure.
    pub fn tool_used(&self) -> ToolUsed {
        match self {
            DispatchFailure::Unroutable(_) | DispatchFailure::ClassifierUnavailable(_) => {
                ToolUsed::Unknown
            }
            DispatchFailure::Extraction { tool, .. } | DispatchFailure::Execution { tool, .. } => {
                ToolUsed::from(*tool)
            }
        }
    }
}

impl From<ClassificationError> for DispatchFailure {
    fn from(e: ClassificationError) -> Self {
        match e {
            ClassificationError::Unroutable(reason) => DispatchFailure::Unroutable(reason),
            other => DispatchFailure::ClassifierUnavailable(other.to_string()),
        }
    }
}

pub fn completed(query: &str, tool: ToolId, result: String) -> RoutedResponse {
    RoutedResponse {
        query: query.to_string(),
        tool_used: tool.into(),
        result,
    }
}

pub fn failed(query: &str, failure: &DispatchFailure) -> RoutedResponse {
    RoutedResponse {
        query: query.to_string(),
        tool_used: failure.tool_used(),
        result: failure.to_string(),
    }
}

/// One newline-terminated JSON line, the whole streamed body.
pub fn to_chunk(response: &RoutedResponse) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(response)?;
    line.push('\n');
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolErrorKind;

    #[test]
    fn test_success_response() {
        let response = completed("What's 42 * 6?", ToolId::Math, "252".into());
        assert_eq!(response.query, "What's 42 * 6?");
        assert_eq!(response.tool_used, ToolUsed::Math);
        assert_eq!(response.result, "252");
    }

    #[test]
    fn test_tool_failure_keeps_tool() {
        let failure = DispatchFailure::Execution {
            tool: ToolId::Math,
            source: ToolError::new(
                ToolErrorKind::DivisionByZero,
                "division by zero is not allowed",
            ),
        };
        let response = failed("10 / 0", &failure);
        assert_eq!(response.tool_used, ToolUsed::Math);
        assert_eq!(response.result, "Division by zero: division by zero is not allowed");
    }

    #[test]
    fn test_classification_failures_are_unknown() {
        let failure = DispatchFailure::from(ClassificationError::Unroutable("ambiguous".into()));
        let response = failed("q", &failure);
        assert_eq!(response.tool_used, ToolUsed::Unknown);
        assert_eq!(response.result, "Unable to route query: ambiguous");

        let failure = DispatchFailure::from(ClassificationError::MissingCredential);
        assert_eq!(
            failed("q", &failure).result,
            "Classifier unavailable: generative backend API key is not configured"
        );
    }

    #[test]
    fn test_extraction_failure_message() {
        let failure = DispatchFailure::Extraction {
            tool: ToolId::Weather,
            source: ExtractionError::MissingLocation,
        };
        let response = failed("weather?", &failure);
        assert_eq!(response.tool_used, ToolUsed::Weather);
        assert_eq!(response.result, "Could not determine location from query");
    }

    #[test]
    fn test_to_chunk_is_one_line() {
        let chunk = to_chunk(&completed("q", ToolId::Llm, "line one\nline two".into())).unwrap();
        assert!(chunk.ends_with('\n'));
        assert_eq!(chunk.matches('\n').count(), 1);

        let parsed: RoutedResponse = serde_json::from_str(chunk.trim_end()).unwrap();
        assert_eq!(parsed.result, "line one\nline two");
    }
}
