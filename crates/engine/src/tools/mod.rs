pub mod llm;
pub mod math;
pub mod weather;

use std::fmt;
use std::sync::Arc;

use switchboard_shared::ToolId;

use crate::backend::GenerativeBackend;
pub use llm::LlmTool;
pub use math::MathTool;
pub use weather::{CurrentConditions, OpenWeatherClient, WeatherError, WeatherProvider, WeatherTool};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    InvalidExpression,
    DivisionByZero,
    LocationNotFound,
    UpstreamUnavailable,
    EmptyResponse,
    MissingCredential,
}

impl fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ToolErrorKind::InvalidExpression => "Invalid expression",
            ToolErrorKind::DivisionByZero => "Division by zero",
            ToolErrorKind::LocationNotFound => "Location not found",
            ToolErrorKind::UpstreamUnavailable => "Upstream unavailable",
            ToolErrorKind::EmptyResponse => "Empty response",
            ToolErrorKind::MissingCredential => "Missing credential",
        })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// The normalized result of exactly one tool execution.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success(String),
    Failure(ToolError),
}

impl ToolOutcome {
    pub fn failure(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        ToolOutcome::Failure(ToolError::new(kind, message))
    }
}

/// Arguments pulled out of a query for the chosen tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolArgs {
    Math { expression: String },
    Weather { location: String },
    Llm { question: String },
}

impl ToolArgs {
    pub fn tool(&self) -> ToolId {
        match self {
            ToolArgs::Math { .. } => ToolId::Math,
            ToolArgs::Weather { .. } => ToolId::Weather,
            ToolArgs::Llm { .. } => ToolId::Llm,
        }
    }
}

/// The fixed set of tool handlers, built once per process.
pub struct Toolbelt {
    math: MathTool,
    weather: WeatherTool,
    llm: LlmTool,
}

impl Toolbelt {
    pub fn new(backend: Arc<dyn GenerativeBackend>, weather: Arc<dyn WeatherProvider>) -> Self {
        Self {
            math: MathTool,
            weather: WeatherTool::new(weather),
            llm: LlmTool::new(backend),
        }
    }

    pub async fn execute(&self, args: &ToolArgs) -> ToolOutcome {
        match args {
            ToolArgs::Math { expression } => self.math.execute(expression),
            ToolArgs::Weather { location } => self.weather.execute(location).await,
            ToolArgs::Llm { question } => self.llm.execute(question).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_display() {
        let err = ToolError::new(ToolErrorKind::DivisionByZero, "division by zero is not allowed");
        assert_eq!(err.to_string(), "Division by zero: division by zero is not allowed");
    }

    #[test]
    fn test_tool_args_tool() {
        let args = ToolArgs::Weather {
            location: "Paris".to_string(),
        };
        assert_eq!(args.tool(), ToolId::Weather);
    }
}
