use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of tools a query can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolId {
    Math,
    Weather,
    Llm,
}

impl ToolId {
    pub fn all() -> &'static [ToolId] {
        &[ToolId::Math, ToolId::Weather, ToolId::Llm]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolId::Math => "math",
            ToolId::Weather => "weather",
            ToolId::Llm => "llm",
        }
    }

    /// Exact, case-sensitive lookup. Near misses are not guessed at.
    pub fn from_name(name: &str) -> Option<Self> {
        ToolId::all().iter().copied().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `tool_used` as reported to callers. `Unknown` is the sentinel for
/// queries that could not be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolUsed {
    Math,
    Weather,
    Llm,
    Unknown,
}

impl ToolUsed {
    pub fn tool(&self) -> Option<ToolId> {
        match self {
            ToolUsed::Math => Some(ToolId::Math),
            ToolUsed::Weather => Some(ToolId::Weather),
            ToolUsed::Llm => Some(ToolId::Llm),
            ToolUsed::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self.tool() {
            Some(tool) => tool.as_str(),
            None => "unknown",
        }
    }
}

impl From<ToolId> for ToolUsed {
    fn from(tool: ToolId) -> Self {
        match tool {
            ToolId::Math => ToolUsed::Math,
            ToolId::Weather => ToolUsed::Weather,
            ToolId::Llm => ToolUsed::Llm,
        }
    }
}

impl fmt::Display for ToolUsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Query endpoint
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into() }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RoutedResponse {
    pub query: String,
    pub tool_used: ToolUsed,
    pub result: String,
}
