use once_cell::sync::Lazy;

use crate::schemas::{FunctionDeclaration, ParameterSchema, ToolSchema};
use crate::types::ToolId;

static TOOL_SCHEMAS: Lazy<Vec<ToolSchema>> = Lazy::new(|| {
    vec![
        ToolSchema {
            tool: ToolId::Math,
            name: "math",
            description: "Evaluates an arithmetic expression built from numbers, + - * /, \
                          and parentheses. Use this tool when the user asks for a calculation.",
            parameters: vec![ParameterSchema {
                name: "expression",
                type_name: "string",
                description: "The bare arithmetic expression, e.g. '42 * 6' or '(10 + 5) / 3'",
                required: true,
            }],
        },
        ToolSchema {
            tool: ToolId::Weather,
            name: "weather",
            description: "Fetches the current weather for a named location. Use this tool when \
                          the user asks about weather, temperature, or climate somewhere.",
            parameters: vec![ParameterSchema {
                name: "location",
                type_name: "string",
                description: "The city or place name, e.g. 'Paris' or 'London'",
                required: true,
            }],
        },
        ToolSchema {
            tool: ToolId::Llm,
            name: "llm",
            description: "Answers general or open-ended questions with a language model. Use \
                          this tool for any question that is not about weather or arithmetic.",
            parameters: vec![ParameterSchema {
                name: "question",
                type_name: "string",
                description: "The user's question, unchanged",
                required: true,
            }],
        },
    ]
});

pub fn get_tools() -> Vec<FunctionDeclaration> {
    TOOL_SCHEMAS.iter().map(|s| s.to_declaration()).collect()
}

/// Schemas are declared in `ToolId` discriminant order.
pub fn schema_for(tool: ToolId) -> &'static ToolSchema {
    &TOOL_SCHEMAS[tool as usize]
}
