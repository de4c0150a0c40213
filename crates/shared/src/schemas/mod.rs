// crates/shared/src/schemas/mod.rs
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::types::ToolId;

/// Static description of one tool, as presented to the intent classifier.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub tool: ToolId,
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<ParameterSchema>,
}

#[derive(Debug, Clone)]
pub struct ParameterSchema {
    pub name: &'static str,
    pub type_name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

/// A function declaration in the shape generative backends accept for
/// function calling.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolSchema {
    pub fn to_declaration(&self) -> FunctionDeclaration {
        let mut properties = json!({});
        let mut required = vec![];

        for param in &self.parameters {
            properties[param.name] = json!({
                "type": param.type_name,
                "description": param.description
            });
            if param.required {
                required.push(param.name);
            }
        }

        FunctionDeclaration {
            name: self.name.to_string(),
            description: self.description.to_string(),
            parameters: json!({
                "type": "object",
                "properties": properties,
                "required": required
            }),
        }
    }

    /// The single argument this tool needs. Every tool takes exactly one.
    pub fn primary_parameter(&self) -> Option<&ParameterSchema> {
        self.parameters.iter().find(|p| p.required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_declaration_lists_required_parameters() {
        let schema = ToolSchema {
            tool: ToolId::Weather,
            name: "weather",
            description: "Current weather",
            parameters: vec![
                ParameterSchema {
                    name: "location",
                    type_name: "string",
                    description: "City name",
                    required: true,
                },
                ParameterSchema {
                    name: "units",
                    type_name: "string",
                    description: "Unit system",
                    required: false,
                },
            ],
        };

        let decl = schema.to_declaration();
        assert_eq!(decl.name, "weather");
        assert_eq!(decl.parameters["type"], "object");
        assert_eq!(decl.parameters["properties"]["location"]["type"], "string");
        assert_eq!(decl.parameters["required"], json!(["location"]));
        assert_eq!(schema.primary_parameter().map(|p| p.name), Some("location"));
    }
}
