pub mod registry;
pub mod schemas;
pub mod types;

pub use schemas::{FunctionDeclaration, ParameterSchema, ToolSchema};
pub use registry::{get_tools, schema_for};
pub use types::{QueryRequest, RoutedResponse, ToolId, ToolUsed};
