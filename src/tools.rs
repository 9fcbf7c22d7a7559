//! Tool system for function calling with typed input/output.

use std::collections::BTreeMap;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::schema::ParameterSchema;

/// Error type for tool lookup and execution.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for tool `{tool}`: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Tool `{0}` is already registered")]
    Duplicate(String),

    #[error("Tool error: {0}")]
    Execution(String),
}

/// A tool as advertised to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    /// Unique within a registry.
    pub name: String,
    pub description: String,
    pub parameters: ParameterSchema,
}

/// A locally executed function the model may call.
///
/// The parameter schema comes from `Input`'s `JsonSchema` impl. Mark the input
/// with `#[serde(deny_unknown_fields)]` to reject undeclared arguments.
#[async_trait]
pub trait LocalTool: Send + Sync {
    type Input: DeserializeOwned + JsonSchema + Send;
    type Output: Serialize + Send;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn call(&self, input: Self::Input) -> Result<Self::Output, ToolError>;
}

/// Trait for anything that can list and execute tools by name.
#[async_trait]
pub trait ToolService: Send + Sync {
    /// List available tools.
    fn list_tools(&self) -> Vec<ToolDefinition>;

    /// Execute a tool with the raw JSON arguments the model produced.
    async fn call_tool(&self, name: &str, arguments: &str) -> Result<Value, ToolError>;
}

#[async_trait]
trait ErasedTool: Send + Sync {
    async fn call_value(&self, arguments: Value) -> Result<Value, ToolError>;
}

#[async_trait]
impl<T: LocalTool> ErasedTool for T {
    async fn call_value(&self, arguments: Value) -> Result<Value, ToolError> {
        let input: T::Input =
            serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
                tool: self.name().to_string(),
                reason: e.to_string(),
            })?;
        let output = self.call(input).await?;
        serde_json::to_value(output).map_err(|e| ToolError::Execution(e.to_string()))
    }
}

struct Entry {
    definition: ToolDefinition,
    tool: Box<dyn ErasedTool>,
}

/// Static mapping from tool name to definition and callable.
#[derive(Default)]
pub struct ToolRegistry {
    entries: BTreeMap<String, Entry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, deriving its parameter schema from the input type.
    pub fn register<T: LocalTool + 'static>(mut self, tool: T) -> Result<Self, ToolError> {
        let name = tool.name().to_string();
        if self.entries.contains_key(&name) {
            return Err(ToolError::Duplicate(name));
        }

        let parameters = ParameterSchema::for_type::<T::Input>().map_err(|e| {
            ToolError::Execution(format!("unsupported parameter schema for `{name}`: {e}"))
        })?;
        let definition = ToolDefinition {
            name: name.clone(),
            description: tool.description().to_string(),
            parameters,
        };

        debug!("Registered tool {}", name);
        self.entries.insert(
            name,
            Entry {
                definition,
                tool: Box::new(tool),
            },
        );
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.entries.get(name).map(|e| &e.definition)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ToolService for ToolRegistry {
    fn list_tools(&self) -> Vec<ToolDefinition> {
        self.entries.values().map(|e| e.definition.clone()).collect()
    }

    async fn call_tool(&self, name: &str, arguments: &str) -> Result<Value, ToolError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let invalid = |reason: String| ToolError::InvalidArguments {
            tool: name.to_string(),
            reason,
        };

        // Some servers send an empty string for argument-less calls.
        let raw = if arguments.trim().is_empty() { "{}" } else { arguments };
        let value: Value = serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))?;
        entry
            .definition
            .parameters
            .validate(&value)
            .map_err(|e| invalid(e.to_string()))?;

        entry.tool.call_value(value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, JsonSchema)]
    #[serde(deny_unknown_fields)]
    struct EchoArgs {
        /// Text to echo back.
        text: String,
    }

    struct Echo;

    #[async_trait]
    impl LocalTool for Echo {
        type Input = EchoArgs;
        type Output = Value;

        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the given text."
        }

        async fn call(&self, input: EchoArgs) -> Result<Value, ToolError> {
            Ok(json!({ "echo": input.text }))
        }
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::new().register(Echo).unwrap()
    }

    #[test]
    fn lists_registered_definitions() {
        let tools = registry().list_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "echo");
        assert_eq!(tools[0].description, "Echo the given text.");
        assert_eq!(tools[0].parameters.required(), ["text".to_string()]);
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = registry().register(Echo).err().unwrap();
        assert!(matches!(err, ToolError::Duplicate(name) if name == "echo"));
    }

    #[tokio::test]
    async fn dispatches_valid_call() {
        let result = registry()
            .call_tool("echo", r#"{"text":"hi"}"#)
            .await
            .unwrap();
        assert_eq!(result, json!({"echo": "hi"}));
    }

    #[tokio::test]
    async fn unknown_tool_is_reported() {
        let err = registry().call_tool("nope", "{}").await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(name) if name == "nope"));
    }

    #[tokio::test]
    async fn malformed_json_is_invalid_arguments() {
        let err = registry().call_tool("echo", "{text:").await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn schema_violations_are_invalid_arguments() {
        let registry = registry();

        let missing = registry.call_tool("echo", "{}").await.unwrap_err();
        assert!(matches!(missing, ToolError::InvalidArguments { .. }));

        let extra = registry
            .call_tool("echo", r#"{"text":"a","loud":true}"#)
            .await
            .unwrap_err();
        assert!(matches!(extra, ToolError::InvalidArguments { ref reason, .. } if reason.contains("loud")));
    }
}
