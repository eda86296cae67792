use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use tada_storage::StorageError;

/// Describes a tool's interface for the system prompt.
///
/// The protocol passes a single string as `input`, so `input` and `output`
/// are prose descriptions rather than JSON Schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name the model puts in `action.function`
    pub name: String,
    /// What the tool does
    pub description: String,
    /// What `action.input` must contain
    pub input: String,
    /// Shape of the value returned as the observation
    pub output: String,
}

/// The primary extension point: all tools implement this trait.
///
/// Tools are object-safe, Send + Sync, and async.
#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    /// Run the tool with the raw `input` string from an action envelope.
    async fn invoke(&self, input: &str) -> Result<Value, ToolError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Store error: {0}")]
    Store(#[from] StorageError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl fmt::Display for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.input)
    }
}

/// Simple tools for exercising the registry and loop in tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    use super::*;

    /// Echoes its input back as a JSON string.
    pub struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "echo".to_string(),
                description: "Echoes back the input. For testing.".to_string(),
                input: "any text".to_string(),
                output: "the same text".to_string(),
            }
        }

        async fn invoke(&self, input: &str) -> Result<Value, ToolError> {
            Ok(Value::String(input.to_string()))
        }
    }

    /// Always fails with `InvalidInput`.
    pub struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "fail".to_string(),
                description: "Always fails. For testing.".to_string(),
                input: "ignored".to_string(),
                output: "never returns".to_string(),
            }
        }

        async fn invoke(&self, input: &str) -> Result<Value, ToolError> {
            Err(ToolError::InvalidInput(format!("cannot handle '{input}'")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{EchoTool, FailingTool};
    use super::*;

    #[test]
    fn test_tool_definition_serialization() {
        let def = ToolDefinition {
            name: "createTodo".to_string(),
            description: "Creates a todo".to_string(),
            input: "the todo text".to_string(),
            output: "the new id".to_string(),
        };
        let json = serde_json::to_string(&def).unwrap();
        let roundtrip: ToolDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip.name, "createTodo");
        assert_eq!(def.to_string(), "createTodo(the todo text)");
    }

    #[tokio::test]
    async fn test_echo_tool() {
        let tool = EchoTool;
        assert_eq!(tool.definition().name, "echo");
        let value = tool.invoke("hello world").await.unwrap();
        assert_eq!(value, Value::String("hello world".into()));
    }

    #[tokio::test]
    async fn test_failing_tool() {
        let err = FailingTool.invoke("x").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: cannot handle 'x'");
    }

    #[test]
    fn test_store_error_converts() {
        let err: ToolError = StorageError::Other("disk on fire".into()).into();
        assert!(matches!(err, ToolError::Store(_)));
    }
}
