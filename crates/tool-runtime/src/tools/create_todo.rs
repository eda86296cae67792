use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tada_storage::TodoStore;
use tracing::debug;

use super::CREATE_TODO;
use crate::tool::{Tool, ToolDefinition, ToolError};

/// Persists a new todo and returns its id.
pub struct CreateTodoTool {
    store: Arc<dyn TodoStore>,
}

impl CreateTodoTool {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CreateTodoTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: CREATE_TODO.to_string(),
            description: "Creates a new todo in the database.".to_string(),
            input: "the todo text (string)".to_string(),
            output: "the id of the created todo (integer)".to_string(),
        }
    }

    async fn invoke(&self, input: &str) -> Result<Value, ToolError> {
        let text = input.trim();
        if text.is_empty() {
            return Err(ToolError::InvalidInput(
                "todo text must not be empty".to_string(),
            ));
        }
        let id = self.store.create_todo(text).await?;
        debug!(id, "Created todo");
        Ok(json!(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tada_storage::MemoryStore;

    #[tokio::test]
    async fn test_creates_and_returns_id() {
        let store = Arc::new(MemoryStore::new());
        let tool = CreateTodoTool::new(store.clone());

        let value = tool.invoke("  buy milk ").await.unwrap();
        assert_eq!(value, json!(1));

        let todos = store.get_all_todos().await.unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].text, "buy milk");
    }

    #[tokio::test]
    async fn test_blank_text_rejected() {
        let store = Arc::new(MemoryStore::new());
        let tool = CreateTodoTool::new(store.clone());

        for input in ["", "   ", "\n\t"] {
            let err = tool.invoke(input).await.unwrap_err();
            assert!(matches!(err, ToolError::InvalidInput(_)));
        }
        assert!(store.is_empty().await);
    }
}
