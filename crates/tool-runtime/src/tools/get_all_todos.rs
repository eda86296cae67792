use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tada_storage::TodoStore;
use tracing::debug;

use super::GET_ALL_TODOS;
use crate::tool::{Tool, ToolDefinition, ToolError};

/// Returns every todo in insertion order. Ignores its input.
pub struct GetAllTodosTool {
    store: Arc<dyn TodoStore>,
}

impl GetAllTodosTool {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for GetAllTodosTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: GET_ALL_TODOS.to_string(),
            description: "Gets all todos from the database.".to_string(),
            input: "none (use an empty string)".to_string(),
            output: "array of todo objects".to_string(),
        }
    }

    async fn invoke(&self, _input: &str) -> Result<Value, ToolError> {
        let todos = self.store.get_all_todos().await?;
        debug!(count = todos.len(), "Fetched all todos");
        Ok(serde_json::to_value(todos)?)
    }
}
