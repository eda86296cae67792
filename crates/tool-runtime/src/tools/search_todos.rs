use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tada_storage::TodoStore;
use tracing::debug;

use super::SEARCH_TODOS;
use crate::tool::{Tool, ToolDefinition, ToolError};

/// Case-insensitive substring search over todo text.
pub struct SearchTodosTool {
    store: Arc<dyn TodoStore>,
}

impl SearchTodosTool {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SearchTodosTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: SEARCH_TODOS.to_string(),
            description: "Searches for all todos whose text contains the keyword, ignoring case."
                .to_string(),
            input: "the search keyword (string)".to_string(),
            output: "array of matching todo objects".to_string(),
        }
    }

    async fn invoke(&self, input: &str) -> Result<Value, ToolError> {
        let keyword = input.trim();
        let todos = self.store.search_todos(keyword).await?;
        debug!(keyword, matches = todos.len(), "Searched todos");
        Ok(serde_json::to_value(todos)?)
    }
}
