use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tada_storage::TodoStore;
use tracing::debug;

use super::DELETE_TODO;
use crate::tool::{Tool, ToolDefinition, ToolError};

/// Deletes a todo by id. A missing id is reported, not treated as an error.
pub struct DeleteTodoTool {
    store: Arc<dyn TodoStore>,
}

impl DeleteTodoTool {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }
}

/// Accepts `3`, ` 3 ` and `"3"`.
fn parse_id(input: &str) -> Result<i64, ToolError> {
    let raw = input.trim().trim_matches('"').trim();
    raw.parse()
        .map_err(|_| ToolError::InvalidInput(format!("'{raw}' is not a todo id")))
}

#[async_trait]
impl Tool for DeleteTodoTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: DELETE_TODO.to_string(),
            description: "Deletes a todo by its id.".to_string(),
            input: "the todo id (integer)".to_string(),
            output: "{\"id\": <id>, \"deleted\": <true if a todo was removed>}".to_string(),
        }
    }

    async fn invoke(&self, input: &str) -> Result<Value, ToolError> {
        let id = parse_id(input)?;
        let deleted = self.store.delete_todo(id).await?;
        debug!(id, deleted, "Deleted todo");
        Ok(json!({ "id": id, "deleted": deleted }))
    }
}
