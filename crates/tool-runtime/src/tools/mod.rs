//! The todo tools exposed to the model.
//!
//! Each tool wraps one `TodoStore` operation. Names are the exact strings
//! the model writes in `action.function`.

pub mod create_todo;
pub mod delete_todo;
pub mod get_all_todos;
pub mod search_todos;

use std::sync::Arc;

use tada_storage::TodoStore;

use crate::registry::{RegistryError, ToolRegistry};

pub use create_todo::CreateTodoTool;
pub use delete_todo::DeleteTodoTool;
pub use get_all_todos::GetAllTodosTool;
pub use search_todos::SearchTodosTool;

pub const GET_ALL_TODOS: &str = "getAllTodos";
pub const CREATE_TODO: &str = "createTodo";
pub const SEARCH_TODOS: &str = "searchTodos";
pub const DELETE_TODO: &str = "deleteTodo";

/// Registry holding the four todo tools, all backed by `store`.
pub fn todo_registry(store: Arc<dyn TodoStore>) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    registry.register(GetAllTodosTool::new(store.clone()))?;
    registry.register(CreateTodoTool::new(store.clone()))?;
    registry.register(SearchTodosTool::new(store.clone()))?;
    registry.register(DeleteTodoTool::new(store))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tada_storage::MemoryStore;

    #[test]
    fn test_todo_registry_names() {
        let registry = todo_registry(Arc::new(MemoryStore::new())).unwrap();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec![GET_ALL_TODOS, CREATE_TODO, SEARCH_TODOS, DELETE_TODO]);
    }
}
