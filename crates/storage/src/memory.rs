use async_trait::async_trait;
use tada_core::Todo;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{StorageError, TodoStore};

struct Inner {
    next_id: i64,
    todos: Vec<Todo>,
}

/// In-process store. Ids start at 1 and are never reused, even after deletes.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_id: 1,
                todos: Vec::new(),
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.todos.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn get_all_todos(&self) -> Result<Vec<Todo>, StorageError> {
        Ok(self.inner.read().await.todos.clone())
    }

    async fn create_todo(&self, text: &str) -> Result<i64, StorageError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;
        inner.todos.push(Todo::new(id, text));
        debug!(id, "memory store: todo created");
        Ok(id)
    }

    async fn search_todos(&self, keyword: &str) -> Result<Vec<Todo>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .todos
            .iter()
            .filter(|t| t.matches(keyword))
            .cloned()
            .collect())
    }

    async fn delete_todo(&self, id: i64) -> Result<bool, StorageError> {
        let mut inner = self.inner.write().await;
        let before = inner.todos.len();
        inner.todos.retain(|t| t.id != id);
        let removed = inner.todos.len() != before;
        debug!(id, removed, "memory store: delete");
        Ok(removed)
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let store = MemoryStore::new();
        let a = store.create_todo("first").await.unwrap();
        let b = store.create_todo("second").await.unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);

        let all = store.get_all_todos().await.unwrap();
        let texts: Vec<_> = all.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let store = MemoryStore::new();
        store.create_todo("buy milk").await.unwrap();
        store.create_todo("walk the dog").await.unwrap();
        store.create_todo("Milk the cow").await.unwrap();

        let hits = store.search_todos("MILK").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(store.search_todos("cat").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let store = MemoryStore::new();
        let id = store.create_todo("buy milk").await.unwrap();

        assert!(store.delete_todo(id).await.unwrap());
        assert!(!store.delete_todo(id).await.unwrap());
        assert!(!store.delete_todo(999).await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let store = MemoryStore::new();
        let first = store.create_todo("a").await.unwrap();
        store.delete_todo(first).await.unwrap();
        let second = store.create_todo("b").await.unwrap();
        assert_ne!(first, second);
    }
}
