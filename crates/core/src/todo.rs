use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted todo item.
///
/// Owned by the store; the agent only ever sees it through tool results, so
/// the serialized shape here is what the model reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    pub fn new(id: i64, text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            text: text.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Case-insensitive substring match used by keyword search.
    pub fn matches(&self, keyword: &str) -> bool {
        self.text.to_lowercase().contains(&keyword.to_lowercase())
    }
}
