use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tada_core::config::PostgresConfig;
use tada_core::Todo;
use tracing::{debug, info};

use crate::{StorageError, TodoStore};

#[derive(Debug, sqlx::FromRow)]
struct TodoRow {
    id: i64,
    text: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TodoRow> for Todo {
    fn from(row: TodoRow) -> Self {
        Todo {
            id: row.id,
            text: row.text,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL-backed store. Each operation is a single statement, so the
/// database provides the per-operation atomicity.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and apply the embedded migrations.
    pub async fn connect(config: &PostgresConfig) -> Result<Self, StorageError> {
        let url = config
            .database_url
            .as_deref()
            .ok_or_else(|| StorageError::NotConfigured("DATABASE_URL not set".into()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect(url)
            .await?;
        info!("PostgreSQL connected");

        sqlx::migrate!("../../migrations").run(&pool).await?;
        info!("Database migrations applied successfully");

        Ok(Self { pool })
    }
}

#[async_trait]
impl TodoStore for PgStore {
    async fn get_all_todos(&self) -> Result<Vec<Todo>, StorageError> {
        let rows = sqlx::query_as::<_, TodoRow>(
            "SELECT id, text, created_at, updated_at FROM todos ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Todo::from).collect())
    }

    async fn create_todo(&self, text: &str) -> Result<i64, StorageError> {
        let id: i64 = sqlx::query_scalar("INSERT INTO todos (text) VALUES ($1) RETURNING id")
            .bind(text)
            .fetch_one(&self.pool)
            .await?;
        debug!(id, "postgres store: todo created");
        Ok(id)
    }

    async fn search_todos(&self, keyword: &str) -> Result<Vec<Todo>, StorageError> {
        let rows = sqlx::query_as::<_, TodoRow>(
            "SELECT id, text, created_at, updated_at FROM todos \
             WHERE text ILIKE '%' || $1 || '%' ESCAPE '\\' \
             ORDER BY id",
        )
        .bind(escape_like(keyword))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Todo::from).collect())
    }

    async fn delete_todo(&self, id: i64) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        let removed = result.rows_affected() > 0;
        debug!(id, removed, "postgres store: delete");
        Ok(removed)
    }

    fn backend_name(&self) -> &str {
        "postgres"
    }
}

/// Escape LIKE wildcards so the keyword is matched literally.
fn escape_like(keyword: &str) -> String {
    let mut out = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
