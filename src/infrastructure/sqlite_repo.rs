use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};
use uuid::Uuid;

use super::db::connect_pool;
use crate::domain::{
    repository::TodoRepository,
    todo::{NewTodo, TodoId, TodoItem},
};

#[derive(Clone)]
pub struct SqliteTodoRepository {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteTodoRepository {
    pub async fn connect(database_url: &str) -> Result<Self> {
        Ok(Self::with_pool(connect_pool(database_url).await?))
    }

    pub fn with_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS todos (
                id TEXT PRIMARY KEY,
                action TEXT NOT NULL,
                is_done INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<TodoItem>> {
        let rows = sqlx::query("SELECT id, action, is_done, created_at FROM todos ORDER BY created_at ASC")
            .fetch_all(&*self.pool)
            .await?;
        rows.into_iter().map(row_to_todo).collect()
    }

    async fn get_by_id(&self, id: TodoId) -> Result<Option<TodoItem>> {
        let row = sqlx::query("SELECT id, action, is_done, created_at FROM todos WHERE id = ?1")
            .bind(id.0.to_string())
            .fetch_optional(&*self.pool)
            .await?;
        row.map(row_to_todo).transpose()
    }

    async fn add(&self, item: NewTodo) -> Result<TodoItem> {
        let todo = TodoItem { id: TodoId::default(), action: item.action, is_done: item.is_done, created_at: Utc::now() };
        sqlx::query("INSERT INTO todos (id, action, is_done, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(todo.id.0.to_string())
            .bind(&todo.action)
            .bind(todo.is_done)
            .bind(todo.created_at.to_rfc3339())
            .execute(&*self.pool)
            .await?;
        Ok(todo)
    }

    async fn delete_by_id(&self, id: TodoId) -> Result<()> {
        sqlx::query("DELETE FROM todos WHERE id = ?1")
            .bind(id.0.to_string())
            .execute(&*self.pool)
            .await?;
        Ok(())
    }
}

fn row_to_todo(row: SqliteRow) -> Result<TodoItem> {
    let id_str: String = row.try_get("id")?;
    let created_at_str: String = row.try_get("created_at")?;
    Ok(TodoItem {
        id: TodoId(Uuid::parse_str(&id_str).with_context(|| format!("bad todo id {id_str:?}"))?),
        action: row.try_get("action")?,
        is_done: row.try_get("is_done")?,
        created_at: DateTime::parse_from_rfc3339(&created_at_str)?.with_timezone(&Utc),
    })
}
