use async_trait::async_trait;
use super::todo::{NewTodo, TodoId, TodoItem};

#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    async fn init(&self) -> anyhow::Result<()>;
    async fn list_all(&self) -> anyhow::Result<Vec<TodoItem>>;
    async fn get_by_id(&self, id: TodoId) -> anyhow::Result<Option<TodoItem>>;
    async fn add(&self, item: NewTodo) -> anyhow::Result<TodoItem>;
    async fn delete_by_id(&self, id: TodoId) -> anyhow::Result<()>;
}
