use crate::domain::repository::TodoRepository;
use crate::domain::todo::{NewTodo, TodoId, TodoItem};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    async fn list_all(&self) -> Result<Vec<TodoItem>>;
    async fn get_by_id(&self, id: TodoId) -> Result<Option<TodoItem>>;
    async fn add(&self, item: NewTodo) -> Result<TodoItem>;
    async fn delete_by_id(&self, id: TodoId) -> Result<()>;
}

#[derive(Clone)]
pub struct TodoServiceImpl<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }
}

#[async_trait]
impl<R: TodoRepository> TodoService for TodoServiceImpl<R> {
    async fn list_all(&self) -> Result<Vec<TodoItem>> { self.repo.list_all().await }
    async fn get_by_id(&self, id: TodoId) -> Result<Option<TodoItem>> { self.repo.get_by_id(id).await }
    async fn add(&self, item: NewTodo) -> Result<TodoItem> { self.repo.add(item).await }
    async fn delete_by_id(&self, id: TodoId) -> Result<()> { self.repo.delete_by_id(id).await }
}
