#[cfg(test)]
mod tests {
    use super::super::todo_service::{TodoService, TodoServiceImpl};
    use crate::domain::{repository::TodoRepository, todo::{NewTodo, TodoId, TodoItem}};
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use chrono::Utc;

    #[derive(Clone, Default)]
    struct InMemoryRepo {
        items: std::sync::Arc<std::sync::Mutex<Vec<TodoItem>>>,
    }

    #[async_trait]
    impl TodoRepository for InMemoryRepo {
        async fn init(&self) -> Result<()> { Ok(()) }
        async fn list_all(&self) -> Result<Vec<TodoItem>> { Ok(self.items.lock().unwrap().clone()) }
        async fn get_by_id(&self, id: TodoId) -> Result<Option<TodoItem>> {
            Ok(self.items.lock().unwrap().iter().find(|t| t.id == id).cloned())
        }
        async fn add(&self, item: NewTodo) -> Result<TodoItem> {
            let todo = TodoItem { id: TodoId::default(), action: item.action, is_done: item.is_done, created_at: Utc::now() };
            self.items.lock().unwrap().push(todo.clone());
            Ok(todo)
        }
        async fn delete_by_id(&self, id: TodoId) -> Result<()> {
            self.items.lock().unwrap().retain(|t| t.id != id);
            Ok(())
        }
    }

    struct FailingRepo;

    #[async_trait]
    impl TodoRepository for FailingRepo {
        async fn init(&self) -> Result<()> { Ok(()) }
        async fn list_all(&self) -> Result<Vec<TodoItem>> { bail!("backend offline") }
        async fn get_by_id(&self, _id: TodoId) -> Result<Option<TodoItem>> { bail!("backend offline") }
        async fn add(&self, _item: NewTodo) -> Result<TodoItem> { bail!("backend offline") }
        async fn delete_by_id(&self, _id: TodoId) -> Result<()> { bail!("backend offline") }
    }

    #[tokio::test]
    async fn unit_add_and_get() {
        let service = TodoServiceImpl::new(InMemoryRepo::default());
        let created = service.add(NewTodo { action: "X".into(), is_done: false }).await.unwrap();
        assert_eq!(created.action, "X");
        let got = service.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(got, created);
    }

    #[tokio::test]
    async fn unit_list_and_delete() {
        let service = TodoServiceImpl::new(InMemoryRepo::default());
        let a = service.add(NewTodo { action: "a".into(), is_done: false }).await.unwrap();
        service.add(NewTodo { action: "b".into(), is_done: true }).await.unwrap();
        assert_eq!(service.list_all().await.unwrap().len(), 2);

        service.delete_by_id(a.id).await.unwrap();
        let remaining = service.list_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].action, "b");
        assert!(service.get_by_id(a.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unit_repository_errors_pass_through() {
        let service = TodoServiceImpl::new(FailingRepo);
        let err = service.list_all().await.unwrap_err();
        assert_eq!(err.to_string(), "backend offline");
        assert!(service.delete_by_id(TodoId::default()).await.is_err());
    }
}
