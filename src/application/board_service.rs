use anyhow::{Context, Result};
use tracing::{error, info};

use crate::domain::change_feed::Subscription;
use crate::domain::command::{Command, CommandRecord, RecordId};
use crate::domain::command_store::CommandStore;

/// Board operations on top of a shared command collection.
#[derive(Clone)]
pub struct BoardService<S: CommandStore> {
    store: S,
}

impl<S: CommandStore> BoardService<S> {
    pub fn new(store: S) -> Self { Self { store } }

    pub fn store(&self) -> &S { &self.store }

    pub async fn append(&self, command: Command) -> Result<RecordId> {
        let id = self.store.append(command).await.with_context(|| format!("append {} command", command.kind()))?;
        tracing::debug!(%id, kind = command.kind(), "command stored");
        Ok(id)
    }

    pub async fn history(&self) -> Result<Vec<CommandRecord>> {
        self.store.list().await
    }

    pub async fn subscribe(&self) -> Result<Subscription> {
        self.store.subscribe().await
    }

    /// Deletes every record present when the collection is enumerated, as a
    /// single batch. Records appended after the enumeration survive.
    pub async fn clear_all(&self) -> Result<usize> {
        let snapshot = self.store.list().await.context("enumerate board commands")?;
        let ids: Vec<RecordId> = snapshot.iter().map(|r| r.id).collect();
        let deleted = self.store.delete_batch(&ids).await.context("commit batch delete")?;
        info!(enumerated = ids.len(), deleted, "board collection cleared");
        Ok(deleted)
    }

    /// Purges the collection, then records a clear command. A failed purge is
    /// only logged; the clear command is appended regardless.
    pub async fn clear_board(&self) -> Result<RecordId> {
        if let Err(e) = self.clear_all().await {
            error!(error = %format!("{e:#}"), "clearing board collection failed");
        }
        self.append(Command::Clear).await
    }
}
