use async_trait::async_trait;

use super::change_feed::Subscription;
use super::command::{Command, CommandRecord, RecordId};

/// A shared, ordered collection of drawing commands with a change feed.
///
/// Every successful write is published to all open subscriptions.
#[async_trait]
pub trait CommandStore: Send + Sync + 'static {
    async fn init(&self) -> anyhow::Result<()>;
    async fn append(&self, command: Command) -> anyhow::Result<RecordId>;
    /// All records in insertion order.
    async fn list(&self) -> anyhow::Result<Vec<CommandRecord>>;
    /// Deletes the given records in a single transaction. Ids that are already
    /// gone are skipped; returns how many records were removed.
    async fn delete_batch(&self, ids: &[RecordId]) -> anyhow::Result<usize>;
    async fn subscribe(&self) -> anyhow::Result<Subscription>;
}
