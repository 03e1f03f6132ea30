use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::db::connect_pool;
use crate::domain::{
    change_feed::Subscription,
    command::{ChangeEvent, ChangeKind, Command, CommandRecord, RecordId},
    command_store::CommandStore,
};

pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// Command collection stored in the `board_commands` table.
///
/// Writes and the snapshot taken by `subscribe` are serialized by one lock,
/// so a new subscriber sees every record exactly once: either in its
/// snapshot or on the live feed. A subscriber that falls behind the feed
/// capacity is resynced from the table, and `added` events are deduplicated
/// by record id.
#[derive(Clone)]
pub struct SqliteCommandStore {
    pool: Arc<Pool<Sqlite>>,
    feed: broadcast::Sender<ChangeEvent>,
    write_lock: Arc<Mutex<()>>,
    feed_capacity: usize,
}

impl SqliteCommandStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        Ok(Self::with_pool(connect_pool(database_url).await?, DEFAULT_FEED_CAPACITY))
    }

    pub fn with_pool(pool: Pool<Sqlite>, feed_capacity: usize) -> Self {
        let feed_capacity = feed_capacity.max(1);
        let (feed, _) = broadcast::channel(feed_capacity);
        Self { pool: Arc::new(pool), feed, write_lock: Arc::new(Mutex::new(())), feed_capacity }
    }

    fn publish(&self, event: ChangeEvent) {
        // no receivers just means nobody is watching
        let _ = self.feed.send(event);
    }

    /// Polls the table every `interval` and publishes rows written after this
    /// call, so processes sharing one database file see each other's commands.
    /// Rows this store wrote itself are dropped again by each subscriber's
    /// id check. Deletions made by another process are not reported.
    pub async fn watch(&self, interval: Duration) -> Result<JoinHandle<()>> {
        let mut last_seq = self.max_seq().await.context("reading board position")?;
        let store = self.clone();
        Ok(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // held through publish so a concurrent delete's `removed` follows our `added`
                let _guard = store.write_lock.lock().await;
                match store.rows_after(last_seq).await {
                    Ok(rows) => {
                        for (seq, record) in rows {
                            last_seq = seq;
                            store.publish(ChangeEvent::added(record));
                        }
                    }
                    Err(e) => warn!(error = %format!("{e:#}"), "polling board commands failed"),
                }
            }
        }))
    }

    async fn max_seq(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COALESCE(MAX(seq), 0) AS seq FROM board_commands")
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("seq")?)
    }

    async fn rows_after(&self, seq: i64) -> Result<Vec<(i64, CommandRecord)>> {
        let rows = sqlx::query("SELECT seq, id, command FROM board_commands WHERE seq > ?1 ORDER BY seq ASC")
            .bind(seq)
            .fetch_all(&*self.pool)
            .await?;
        rows.into_iter()
            .map(|row| -> Result<(i64, CommandRecord)> {
                let seq: i64 = row.try_get("seq")?;
                Ok((seq, row_to_record(row)?))
            })
            .collect()
    }

    async fn pump(self, snapshot: Vec<CommandRecord>, mut live: broadcast::Receiver<ChangeEvent>, tx: mpsc::Sender<ChangeEvent>) {
        let mut delivered = HashSet::with_capacity(snapshot.len());
        for record in snapshot {
            delivered.insert(record.id);
            if tx.send(ChangeEvent::added(record)).await.is_err() { return; }
        }
        loop {
            match live.recv().await {
                Ok(event) => {
                    match event.kind {
                        ChangeKind::Added => {
                            if !delivered.insert(event.record.id) { continue; }
                        }
                        ChangeKind::Removed => { delivered.remove(&event.record.id); }
                        ChangeKind::Modified => {}
                    }
                    if tx.send(event).await.is_err() { return; }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "board feed subscriber fell behind; resyncing from the table");
                    let records = match self.list().await {
                        Ok(records) => records,
                        Err(e) => {
                            error!(error = %format!("{e:#}"), "resyncing board feed failed");
                            continue;
                        }
                    };
                    let current: HashSet<RecordId> = records.iter().map(|r| r.id).collect();
                    let mut resent = 0usize;
                    for record in records {
                        if delivered.insert(record.id) {
                            resent += 1;
                            if tx.send(ChangeEvent::added(record)).await.is_err() { return; }
                        }
                    }
                    delivered.retain(|id| current.contains(id));
                    debug!(resent, "board feed resynced");
                }
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    }
}

#[async_trait]
impl CommandStore for SqliteCommandStore {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS board_commands (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                command TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn append(&self, command: Command) -> Result<RecordId> {
        let record = CommandRecord { id: RecordId::default(), command };
        let _guard = self.write_lock.lock().await;
        sqlx::query("INSERT INTO board_commands (id, command, created_at) VALUES (?1, ?2, ?3)")
            .bind(record.id.0.to_string())
            .bind(command.encode()?)
            .bind(Utc::now().to_rfc3339())
            .execute(&*self.pool)
            .await?;
        self.publish(ChangeEvent::added(record));
        Ok(record.id)
    }

    async fn list(&self) -> Result<Vec<CommandRecord>> {
        let rows = sqlx::query("SELECT id, command FROM board_commands ORDER BY seq ASC")
            .fetch_all(&*self.pool)
            .await?;
        rows.into_iter().map(row_to_record).collect()
    }

    async fn delete_batch(&self, ids: &[RecordId]) -> Result<usize> {
        if ids.is_empty() { return Ok(0); }
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            let row = sqlx::query("DELETE FROM board_commands WHERE id = ?1 RETURNING id, command")
                .bind(id.0.to_string())
                .fetch_optional(&mut *tx)
                .await?;
            if let Some(row) = row {
                removed.push(row_to_record(row)?);
            }
        }
        tx.commit().await?;
        for record in &removed {
            self.publish(ChangeEvent::removed(*record));
        }
        Ok(removed.len())
    }

    async fn subscribe(&self) -> Result<Subscription> {
        let (snapshot, live) = {
            let _guard = self.write_lock.lock().await;
            (self.list().await?, self.feed.subscribe())
        };
        let store = self.clone();
        Ok(Subscription::spawn(self.feed_capacity, move |tx| store.pump(snapshot, live, tx)))
    }
}

fn row_to_record(row: SqliteRow) -> Result<CommandRecord> {
    let id_str: String = row.try_get("id")?;
    let raw: String = row.try_get("command")?;
    Ok(CommandRecord {
        id: RecordId(Uuid::parse_str(&id_str).with_context(|| format!("bad record id {id_str:?}"))?),
        command: Command::decode(&raw).with_context(|| format!("record {id_str}"))?,
    })
}
