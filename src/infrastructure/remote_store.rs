use anyhow::Result;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{
    change_feed::Subscription,
    command::{ChangeEvent, ChangeKind, Command, CommandDocument, CommandRecord, RecordId},
    command_store::CommandStore,
};

/// Client for a board collection served by another `todoboard` process.
#[derive(Clone)]
pub struct RemoteCommandStore {
    client: reqwest::Client,
    base_url: String,
    feed_capacity: usize,
}

impl RemoteCommandStore {
    pub fn new(base_url: impl Into<String>, feed_capacity: usize) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client: reqwest::Client::new(), base_url, feed_capacity }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[derive(Deserialize)]
struct Created { id: RecordId }

#[derive(Deserialize)]
struct Items { items: Vec<CommandRecord> }

#[derive(Serialize)]
struct BatchDelete<'a> { ids: &'a [RecordId] }

#[derive(Deserialize)]
struct Deleted { deleted: usize }

#[async_trait]
impl CommandStore for RemoteCommandStore {
    async fn init(&self) -> Result<()> {
        self.client.get(self.url("/health")).send().await?.error_for_status()?;
        Ok(())
    }

    async fn append(&self, command: Command) -> Result<RecordId> {
        let created: Created = self.client
            .post(self.url("/board/commands"))
            .json(&CommandDocument { command })
            .send().await?
            .error_for_status()?
            .json().await?;
        Ok(created.id)
    }

    async fn list(&self) -> Result<Vec<CommandRecord>> {
        let items: Items = self.client
            .get(self.url("/board/commands"))
            .send().await?
            .error_for_status()?
            .json().await?;
        Ok(items.items)
    }

    async fn delete_batch(&self, ids: &[RecordId]) -> Result<usize> {
        let deleted: Deleted = self.client
            .post(self.url("/board/commands/batch-delete"))
            .json(&BatchDelete { ids })
            .send().await?
            .error_for_status()?
            .json().await?;
        Ok(deleted.deleted)
    }

    async fn subscribe(&self) -> Result<Subscription> {
        let response = self.client
            .get(self.url("/board/feed"))
            .header(ACCEPT, "text/event-stream")
            .send().await?
            .error_for_status()?;
        Ok(Subscription::spawn(self.feed_capacity, |tx| async move {
            let mut body = response.bytes_stream();
            let mut decoder = SseDecoder::default();
            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!(error = %e, "board feed connection lost");
                        return;
                    }
                };
                for frame in decoder.push(&chunk) {
                    match parse_frame(&frame) {
                        Ok(Some(event)) => {
                            if tx.send(event).await.is_err() { return; }
                        }
                        Ok(None) => {}
                        Err(e) => warn!(error = %e, "rejected board feed frame"),
                    }
                }
            }
            info!("board feed closed by server");
        }))
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unknown change kind {0:?}")]
    UnknownKind(String),
    #[error("malformed change record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Splits a server-sent-events byte stream into frames.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(end) = self.buf.windows(2).position(|w| w == b"\n\n") {
            let frame: Vec<u8> = self.buf.drain(..end + 2).collect();
            frames.push(String::from_utf8_lossy(&frame[..end]).into_owned());
        }
        frames
    }
}

/// Parses one frame. Comment-only frames (keep-alives) yield `None`.
pub fn parse_frame(frame: &str) -> Result<Option<ChangeEvent>, FeedError> {
    let mut name = None;
    let mut data = String::new();
    for line in frame.lines() {
        if line.starts_with(':') { continue; }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => name = Some(value),
            "data" => {
                if !data.is_empty() { data.push('\n'); }
                data.push_str(value);
            }
            _ => {}
        }
    }
    if data.is_empty() { return Ok(None); }
    let name = name.unwrap_or("message");
    let kind = ChangeKind::parse(name).ok_or_else(|| FeedError::UnknownKind(name.to_string()))?;
    let record: CommandRecord = serde_json::from_str(&data)?;
    Ok(Some(ChangeEvent { kind, record }))
}
