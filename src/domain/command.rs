use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A single drawing instruction. Once persisted a command is never updated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Command {
    /// Segment from the previous pointer position (px, py) to the current one (x, y).
    Line { x: f64, y: f64, px: f64, py: f64 },
    Clear,
}

impl Command {
    pub fn line(from: (f64, f64), to: (f64, f64)) -> Self {
        Command::Line { x: to.0, y: to.1, px: from.0, py: from.1 }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Command::Line { .. } => "line",
            Command::Clear => "clear",
        }
    }

    pub fn encode(&self) -> Result<String, CommandError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> Result<Self, CommandError> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RecordId(pub Uuid);

impl Default for RecordId {
    fn default() -> Self { Self(Uuid::new_v4()) }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { std::fmt::Display::fmt(&self.0, f) }
}

/// The persisted document body: a record carries exactly one `command` field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CommandDocument {
    pub command: Command,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CommandRecord {
    pub id: RecordId,
    pub command: Command,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind { Added, Modified, Removed }

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Removed => "removed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "added" => Some(ChangeKind::Added),
            "modified" => Some(ChangeKind::Modified),
            "removed" => Some(ChangeKind::Removed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub record: CommandRecord,
}

impl ChangeEvent {
    pub fn added(record: CommandRecord) -> Self { Self { kind: ChangeKind::Added, record } }
    pub fn removed(record: CommandRecord) -> Self { Self { kind: ChangeKind::Removed, record } }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("malformed command payload: {0}")]
    Malformed(#[from] serde_json::Error),
}
