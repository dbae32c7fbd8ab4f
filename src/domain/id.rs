//! Task identifiers
//!
//! Generated IDs have the form `t-{7-char-hash}` (e.g., `t-9d3e5f2`).
//! The hash is derived from the item text, the creation timestamp and a
//! salt, so two tasks created within the same instant still get distinct
//! IDs once the store bumps the salt on collision.
//!
//! IDs read from disk are accepted verbatim: older files carry UUIDs, and
//! an ID is only ever compared for equality.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Task ID must not be empty")]
    Empty,
}

/// Generates a 7-character hash from item text, timestamp and salt
fn generate_hash(item: &str, timestamp: DateTime<Utc>, salt: u32) -> String {
    let input = format!(
        "{}{}:{}",
        item,
        timestamp.timestamp_nanos_opt().unwrap_or(0),
        salt
    );
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..7].to_string()
}

/// Opaque, immutable task identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    /// Creates a new ID from item text, timestamp and a collision salt
    pub fn generate(item: &str, timestamp: DateTime<Utc>, salt: u32) -> Self {
        Self(format!("t-{}", generate_hash(item, timestamp, salt)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TaskId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for TaskId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_id_format() {
        let id = TaskId::generate("Buy milk", Utc::now(), 0);
        let s = id.to_string();

        assert!(s.starts_with("t-"));
        assert_eq!(s.len(), 9);
        assert!(s[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn salt_changes_hash() {
        let now = Utc::now();
        let a = TaskId::generate("Same", now, 0);
        let b = TaskId::generate("Same", now, 1);

        assert_ne!(a, b);
    }

    #[test]
    fn same_inputs_same_id() {
        let now = Utc::now();
        assert_eq!(
            TaskId::generate("Same", now, 3),
            TaskId::generate("Same", now, 3)
        );
    }

    #[test]
    fn parse_accepts_legacy_uuid() {
        let id: TaskId = "3f2b7c1e-8a4d-4e0f-9c1b-2d3e4f5a6b7c".parse().unwrap();
        assert_eq!(id.as_str(), "3f2b7c1e-8a4d-4e0f-9c1b-2d3e4f5a6b7c");
    }

    #[test]
    fn parse_rejects_empty() {
        assert_eq!("   ".parse::<TaskId>(), Err(IdError::Empty));
    }

    #[test]
    fn serde_as_plain_string() {
        let id: TaskId = "t-abc1234".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"t-abc1234\"");

        let back: TaskId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        assert!(serde_json::from_str::<TaskId>("\"\"").is_err());
    }
}
