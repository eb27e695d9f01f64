//! Message and request types for data queue reads.

use crate::addressing::QueueIdentity;
use crate::search::SearchType;
use crate::transport::{RawEntry, ReadMode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;

/// Metadata entry carrying the key of a message read from a keyed queue
pub const QUEUE_KEY_PROPERTY: &str = "queue.key";

/// Key filter for keyed data queues
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDescriptor {
    pub key: String,
    pub search_type: SearchType,
}

impl KeyDescriptor {
    pub fn new(key: impl Into<String>, search_type: SearchType) -> Self {
        Self {
            key: key.into(),
            search_type,
        }
    }

    pub fn equal(key: impl Into<String>) -> Self {
        Self::new(key, SearchType::Equal)
    }
}

/// Entry read from a data queue, trailing padding removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMessage {
    pub payload: String,
    pub key: Option<String>,
}

impl QueueMessage {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            key: None,
        }
    }

    pub fn with_key(payload: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            key: Some(key.into()),
        }
    }

    /// Strip the host's fixed-length padding from a raw entry
    pub fn from_raw(entry: RawEntry) -> Self {
        Self {
            payload: entry.data.trim_end().to_string(),
            key: entry.key.map(|key| key.trim_end().to_string()),
        }
    }

    /// Outbound metadata: `queue.key` for keyed messages, empty otherwise
    pub fn properties(&self) -> HashMap<String, String> {
        let mut properties = HashMap::new();
        if let Some(key) = &self.key {
            properties.insert(QUEUE_KEY_PROPERTY.to_string(), key.clone());
        }
        properties
    }
}

/// Total time a caller is prepared to wait for a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalWait {
    Forever,
    Bounded(Duration),
}

impl TotalWait {
    /// Interpret the conventional seconds value: negative waits forever,
    /// zero does not wait.
    pub fn from_seconds(seconds: i64) -> Self {
        if seconds < 0 {
            Self::Forever
        } else {
            Self::Bounded(Duration::from_secs(seconds.unsigned_abs()))
        }
    }

    pub fn is_forever(&self) -> bool {
        matches!(self, Self::Forever)
    }
}

/// Everything needed to read one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    pub queue: QueueIdentity,
    pub key: Option<KeyDescriptor>,
    pub mode: ReadMode,
    pub wait: TotalWait,
}

impl ReadRequest {
    /// Destructive read that waits forever
    pub fn new(queue: QueueIdentity) -> Self {
        Self {
            queue,
            key: None,
            mode: ReadMode::Remove,
            wait: TotalWait::Forever,
        }
    }

    pub fn with_key(mut self, key: KeyDescriptor) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_mode(mut self, mode: ReadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_wait(mut self, wait: TotalWait) -> Self {
        self.wait = wait;
        self
    }
}
