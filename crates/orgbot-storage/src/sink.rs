use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orgbot_core::{Record, Result};

/// A record as read back from the sink, with storage-assigned fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub name: String,
    pub course: String,
    pub motivation: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Durable append-only storage for completed intake records.
///
/// `append` is called once per finalized conversation, from the
/// background writer task; failures are logged there and lost, never
/// surfaced into the conversation.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn append(&self, record: &Record) -> Result<()>;

    /// All stored records in insertion order, for the admin export.
    async fn list(&self) -> Result<Vec<StoredRecord>>;
}
