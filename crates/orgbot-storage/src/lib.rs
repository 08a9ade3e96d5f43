//! Record sink backends for the orgkom intake bot

mod sink;
mod sqlite;
mod writer;

pub use orgbot_core::{OrgbotError, Record, Result};
pub use sink::{RecordSink, StoredRecord};
pub use sqlite::SqliteSink;
pub use writer::{SinkHandle, SinkWriter};
