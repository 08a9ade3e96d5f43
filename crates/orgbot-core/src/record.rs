//! Completed intake record handed to the record sink

use serde::{Deserialize, Serialize};

/// One completed (or early-exit) questionnaire. Built exactly once per
/// conversation, at finalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub user_id: i64,
    pub username: Option<String>,
    pub name: String,
    pub course: String,
    /// Absent when the course answer skipped the motivation step.
    pub motivation: Option<String>,
}

impl Record {
    /// Ordered values in spreadsheet column order.
    pub fn row(&self) -> Vec<String> {
        vec![
            self.user_id.to_string(),
            self.username.clone().unwrap_or_default(),
            self.name.clone(),
            self.course.clone(),
            self.motivation.clone().unwrap_or_default(),
        ]
    }
}
