//! Transaction domain entity

use chrono::{DateTime, Utc};

/// An active charging transaction on a connector.
///
/// Relative profiles anchor their schedules at `started_at`.
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Unique transaction ID
    pub id: i32,
    /// Connector the transaction runs on
    pub connector_id: u32,
    /// ID tag that started the transaction
    pub id_tag: String,
    /// When the transaction started
    pub started_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        id: i32,
        connector_id: u32,
        id_tag: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            connector_id,
            id_tag: id_tag.into(),
            started_at,
        }
    }
}
