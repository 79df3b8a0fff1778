//! A table session spans from a table being opened for service to it being
//! closed out, and is the subject every floor-facing push frame is scoped
//! to.

use crate::ids::{TableId, TableSessionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableSessionStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSession {
    pub id: TableSessionId,
    pub table_id: TableId,
    pub status: TableSessionStatus,
    pub opened_by: UserId,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl TableSession {
    pub fn open(table_id: TableId, opened_by: UserId) -> Self {
        Self {
            id: TableSessionId::new(),
            table_id,
            status: TableSessionStatus::Open,
            opened_by,
            opened_at: Utc::now(),
            closed_at: None,
            version: 1,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, TableSessionStatus::Open)
    }
}
