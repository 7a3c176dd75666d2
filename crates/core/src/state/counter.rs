use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::counter::CounterSnapshot;

/// Where the counter is in its load/save cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum CounterStatus {
    #[default]
    Idle,
    Loading,
    Error(String),
}

/// Counter demo state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct CounterState {
    pub value: i64,
    pub last_updated: Option<DateTime<Utc>>,
    pub status: CounterStatus,
}

impl CounterState {
    pub fn from_snapshot(snapshot: CounterSnapshot) -> Self {
        Self {
            value: snapshot.value,
            last_updated: snapshot.last_updated,
            status: CounterStatus::Idle,
        }
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            value: self.value,
            last_updated: self.last_updated,
        }
    }

    pub fn with_status(mut self, status: CounterStatus) -> Self {
        self.status = status;
        self
    }
}
