//! Counter demo: pure arithmetic and persistence encoding.

use chrono::{DateTime, Utc};

/// Persisted counter value and when it last changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    pub value: i64,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Counter intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterOp {
    Increment,
    Decrement,
    Reset,
}

/// Apply an operation. Saturates instead of overflowing.
pub fn apply(snapshot: CounterSnapshot, op: CounterOp, now: DateTime<Utc>) -> CounterSnapshot {
    let value = match op {
        CounterOp::Increment => snapshot.value.saturating_add(1),
        CounterOp::Decrement => snapshot.value.saturating_sub(1),
        CounterOp::Reset => 0,
    };
    CounterSnapshot {
        value,
        last_updated: Some(now),
    }
}

/// Rebuild a snapshot from its stored strings. Unparseable values read as unset.
pub fn decode(value: Option<&str>, last_updated: Option<&str>) -> CounterSnapshot {
    CounterSnapshot {
        value: value.and_then(|v| v.trim().parse().ok()).unwrap_or(0),
        last_updated: last_updated
            .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

/// Encode a snapshot as the two stored strings.
pub fn encode(snapshot: &CounterSnapshot) -> (String, Option<String>) {
    (
        snapshot.value.to_string(),
        snapshot.last_updated.map(|dt| dt.to_rfc3339()),
    )
}
