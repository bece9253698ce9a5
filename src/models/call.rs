// src/models/call.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which way the call went, decided from the dialed number alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Incoming => "incoming",
            Direction::Outgoing => "outgoing",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored call. `call_id` is assigned by the PBX and is the natural
/// key; the store enforces its uniqueness. Records are append-only:
/// nothing in this engine ever mutates or deletes one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub call_id: String,
    pub direction: Direction,
    pub from_number: String,
    pub to_number: String,
    pub start_time: DateTime<Utc>,
    pub answered_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_sec: i64,
    pub area_code: Option<String>,
    pub cost: Decimal,
    /// UTC calendar date of `start_time`, `YYYY-MM-DD`. Derived at parse
    /// time, kept denormalized for day-bucketed queries downstream.
    pub day: String,
    pub ingested_at: DateTime<Utc>,
}
