//! Row types for the persistence layer, mapped with `sqlx::FromRow` so
//! queries are checked at runtime rather than needing a live database at
//! build time (spec §6, §3 — deliberate deviation from the teacher's
//! `query!`/`query_as!` compile-time macros).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ContactRow {
    pub id: i64,
    pub campaign_id: String,
    pub phone_number: String,
    pub caller_id: String,
    pub attempts: i64,
    pub next_attempt_at: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct CallRecordRow {
    pub call_id: String,
    pub campaign_id: String,
    pub contact_id: i64,
    pub phase: String,
    pub final_status: Option<String>,
    pub qualification_score: Option<f64>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct CallEventRow {
    pub id: i64,
    pub call_id: String,
    pub event_type: String,
    pub detail: String,
    pub occurred_at: DateTime<Utc>,
}
