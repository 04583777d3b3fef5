//! The persistence seam (spec §6): six operations the campaign runner and
//! call controller need, kept transport-agnostic behind a trait so tests
//! can swap in an in-memory fake instead of a real database.

pub mod models;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::persistence::models::ContactRow;

#[derive(Debug, Clone)]
pub struct NewCallRecord {
    pub call_id: String,
    pub campaign_id: String,
    pub contact_id: i64,
}

#[derive(Debug, Clone)]
pub struct FinalizedCall {
    pub call_id: String,
    pub final_status: String,
    pub qualification_score: Option<f64>,
}

/// The six operations a campaign run performs against storage. Named to
/// match what the caller is doing, not the SQL underneath.
#[async_trait]
pub trait PersistencePort: Send + Sync {
    async fn fetch_due_contacts(&self, campaign_id: &str, limit: usize) -> Result<Vec<ContactRow>>;
    async fn create_call_record(&self, record: NewCallRecord) -> Result<()>;
    async fn update_call_phase(&self, call_id: &str, phase: &str) -> Result<()>;
    async fn append_call_event(&self, call_id: &str, event_type: &str, detail: &str) -> Result<()>;
    async fn finalize_call(&self, finalized: FinalizedCall) -> Result<()>;
    async fn schedule_retry(&self, contact_id: i64, next_attempt_at: DateTime<Utc>) -> Result<()>;
}

pub mod fakes {
    use super::*;
    use parking_lot::Mutex;

    /// In-memory `PersistencePort` for tests that drive a call or campaign
    /// run without a database.
    #[derive(Default)]
    pub struct InMemoryPersistence {
        pub events: Mutex<Vec<(String, String, String)>>,
        pub phases: Mutex<Vec<(String, String)>>,
        pub finalized: Mutex<Vec<FinalizedCall>>,
        pub retries: Mutex<Vec<(i64, DateTime<Utc>)>>,
        pub due_contacts: Mutex<Vec<ContactRow>>,
    }

    impl InMemoryPersistence {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_due_contacts(self, contacts: Vec<ContactRow>) -> Self {
            *self.due_contacts.lock() = contacts;
            self
        }
    }

    #[async_trait]
    impl PersistencePort for InMemoryPersistence {
        async fn fetch_due_contacts(&self, _campaign_id: &str, limit: usize) -> Result<Vec<ContactRow>> {
            Ok(self.due_contacts.lock().iter().take(limit).cloned().collect())
        }

        async fn create_call_record(&self, _record: NewCallRecord) -> Result<()> {
            Ok(())
        }

        async fn update_call_phase(&self, call_id: &str, phase: &str) -> Result<()> {
            self.phases.lock().push((call_id.to_string(), phase.to_string()));
            Ok(())
        }

        async fn append_call_event(&self, call_id: &str, event_type: &str, detail: &str) -> Result<()> {
            self.events.lock().push((call_id.to_string(), event_type.to_string(), detail.to_string()));
            Ok(())
        }

        async fn finalize_call(&self, finalized: FinalizedCall) -> Result<()> {
            self.finalized.lock().push(finalized);
            Ok(())
        }

        async fn schedule_retry(&self, contact_id: i64, next_attempt_at: DateTime<Utc>) -> Result<()> {
            self.retries.lock().push((contact_id, next_attempt_at));
            Ok(())
        }
    }
}
