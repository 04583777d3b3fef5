//! SQLite implementation of `PersistencePort`, grounded in the teacher's
//! `AsyncAgentDatabase`: a pooled connection, `sqlx::query_as` with
//! `FromRow` structs rather than the compile-time-checked macros, and
//! explicit transactions for operations that touch more than one table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::Result;
use crate::persistence::models::ContactRow;
use crate::persistence::{FinalizedCall, NewCallRecord, PersistencePort};

pub struct SqlitePersistence {
    pool: SqlitePool,
}

impl SqlitePersistence {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(url).await?;
        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
            crate::error::VoicebotError::Persistence { reason: format!("migration failed: {e}") }
        })?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl PersistencePort for SqlitePersistence {
    async fn fetch_due_contacts(&self, campaign_id: &str, limit: usize) -> Result<Vec<ContactRow>> {
        let rows = sqlx::query_as::<_, ContactRow>(
            "SELECT id, campaign_id, phone_number, caller_id, attempts, next_attempt_at, status \
             FROM contacts \
             WHERE campaign_id = ?1 AND status = 'pending' AND next_attempt_at <= ?2 \
             ORDER BY next_attempt_at ASC LIMIT ?3",
        )
        .bind(campaign_id)
        .bind(Utc::now())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_call_record(&self, record: NewCallRecord) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO call_records (call_id, campaign_id, contact_id, phase, started_at) \
             VALUES (?1, ?2, ?3, 'amd', ?4)",
        )
        .bind(&record.call_id)
        .bind(&record.campaign_id)
        .bind(record.contact_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        sqlx::query("UPDATE contacts SET status = 'in_progress', attempts = attempts + 1 WHERE id = ?1")
            .bind(record.contact_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_call_phase(&self, call_id: &str, phase: &str) -> Result<()> {
        sqlx::query("UPDATE call_records SET phase = ?1 WHERE call_id = ?2")
            .bind(phase)
            .bind(call_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn append_call_event(&self, call_id: &str, event_type: &str, detail: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO call_events (call_id, event_type, detail, occurred_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(call_id)
        .bind(event_type)
        .bind(detail)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn finalize_call(&self, finalized: FinalizedCall) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "UPDATE call_records SET final_status = ?1, qualification_score = ?2, ended_at = ?3, phase = 'ended' \
             WHERE call_id = ?4",
        )
        .bind(&finalized.final_status)
        .bind(finalized.qualification_score)
        .bind(Utc::now())
        .bind(&finalized.call_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "UPDATE contacts SET status = 'done' \
             WHERE id = (SELECT contact_id FROM call_records WHERE call_id = ?1)",
        )
        .bind(&finalized.call_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn schedule_retry(&self, contact_id: i64, next_attempt_at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE contacts SET status = 'pending', next_attempt_at = ?1 WHERE id = ?2")
            .bind(next_attempt_at)
            .bind(contact_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
