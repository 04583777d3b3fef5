//! Campaign runner (spec §4.5): pulls due contacts, respects legal hours
//! and the concurrency cap, originates calls, and supervises each call's
//! task so a panic is recorded as a failed call rather than taking the
//! runner down.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::call::{run_call, CallDeps, CallSession, FinalStatus};
use crate::campaign::legal_hours::is_within_legal_hours;
use crate::campaign::retry::next_attempt;
use crate::config::VoicebotConfig;
use crate::error::Result;
use crate::persistence::{NewCallRecord, PersistencePort};

pub struct CampaignRunner {
    config: VoicebotConfig,
    deps: CallDeps,
    semaphore: Arc<Semaphore>,
}

impl CampaignRunner {
    pub fn new(config: VoicebotConfig, deps: CallDeps) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.campaign.max_concurrent_calls));
        Self { config, deps, semaphore }
    }

    /// Run one poll-and-dispatch cycle for a campaign: pull due contacts
    /// up to the available concurrency, and spawn a call for each.
    pub async fn run_once(&self, campaign_id: &str, cancel: CancellationToken) -> Result<usize> {
        if !is_within_legal_hours(&self.config.campaign, Utc::now()) {
            info!(campaign_id, "outside legal hours, skipping poll");
            return Ok(0);
        }

        let available = self.semaphore.available_permits();
        if available == 0 {
            return Ok(0);
        }

        let contacts = self.deps.persistence.fetch_due_contacts(campaign_id, available).await?;
        let mut dispatched = 0;
        for contact in contacts {
            let permit = match Arc::clone(&self.semaphore).try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => break,
            };

            let call_id = uuid::Uuid::new_v4().to_string();
            self.deps
                .persistence
                .create_call_record(NewCallRecord {
                    call_id: call_id.clone(),
                    campaign_id: campaign_id.to_string(),
                    contact_id: contact.id,
                })
                .await?;

            let mut application_vars = std::collections::HashMap::new();
            application_vars.insert("origination_uuid".to_string(), call_id.clone());
            let originated = self
                .deps
                .softswitch
                .originate(&contact.phone_number, &contact.caller_id, &application_vars)
                .await;

            let originated_call_id = match originated {
                Ok(id) => id,
                Err(e) => {
                    warn!(call_id, error = %e, "originate failed");
                    self.deps
                        .persistence
                        .finalize_call(crate::persistence::FinalizedCall {
                            call_id,
                            final_status: FinalStatus::Failed.as_str().to_string(),
                            qualification_score: None,
                        })
                        .await?;
                    drop(permit);
                    continue;
                }
            };

            let deps = self.deps.clone();
            let config = self.config.clone();
            let contact_id = contact.id;
            let attempts = contact.attempts as u32;
            let cancel = cancel.clone();

            tokio::spawn(async move {
                let _permit = permit;
                let mut session = CallSession::new(
                    originated_call_id.clone(),
                    contact.campaign_id.clone(),
                    contact_id,
                    contact.phone_number.clone(),
                    contact.caller_id.clone(),
                    config.campaign.default_theme.clone(),
                    deps.scenario.entry_step.clone(),
                );
                let max_duration = Duration::from_secs(config.general.max_call_duration_secs);

                let result = tokio::spawn({
                    let deps = deps.clone();
                    let cancel = cancel.clone();
                    async move { run_call(&mut session, &deps, max_duration, cancel).await.map(|s| (session, s)) }
                })
                .await;

                let (session, final_status) = match result {
                    Ok(Ok(pair)) => pair,
                    Ok(Err(e)) => {
                        error!(call_id = %originated_call_id, error = %e, "call ended in error");
                        let _ = deps
                            .persistence
                            .finalize_call(crate::persistence::FinalizedCall {
                                call_id: originated_call_id.clone(),
                                final_status: FinalStatus::Failed.as_str().to_string(),
                                qualification_score: None,
                            })
                            .await;
                        return;
                    }
                    Err(join_err) => {
                        error!(call_id = %originated_call_id, error = %join_err, "call task panicked");
                        let _ = deps
                            .persistence
                            .finalize_call(crate::persistence::FinalizedCall {
                                call_id: originated_call_id.clone(),
                                final_status: FinalStatus::Failed.as_str().to_string(),
                                qualification_score: None,
                            })
                            .await;
                        return;
                    }
                };

                if final_status.is_retryable() {
                    if let Some(next) = next_attempt(&config.campaign, &final_status, attempts) {
                        let _ = deps.persistence.schedule_retry(contact_id, next).await;
                    }
                }

                let _ = crate::call::phases::terminating::run(&session, &deps, final_status, true).await;
            });

            dispatched += 1;
        }

        Ok(dispatched)
    }
}
