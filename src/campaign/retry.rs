//! Retry scheduling (spec §4.5): map a call's final status to whether and
//! when it should be retried, per the campaign's configured policy.

use chrono::{DateTime, Utc};

use crate::call::session::FinalStatus;
use crate::config::{CampaignConfig, RetryPolicy};

/// `None` means no retry; the contact's attempt is final.
pub fn next_attempt(config: &CampaignConfig, final_status: &FinalStatus, attempts_so_far: u32) -> Option<DateTime<Utc>> {
    let policy: &RetryPolicy = match final_status {
        FinalStatus::Busy => &config.retry_busy,
        FinalStatus::NoAnswer => &config.retry_no_answer,
        _ => return None,
    };
    if attempts_so_far >= policy.max_attempts {
        return None;
    }
    Some(Utc::now() + chrono::Duration::from_std(policy.delay).unwrap_or(chrono::Duration::zero()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> CampaignConfig {
        CampaignConfig {
            max_concurrent_calls: 1,
            default_qualification_threshold: 60.0,
            legal_hours: Default::default(),
            retry_no_answer: RetryPolicy { delay: Duration::from_secs(1800), max_attempts: 2 },
            retry_busy: RetryPolicy { delay: Duration::from_secs(300), max_attempts: 2 },
            default_theme: "default".into(),
        }
    }

    #[test]
    fn no_answer_schedules_a_retry_under_the_cap() {
        assert!(next_attempt(&config(), &FinalStatus::NoAnswer, 1).is_some());
    }

    #[test]
    fn exhausted_attempts_stop_retrying() {
        assert!(next_attempt(&config(), &FinalStatus::NoAnswer, 2).is_none());
    }

    #[test]
    fn terminal_outcomes_never_retry() {
        assert!(next_attempt(&config(), &FinalStatus::Qualified, 0).is_none());
        assert!(next_attempt(&config(), &FinalStatus::NotQualified, 0).is_none());
        assert!(next_attempt(&config(), &FinalStatus::Failed, 0).is_none());
    }
}
