//! Legal-calling-hours gate (spec §4.5): a pure function of the
//! configured windows and the current local time, kept free of any I/O
//! so it's trivial to test exhaustively.

use chrono::{DateTime, Local, TimeZone};

use crate::config::CampaignConfig;

/// Whether a call may be placed right now under the campaign's legal
/// hours. Days with no configured window are never callable.
pub fn is_within_legal_hours<Tz: TimeZone>(config: &CampaignConfig, now: DateTime<Tz>) -> bool {
    let local = now.with_timezone(&Local);
    let key = crate::config::weekday_key(local.date_naive().weekday());
    let Some(window) = config.legal_hours.get(key) else {
        return false;
    };
    let time = local.time();
    window.intervals.iter().any(|(start, end)| time >= *start && time < *end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LegalHoursWindow;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn config_with(day: &str, start_h: u32, end_h: u32) -> CampaignConfig {
        let mut legal_hours = HashMap::new();
        legal_hours.insert(
            day.to_string(),
            LegalHoursWindow {
                intervals: vec![(
                    chrono::NaiveTime::from_hms_opt(start_h, 0, 0).unwrap(),
                    chrono::NaiveTime::from_hms_opt(end_h, 0, 0).unwrap(),
                )],
            },
        );
        CampaignConfig {
            max_concurrent_calls: 1,
            default_qualification_threshold: 60.0,
            legal_hours,
            retry_no_answer: crate::config::RetryPolicy {
                delay: std::time::Duration::from_secs(60),
                max_attempts: 1,
            },
            retry_busy: crate::config::RetryPolicy {
                delay: std::time::Duration::from_secs(60),
                max_attempts: 1,
            },
            default_theme: "default".into(),
        }
    }

    #[test]
    fn day_with_no_window_is_never_callable() {
        let config = config_with("mon", 9, 20);
        let tuesday_noon = Local
            .from_local_datetime(&NaiveDate::from_ymd_opt(2026, 7, 28).unwrap().and_hms_opt(12, 0, 0).unwrap())
            .unwrap();
        assert!(!is_within_legal_hours(&config, tuesday_noon));
    }

    #[test]
    fn inside_window_is_callable() {
        let config = config_with("tue", 9, 20);
        let tuesday_noon = Local
            .from_local_datetime(&NaiveDate::from_ymd_opt(2026, 7, 28).unwrap().and_hms_opt(12, 0, 0).unwrap())
            .unwrap();
        assert!(is_within_legal_hours(&config, tuesday_noon));
    }

    #[test]
    fn outside_window_is_not_callable() {
        let config = config_with("tue", 9, 20);
        let tuesday_late = Local
            .from_local_datetime(&NaiveDate::from_ymd_opt(2026, 7, 28).unwrap().and_hms_opt(21, 30, 0).unwrap())
            .unwrap();
        assert!(!is_within_legal_hours(&config, tuesday_late));
    }
}
