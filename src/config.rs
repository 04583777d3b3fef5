//! Layered configuration for the orchestrator.
//!
//! Mirrors the teacher's `CallCenterConfig`: plain nested `Default`-able
//! structs, loaded from a TOML file and overridable by environment
//! variables, validated once at startup rather than scattered through the
//! call path. Legal-hours windows, retry policy, barge-in thresholds, and
//! phase timeouts all live here as data, per spec §6.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VoicebotError};

/// Top-level configuration for the orchestrator process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoicebotConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub softswitch: SoftswitchConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub campaign: CampaignConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Default for VoicebotConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            softswitch: SoftswitchConfig::default(),
            speech: SpeechConfig::default(),
            campaign: CampaignConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl VoicebotConfig {
    /// Parse a TOML configuration file, then overlay `VOICEBOT_*` environment
    /// overrides, then validate.
    pub fn load(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| VoicebotError::InvalidConfiguration {
            field: "path".into(),
            reason: format!("cannot read {path}: {e}"),
        })?;
        let mut config: VoicebotConfig = toml::from_str(&text).map_err(|e| {
            VoicebotError::InvalidConfiguration { field: "toml".into(), reason: e.to_string() }
        })?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("VOICEBOT_MAX_CONCURRENT_CALLS") {
            if let Ok(n) = v.parse() {
                self.campaign.max_concurrent_calls = n;
            }
        }
        if let Ok(v) = std::env::var("VOICEBOT_DATABASE_URL") {
            self.database.url = v;
        }
    }

    /// Validate cross-field invariants that `serde` alone cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.campaign.max_concurrent_calls == 0 {
            return Err(VoicebotError::InvalidConfiguration {
                field: "campaign.max_concurrent_calls".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.softswitch.event_host.is_empty() || self.softswitch.api_host.is_empty() {
            return Err(VoicebotError::InvalidConfiguration {
                field: "softswitch.{event_host,api_host}".into(),
                reason: "must not be empty".into(),
            });
        }
        for (name, window) in &self.campaign.legal_hours {
            for (start, end) in &window.intervals {
                if end <= start {
                    return Err(VoicebotError::InvalidConfiguration {
                        field: format!("campaign.legal_hours.{name}"),
                        reason: format!("interval {start}-{end} is empty or inverted"),
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub instance_name: String,
    pub rtp_priming_ms: u64,
    pub max_call_duration_secs: u64,
    pub recordings_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            instance_name: "voicebot".into(),
            rtp_priming_ms: 350,
            max_call_duration_secs: 300,
            recordings_dir: "/var/spool/voicebot/recordings".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftswitchConfig {
    pub event_host: String,
    pub event_port: u16,
    pub api_host: String,
    pub api_port: u16,
    pub password: String,
    pub reconnect_initial_backoff_ms: u64,
    pub reconnect_max_backoff_ms: u64,
}

impl Default for SoftswitchConfig {
    fn default() -> Self {
        Self {
            event_host: "127.0.0.1".into(),
            event_port: 8021,
            api_host: "127.0.0.1".into(),
            api_port: 8021,
            password: "ClueCon".into(),
            reconnect_initial_backoff_ms: 200,
            reconnect_max_backoff_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    pub batch_endpoint: String,
    pub stream_endpoint: String,
    pub amd_window_ms: u64,
    pub barge_in_threshold_ms: u64,
    pub barge_in_grace_ms: u64,
    pub barge_in_smooth_delay_ms: u64,
    pub waiting_silence_threshold_ms: u64,
    pub min_speech_ms: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            batch_endpoint: "http://127.0.0.1:9000/transcribe".into(),
            stream_endpoint: "ws://127.0.0.1:9001/stream".into(),
            amd_window_ms: 2300,
            barge_in_threshold_ms: 1700,
            barge_in_grace_ms: 500,
            barge_in_smooth_delay_ms: 500,
            waiting_silence_threshold_ms: 600,
            min_speech_ms: 300,
        }
    }
}

/// A named set of legal-hours intervals for one weekday.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LegalHoursWindow {
    pub intervals: Vec<(NaiveTime, NaiveTime)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignConfig {
    pub max_concurrent_calls: usize,
    pub default_qualification_threshold: f64,
    /// Weekday name (`"mon"`..`"sun"`) -> allowed intervals. Days absent
    /// from the map have no legal window and calls stay queued forever.
    pub legal_hours: HashMap<String, LegalHoursWindow>,
    pub retry_no_answer: RetryPolicy,
    pub retry_busy: RetryPolicy,
    pub default_theme: String,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        let mut legal_hours = HashMap::new();
        for day in ["mon", "tue", "wed", "thu", "fri"] {
            legal_hours.insert(
                day.to_string(),
                LegalHoursWindow {
                    intervals: vec![(
                        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                        NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
                    )],
                },
            );
        }
        Self {
            max_concurrent_calls: 10,
            default_qualification_threshold: 60.0,
            legal_hours,
            retry_no_answer: RetryPolicy { delay: Duration::from_secs(30 * 60), max_attempts: 2 },
            retry_busy: RetryPolicy { delay: Duration::from_secs(5 * 60), max_attempts: 2 },
            default_theme: "default".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite::memory:".into() }
    }
}

/// Maps a `chrono::Weekday` to the config's lower-case 3-letter key.
pub fn weekday_key(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
        Weekday::Sun => "sun",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        VoicebotConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_concurrency_rejected() {
        let mut config = VoicebotConfig::default();
        config.campaign.max_concurrent_calls = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_interval_rejected() {
        let mut config = VoicebotConfig::default();
        config.campaign.legal_hours.insert(
            "mon".into(),
            LegalHoursWindow {
                intervals: vec![(
                    NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                    NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                )],
            },
        );
        assert!(config.validate().is_err());
    }
}
