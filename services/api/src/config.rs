//! API service configuration
//!
//! Loaded once at startup from `API_*` environment variables through the
//! `config` crate, then injected into [`AppState`](crate::state::AppState).

use chrono::FixedOffset;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Largest offset accepted for the business timezone, just under a day
pub const MAX_UTC_OFFSET_MINUTES: i32 = 1439;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Whether the in-process auto-expire job runs
    pub expire_job_enabled: bool,
    /// Six-field cron expression for the auto-expire job
    pub expire_schedule: String,
    /// Offset of the hall's local time from UTC, used for reports and the dashboard
    pub business_utc_offset_minutes: i32,
}

impl ApiConfig {
    /// Create a new ApiConfig from environment variables
    ///
    /// # Environment Variables
    /// - `API_BIND_ADDRESS` (default: `0.0.0.0:3001`)
    /// - `API_EXPIRE_JOB_ENABLED` (default: `true`)
    /// - `API_EXPIRE_SCHEDULE` (default: `0 * * * * *`, every minute)
    /// - `API_BUSINESS_UTC_OFFSET_MINUTES` (default: `0`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: ApiConfig = Config::builder()
            .set_default("bind_address", "0.0.0.0:3001")?
            .set_default("expire_job_enabled", true)?
            .set_default("expire_schedule", "0 * * * * *")?
            .set_default("business_utc_offset_minutes", 0_i64)?
            .add_source(Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.business_offset()?;
        Ok(config)
    }

    /// The business timezone as a fixed offset
    pub fn business_offset(&self) -> Result<FixedOffset, ConfigError> {
        let minutes = self.business_utc_offset_minutes;
        if minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::Message(format!(
                "API_BUSINESS_UTC_OFFSET_MINUTES must be within ±{}, got {}",
                MAX_UTC_OFFSET_MINUTES, minutes
            )));
        }
        FixedOffset::east_opt(minutes * 60).ok_or_else(|| {
            ConfigError::Message(format!("invalid UTC offset of {} minutes", minutes))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        unsafe {
            std::env::remove_var("API_BIND_ADDRESS");
            std::env::remove_var("API_EXPIRE_JOB_ENABLED");
            std::env::remove_var("API_EXPIRE_SCHEDULE");
            std::env::remove_var("API_BUSINESS_UTC_OFFSET_MINUTES");
        }
    }

    #[test]
    #[serial]
    fn test_api_config_defaults() {
        clear_env();

        let config = ApiConfig::from_env().unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3001");
        assert!(config.expire_job_enabled);
        assert_eq!(config.expire_schedule, "0 * * * * *");
        assert_eq!(config.business_offset().unwrap(), FixedOffset::east_opt(0).unwrap());
    }

    #[test]
    #[serial]
    fn test_api_config_custom_values() {
        clear_env();
        unsafe {
            std::env::set_var("API_BIND_ADDRESS", "127.0.0.1:8080");
            std::env::set_var("API_EXPIRE_JOB_ENABLED", "false");
            std::env::set_var("API_BUSINESS_UTC_OFFSET_MINUTES", "420");
        }

        let config = ApiConfig::from_env().unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert!(!config.expire_job_enabled);
        assert_eq!(
            config.business_offset().unwrap(),
            FixedOffset::east_opt(7 * 3600).unwrap()
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_api_config_rejects_out_of_range_offset() {
        clear_env();
        unsafe {
            std::env::set_var("API_BUSINESS_UTC_OFFSET_MINUTES", "1440");
        }

        assert!(ApiConfig::from_env().is_err());

        clear_env();
    }
}
