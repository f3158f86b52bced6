use anyhow::{Result, anyhow};
use chrono::FixedOffset;
use dotenvy::dotenv;
use std::{env, fmt::Display, str::FromStr, time::Duration};

use crate::tracker::{ReentryPolicy, TrackerSettings};

const MAX_DUPLICATE_SCAN_WINDOW_SECS: u64 = 3600;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub database_url: String,
    pub db_max_connections: u32,

    pub api_prefix: String,

    // Attendance
    pub site_utc_offset: FixedOffset,
    pub reentry_policy: ReentryPolicy,
    pub duplicate_scan_window_secs: u64,

    // Employee lookup cache
    pub employee_cache_ttl_secs: u64,
    pub employee_cache_capacity: u64,

    // Rate limiting
    pub rate_check_per_min: u32,
    pub rate_read_per_min: u32,

    // Logging
    pub log_dir: String,
    pub log_level: tracing::Level,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; missing optional keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));

        let offset_minutes: i32 = parse_or(&lookup, "SITE_UTC_OFFSET_MINUTES", 0)?;
        let site_utc_offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| anyhow!("SITE_UTC_OFFSET_MINUTES out of range: {offset_minutes}"))?;

        let duplicate_scan_window_secs: u64 = parse_or(&lookup, "DUPLICATE_SCAN_WINDOW_SECS", 0)?;
        if duplicate_scan_window_secs > MAX_DUPLICATE_SCAN_WINDOW_SECS {
            return Err(anyhow!(
                "DUPLICATE_SCAN_WINDOW_SECS out of range: {duplicate_scan_window_secs} (max {MAX_DUPLICATE_SCAN_WINDOW_SECS})"
            ));
        }

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,

            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),

            site_utc_offset,
            reentry_policy: parse_or(&lookup, "REENTRY_POLICY", ReentryPolicy::NewSession)?,
            duplicate_scan_window_secs,

            employee_cache_ttl_secs: parse_or(&lookup, "EMPLOYEE_CACHE_TTL_SECS", 300)?, // default 5 min
            employee_cache_capacity: parse_or(&lookup, "EMPLOYEE_CACHE_CAPACITY", 50_000)?,

            rate_check_per_min: parse_or(&lookup, "RATE_CHECK_PER_MIN", 120)?,
            rate_read_per_min: parse_or(&lookup, "RATE_READ_PER_MIN", 600)?,

            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_level: parse_or(&lookup, "LOG_LEVEL", tracing::Level::DEBUG)?,
        })
    }

    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            utc_offset: self.site_utc_offset,
            reentry: self.reentry_policy,
            // bounded by MAX_DUPLICATE_SCAN_WINDOW_SECS when loaded
            duplicate_window: chrono::Duration::seconds(
                i64::try_from(self.duplicate_scan_window_secs).unwrap_or(0),
            ),
        }
    }

    pub fn employee_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.employee_cache_ttl_secs)
    }
}

fn parse_or<T>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid value for {key}: '{raw}': {e}")),
    }
}
