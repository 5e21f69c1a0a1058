//! Service configuration read from the environment.
//!
//! `dotenvy` merges an optional `.env` file first, so local runs can keep
//! their settings next to the binary.

use chrono::FixedOffset;
use std::path::PathBuf;
use thiserror::Error;

/// Asia/Kolkata. The zone has no daylight saving, so a fixed offset is exact.
const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// SQLite file holding the application documents.
    pub database_path: PathBuf,
    /// Image store directory, also served under `/uploads`.
    pub uploads_dir: PathBuf,
    /// Upper bound for JSON bodies; base64 photos are large.
    pub json_limit_bytes: usize,
    /// Zone used for the `Date`/`Time` stamps and for "today".
    pub record_offset: FixedOffset,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("METER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or(&lookup, "METER_PORT", 8080u16)?;
        let database_path = lookup("METER_DATABASE")
            .unwrap_or_else(|| "meter_applications.sqlite".to_string())
            .into();
        let uploads_dir = lookup("METER_UPLOADS_DIR")
            .unwrap_or_else(|| "uploads".to_string())
            .into();
        let json_limit_mb = parse_or(&lookup, "METER_JSON_LIMIT_MB", 25usize)?;
        let offset_minutes =
            parse_or(&lookup, "METER_UTC_OFFSET_MINUTES", DEFAULT_UTC_OFFSET_MINUTES)?;
        let record_offset = (offset_minutes.abs() <= 14 * 60)
            .then(|| FixedOffset::east_opt(offset_minutes * 60))
            .flatten()
            .ok_or_else(|| ConfigError::Invalid {
                name: "METER_UTC_OFFSET_MINUTES",
                value: offset_minutes.to_string(),
                reason: "offset must be within +/-14 hours".to_string(),
            })?;

        Ok(Self {
            host,
            port,
            database_path,
            uploads_dir,
            json_limit_bytes: json_limit_mb * 1024 * 1024,
            record_offset,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
