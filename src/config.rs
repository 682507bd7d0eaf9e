//! Environment-based configuration.
//!
//! All configuration is supplied via environment variables (optionally from
//! a `.env` file loaded by the binary) and read once at startup.

use crate::error::ConfigError;
use std::path::PathBuf;

/// Default Gemini model, matching the planner's original deployment
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default spreadsheet range covering the grocery log columns
pub const DEFAULT_SHEET_RANGE: &str = "Sheet1!A:K";

/// Default memory bank path, relative to the working directory
pub const DEFAULT_MEMORY_PATH: &str = "memory_bank.json";

/// Default variety window: a meal must not repeat within this many days
pub const DEFAULT_VARIETY_WINDOW_DAYS: i64 = 14;

/// Runtime configuration for one planner invocation
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key (`GEMINI_API_KEY`)
    pub gemini_api_key: String,
    /// Model name (`GEMINI_MODEL`)
    pub model: String,
    /// Google Sheets API key (`GOOGLE_SHEETS_API_KEY`)
    pub sheets_api_key: String,
    /// Spreadsheet ID (`GOOGLE_SHEET_ID`)
    pub spreadsheet_id: String,
    /// Range to fetch (`GOOGLE_SHEET_RANGE`)
    pub sheet_range: String,
    /// Discord webhook URL (`DISCORD_WEBHOOK_URL`)
    pub webhook_url: String,
    /// Path to the memory bank file (`MEMORY_BANK_PATH`)
    pub memory_path: PathBuf,
    /// Variety window in days (`VARIETY_WINDOW_DAYS`)
    pub variety_window_days: i64,
}

impl Config {
    /// Read configuration from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let variety_window_days = match optional("VARIETY_WINDOW_DAYS") {
            Some(raw) => raw.parse::<i64>().map_err(|_| ConfigError::Invalid {
                var: "VARIETY_WINDOW_DAYS",
                value: raw,
            })?,
            None => DEFAULT_VARIETY_WINDOW_DAYS,
        };

        Ok(Self {
            gemini_api_key: required("GEMINI_API_KEY")?,
            model: optional("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            sheets_api_key: required("GOOGLE_SHEETS_API_KEY")?,
            spreadsheet_id: required("GOOGLE_SHEET_ID")?,
            sheet_range: optional("GOOGLE_SHEET_RANGE")
                .unwrap_or_else(|| DEFAULT_SHEET_RANGE.to_string()),
            webhook_url: required("DISCORD_WEBHOOK_URL")?,
            memory_path: optional("MEMORY_BANK_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MEMORY_PATH)),
            variety_window_days,
        })
    }
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    optional(var).ok_or(ConfigError::Missing(var))
}

fn optional(var: &'static str) -> Option<String> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}
