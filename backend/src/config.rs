//! Application configuration.
//!
//! Values come from the environment (a `.env` file is honoured) with
//! defaults suitable for a single workstation.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Note choices offered for each row. The empty entry means "no note".
pub const NOTE_OPTIONS: &[&str] = &[
    "",
    "SEND 1/2",
    "SEND 1/3",
    "SEND 6",
    "SEND 12",
    "SEND 18",
    "SEND 24",
    "SEND 30",
    "SEND 36",
    "SEND 48",
    "SEND 60",
    "Other",
];

/// Store codes used until the user saves their own list.
pub const DEFAULT_STORE_CODES: &[&str] = &[
    "AL", "BR", "CW", "DO", "KST", "KIT", "NM", "HAM", "NF", "PIC", "QSW", "SS", "V", "WEB",
    "WBY", "YG", "ZZZ", "DEL",
];

/// Key of the saved store registry.
pub const STORE_CODES_KEY: &str = "storeCodes";

/// Key of the saved progress snapshot.
pub const PROGRESS_KEY: &str = "transferRequestsProgress";

const DEFAULT_DATA_DIR: &str = ".stocktransfer";
const DEFAULT_PROCESSING_DELAY_MS: u64 = 500;
const DEFAULT_NOTIFICATION_TTL_SECS: u64 = 5;

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Directory holding the key-value store files.
    pub data_dir: PathBuf,
    /// Pacing delay before a processed manifest is handed back.
    pub processing_delay: Duration,
    /// Default URL for master-data import.
    pub master_url: Option<String>,
    /// How long a notification stays visible.
    pub notification_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            processing_delay: Duration::from_millis(DEFAULT_PROCESSING_DELAY_MS),
            master_url: None,
            notification_ttl: Duration::from_secs(DEFAULT_NOTIFICATION_TTL_SECS),
        }
    }
}

impl AppConfig {
    /// Build the configuration from `STOCKTRANSFER_*` environment variables.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let data_dir = lookup("STOCKTRANSFER_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let processing_delay = lookup("STOCKTRANSFER_PROCESSING_DELAY_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.processing_delay);

        let master_url = lookup("STOCKTRANSFER_MASTER_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let notification_ttl = lookup("STOCKTRANSFER_NOTIFICATION_TTL_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.notification_ttl);

        Self {
            data_dir,
            processing_delay,
            master_url,
            notification_ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.processing_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let vars: HashMap<&str, &str> = [
            ("STOCKTRANSFER_DATA_DIR", "/tmp/transfers"),
            ("STOCKTRANSFER_PROCESSING_DELAY_MS", "0"),
            ("STOCKTRANSFER_MASTER_URL", " https://example.com/master.csv "),
            ("STOCKTRANSFER_NOTIFICATION_TTL_SECS", "soon"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/transfers"));
        assert_eq!(config.processing_delay, Duration::ZERO);
        assert_eq!(config.master_url.as_deref(), Some("https://example.com/master.csv"));
        assert_eq!(config.notification_ttl, Duration::from_secs(5));
    }

    #[test]
    fn test_note_options_end_with_other() {
        assert_eq!(NOTE_OPTIONS.first(), Some(&""));
        assert_eq!(NOTE_OPTIONS.last(), Some(&crate::models::OTHER_NOTE));
    }
}
