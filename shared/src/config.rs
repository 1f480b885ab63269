//! Configuration management for Lambda functions.

use std::env;

use chrono_tz::Tz;

use crate::calendar::WeekStart;
use crate::{Error, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Full connection string; takes precedence over host/secret lookup
    pub database_url: Option<String>,
    /// Database host
    pub db_host: Option<String>,
    /// Database name
    pub db_name: String,
    /// ARN of the secret containing database credentials
    pub db_secret_arn: Option<String>,
    /// Value of the Access-Control-Allow-Origin header
    pub allowed_origin: String,
    /// First day of the week in calendar grids
    pub week_start: WeekStart,
    /// Zone used for day bucketing and reminder text
    pub display_timezone: Tz,
    /// SNS topic for reminder notifications
    pub notification_topic_arn: Option<String>,
    /// Suppress repeat reminders for the same event within one process
    pub reminder_dedup: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let week_start = match lookup("WEEK_START") {
            Some(value) => value.parse()?,
            None => WeekStart::default(),
        };

        let display_timezone = match lookup("DISPLAY_TIMEZONE") {
            Some(value) => value
                .parse::<Tz>()
                .map_err(|e| Error::Config(format!("Invalid DISPLAY_TIMEZONE: {}", e)))?,
            None => Tz::UTC,
        };

        let reminder_dedup = lookup("REMINDER_DEDUP")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            database_url: lookup("DATABASE_URL"),
            db_host: lookup("DB_HOST"),
            db_name: lookup("DB_NAME").unwrap_or_else(|| "calendar".to_string()),
            db_secret_arn: lookup("DB_SECRET_ARN"),
            allowed_origin: lookup("ALLOWED_ORIGIN").unwrap_or_else(|| "*".to_string()),
            week_start,
            display_timezone,
            notification_topic_arn: lookup("NOTIFICATION_TOPIC_ARN"),
            reminder_dedup,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            db_host: None,
            db_name: "calendar".to_string(),
            db_secret_arn: None,
            allowed_origin: "*".to_string(),
            week_start: WeekStart::default(),
            display_timezone: Tz::UTC,
            notification_topic_arn: None,
            reminder_dedup: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.db_name, "calendar");
        assert_eq!(config.allowed_origin, "*");
        assert_eq!(config.week_start, WeekStart::Sunday);
        assert_eq!(config.display_timezone, Tz::UTC);
        assert!(!config.reminder_dedup);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("WEEK_START", "Monday"),
            ("DISPLAY_TIMEZONE", "Europe/Berlin"),
            ("REMINDER_DEDUP", "true"),
            ("ALLOWED_ORIGIN", "http://localhost:5173"),
        ]))
        .unwrap();
        assert_eq!(config.week_start, WeekStart::Monday);
        assert_eq!(config.display_timezone, chrono_tz::Europe::Berlin);
        assert!(config.reminder_dedup);
        assert_eq!(config.allowed_origin, "http://localhost:5173");
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        let err = Config::from_lookup(lookup_from(&[("DISPLAY_TIMEZONE", "Mars/Olympus")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_lookup(lookup_from(&[("WEEK_START", "friday")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
