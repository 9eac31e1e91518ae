use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Daemon configuration, layered from `wecker.toml` (optional), a local
/// override file, and `WECKER_*` environment variables. Every key has a
/// default, so the clock runs with no config file at all.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Settings {
    pub max_alarms: usize,
    pub poll_period_secs: u64,
    pub error_backoff_secs: u64,
    pub default_snooze_minutes: u32,
    pub alarms_file: PathBuf,
    pub sounds_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_alarms: 10,
            poll_period_secs: 1,
            error_backoff_secs: 5,
            default_snooze_minutes: 5,
            alarms_file: PathBuf::from("alarms.json"),
            sounds_dir: PathBuf::from("sounds"),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("wecker").required(false))
            .add_source(File::with_name("wecker.local").required(false))
            .add_source(Environment::with_prefix("WECKER"))
            .build()?;

        settings.try_deserialize()
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_secs(self.poll_period_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_clocks_scale() {
        let settings = Settings::default();
        assert_eq!(settings.max_alarms, 10);
        assert_eq!(settings.poll_period(), Duration::from_secs(1));
        assert_eq!(settings.error_backoff(), Duration::from_secs(5));
        assert_eq!(settings.default_snooze_minutes, 5);
    }

    #[test]
    fn empty_source_deserializes_via_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.alarms_file, PathBuf::from("alarms.json"));
    }
}
