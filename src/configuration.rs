// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Configuration file handling.

use crate::sensor::MonitoredConditions;
use config::Config;
use log::warn;
use serde_with::{DurationSeconds, serde_as};
use std::path::PathBuf;
use std::time::Duration;

/// Default configuration file.
pub const DEF_CONFIG_FILE: &str = "configuration.yaml";

/// Default Nest REST API data document.
pub const DEF_SNAPSHOT_FILE: &str = "nest.json";

/// Prefix of environment variables overriding configuration settings.
pub const ENV_PREFIX: &str = "NEST";

#[derive(Default, serde::Deserialize, serde::Serialize)]
pub struct Settings {
    pub nest: NestSettings,
    #[serde(default)]
    pub binary_sensors: BinarySensorSettings,
    pub poll: PollSettings,
}

#[derive(Clone, serde::Deserialize, serde::Serialize)]
pub struct NestSettings {
    /// Nest REST API data document served by the snapshot client.
    pub snapshot: PathBuf,
}

impl Default for NestSettings {
    fn default() -> Self {
        Self {
            snapshot: PathBuf::from(DEF_SNAPSHOT_FILE),
        }
    }
}

#[derive(Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct BinarySensorSettings {
    /// Attribute names to create binary sensors for. Missing or empty: all attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitored_conditions: Option<Vec<String>>,
}

impl BinarySensorSettings {
    pub fn monitored_conditions(&self) -> MonitoredConditions {
        MonitoredConditions::from_names(self.monitored_conditions.clone())
    }
}

/// Sensor polling settings.
#[serde_as]
#[derive(Clone, Copy, serde::Deserialize, serde::Serialize)]
pub struct PollSettings {
    /// How often all binary sensors are updated
    #[serde_as(as = "DurationSeconds")]
    #[serde(rename = "interval_sec")]
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
        }
    }
}

/// Load the configuration settings.
///
/// The application provides default values which can be overriden in the following order:
/// 1. Configuration settings in the yaml configuration file specified in `filename`
/// 2. Environment variables with prefix `NEST_` (works only for cfg keys not containing a `_`!)
pub fn get_configuration(filename: Option<&str>) -> Result<Settings, config::ConfigError> {
    // default configuration
    let mut config = Config::builder().add_source(Config::try_from(&Settings::default())?);
    // read optional configuration file to override defaults
    if let Some(filename) = filename {
        config = config.add_source(config::File::with_name(filename));
    }

    // Add in settings from the environment (with a prefix of NEST)
    // E.g. `NEST_NEST_SNAPSHOT=/data/nest.json` would set the `nest.snapshot` key
    let config = config
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("_"))
        .build()?;

    let settings: Settings = config.try_deserialize()?;

    check_cfg_values(settings)
}

fn check_cfg_values(mut settings: Settings) -> Result<Settings, config::ConfigError> {
    if settings.poll.interval.as_secs() < 1 {
        warn!("Invalid poll interval, using default.");
        settings.poll = Default::default();
    }

    if settings.nest.snapshot.as_os_str().is_empty() {
        return Err(config::ConfigError::Message(
            "nest.snapshot must not be empty".into(),
        ));
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "nest-binary-sensors-{}-{name}.yaml",
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).expect("temp config file");
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn defaults_without_configuration_file() {
        let settings = get_configuration(None).expect("default configuration");
        assert_eq!(PathBuf::from(DEF_SNAPSHOT_FILE), settings.nest.snapshot);
        assert_eq!(Duration::from_secs(30), settings.poll.interval);
        assert_eq!(
            MonitoredConditions::All,
            settings.binary_sensors.monitored_conditions()
        );
    }

    #[test]
    fn configuration_file_overrides_defaults() {
        let path = write_config(
            "override",
            "nest:\n  snapshot: /tmp/home.json\nbinary_sensors:\n  monitored_conditions:\n    - online\n    - away\npoll:\n  interval_sec: 10\n",
        );
        let settings = get_configuration(path.to_str()).expect("valid configuration");
        let _ = std::fs::remove_file(&path);

        assert_eq!(PathBuf::from("/tmp/home.json"), settings.nest.snapshot);
        assert_eq!(Duration::from_secs(10), settings.poll.interval);
        assert_eq!(
            MonitoredConditions::Selected(vec!["online".into(), "away".into()]),
            settings.binary_sensors.monitored_conditions()
        );
    }

    #[test]
    fn empty_monitored_conditions_select_all() {
        let path = write_config(
            "empty-conditions",
            "binary_sensors:\n  monitored_conditions: []\n",
        );
        let settings = get_configuration(path.to_str()).expect("valid configuration");
        let _ = std::fs::remove_file(&path);

        assert_eq!(
            MonitoredConditions::All,
            settings.binary_sensors.monitored_conditions()
        );
    }

    #[test]
    fn invalid_poll_interval_uses_default() {
        let path = write_config("interval", "poll:\n  interval_sec: 0\n");
        let settings = get_configuration(path.to_str()).expect("valid configuration");
        let _ = std::fs::remove_file(&path);

        assert_eq!(Duration::from_secs(30), settings.poll.interval);
    }
}
