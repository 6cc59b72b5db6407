//! # Client Configuration
//!
//! Read once at startup. Every field has a default, so an empty document is
//! a valid configuration.
//!
//! ```toml
//! [events]
//! fault_channel_capacity = 256
//!
//! [rotation]
//! default_mode = "sync"
//! turn_speed = { fixed = 30.0 }
//! render_smoothing = { lerp = 0.5 }
//! history_capacity = 64
//!
//! [network]
//! position_resend_interval = 20
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use pivot_events::DEFAULT_FAULT_CAPACITY;
use pivot_network::DEFAULT_POSITION_RESEND_INTERVAL;
use pivot_rotation::RotationSettings;

use crate::error::{ConfigError, ConfigResult};

/// `[events]` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Fault reports buffered before new ones are dropped.
    pub fault_channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            fault_channel_capacity: DEFAULT_FAULT_CAPACITY,
        }
    }
}

/// `[network]` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Ticks after which an unchanged position is sent again.
    pub position_resend_interval: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            position_resend_interval: DEFAULT_POSITION_RESEND_INTERVAL,
        }
    }
}

/// Complete client configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PivotConfig {
    /// Event pipeline.
    pub events: EventsConfig,
    /// Rotation engine defaults.
    pub rotation: RotationSettings,
    /// Packet gate and movement reporting.
    pub network: NetworkConfig,
}

impl PivotConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Malformed TOML, unknown sections, or out-of-range values.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the file at `path`.
    ///
    /// # Errors
    ///
    /// I/O failure, or any error of [`PivotConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// The first out-of-range value found.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.events.fault_channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "events.fault_channel_capacity must be at least 1".into(),
            ));
        }
        if self.network.position_resend_interval == 0 {
            return Err(ConfigError::Invalid(
                "network.position_resend_interval must be at least 1".into(),
            ));
        }
        self.rotation.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pivot_rotation::{RenderSmoothing, RotationMode, TurnSpeed};

    #[test]
    fn empty_document_is_default() {
        let config = PivotConfig::from_toml_str("").unwrap();
        assert_eq!(config, PivotConfig::default());
        assert_eq!(config.events.fault_channel_capacity, 256);
        assert_eq!(config.network.position_resend_interval, 20);
    }

    #[test]
    fn every_section_parses() {
        let config = PivotConfig::from_toml_str(
            r#"
            [events]
            fault_channel_capacity = 16

            [rotation]
            default_mode = "silent"
            turn_speed = { humanized = { mean = 25.0, spread = 5.0 } }
            render_smoothing = { step = 40.0 }
            history_capacity = 8
            rng_seed = 7

            [network]
            position_resend_interval = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.events.fault_channel_capacity, 16);
        assert_eq!(config.rotation.default_mode, RotationMode::Silent);
        assert_eq!(
            config.rotation.turn_speed,
            TurnSpeed::Humanized {
                mean: 25.0,
                spread: 5.0
            }
        );
        assert_eq!(config.rotation.render_smoothing, RenderSmoothing::Step(40.0));
        assert_eq!(config.rotation.history_capacity, 8);
        assert_eq!(config.rotation.rng_seed, 7);
        assert_eq!(config.network.position_resend_interval, 10);
    }

    #[test]
    fn partial_tables_keep_defaults() {
        let config = PivotConfig::from_toml_str("[rotation]\nturn_speed = { fixed = 30.0 }\n").unwrap();
        assert_eq!(config.rotation.turn_speed, TurnSpeed::Fixed(30.0));
        assert_eq!(config.rotation.default_mode, RotationMode::Sync);
        assert_eq!(config.events, EventsConfig::default());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = PivotConfig::from_toml_str("[events]\nfault_channel_capacity = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn bad_rotation_policy_is_rejected() {
        let err = PivotConfig::from_toml_str("[rotation]\nturn_speed = { fixed = -1.0 }\n").unwrap_err();
        assert!(matches!(err, ConfigError::Rotation(_)));
    }

    #[test]
    fn unknown_section_is_a_parse_error() {
        let err = PivotConfig::from_toml_str("[metrics]\nenabled = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = PivotConfig::load("/nonexistent/pivot.toml").unwrap_err();
        match err {
            ConfigError::Io { path, .. } => assert!(path.ends_with("pivot.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
