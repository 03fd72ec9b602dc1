//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `hubdrive.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use hubdrive_adapter_virtual::VirtualHubConfig;
use hubdrive_domain::error::HubDriveError;
use hubdrive_domain::scheme::ControlScheme;

/// Top-level configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Control loop settings.
    pub scheduler: SchedulerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Simulated hub settings.
    pub hub: VirtualHubConfig,
    /// Bindings driven by the control loop.
    pub scheme: ControlScheme,
}

/// Control loop tuning.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Input sampling period in milliseconds.
    pub tick_ms: u64,
    /// Property events buffered per listener.
    pub property_buffer: usize,
    /// Input updates buffered between stdin and the control loop.
    pub input_buffer: usize,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `hubdrive.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if
    /// the resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("hubdrive.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HUBDRIVE_TICK_MS") {
            if let Ok(tick_ms) = val.parse() {
                self.scheduler.tick_ms = tick_ms;
            }
        }
        if let Ok(val) = std::env::var("HUBDRIVE_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.tick_ms == 0 {
            return Err(ConfigError::Validation("tick_ms must be non-zero".to_string()));
        }
        if self.scheduler.property_buffer == 0 || self.scheduler.input_buffer == 0 {
            return Err(ConfigError::Validation("buffers must be non-zero".to_string()));
        }
        self.scheme.validate().map_err(ConfigError::Scheme)?;
        if let Some(hub_id) = self
            .scheme
            .hub_ids()
            .into_iter()
            .find(|hub_id| *hub_id != self.hub.hub_id)
        {
            return Err(ConfigError::Validation(format!(
                "binding targets unknown hub {hub_id}"
            )));
        }
        Ok(())
    }

    /// Return the input sampling period.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.scheduler.tick_ms)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            property_buffer: 64,
            input_buffer: 256,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "hubdrived=info,hubdrive=info".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            logging: LoggingConfig::default(),
            hub: VirtualHubConfig::default(),
            scheme: ControlScheme {
                name: "default".to_string(),
                bindings: Vec::new(),
            },
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// The control scheme breaks a domain invariant.
    #[error("invalid control scheme")]
    Scheme(#[source] HubDriveError),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubdrive_domain::binding::BindingConfig;
    use hubdrive_domain::id::HubId;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.scheduler.tick_ms, 50);
        assert_eq!(config.tick_interval(), Duration::from_millis(50));
        assert_eq!(config.hub.hub_id, HubId::new("virtual"));
        assert_eq!(config.scheme.name, "default");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.scheduler.tick_ms, 50);
        assert!(config.scheme.bindings.is_empty());
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = r#"
            [scheduler]
            tick_ms = 20
            property_buffer = 8

            [logging]
            filter = 'debug'

            [hub]
            hub_id = "train"
            battery_level = 80

            [scheme]
            name = "train"

            [[scheme.bindings]]
            output = { hub_id = "train", port_id = 0 }
            config = { kind = "speed", accelerate = { input = { controller_id = "pad", input_type = "axis", index = 1 }, gain = "exponential" }, max_speed = 80.0, power = 100.0 }

            [[scheme.bindings]]
            output = { hub_id = "train", port_id = 1 }

            [scheme.bindings.config]
            kind = "stepper"
            degree = 90
            speed = 50
            power = 100
            cw = { input = { controller_id = "pad", input_type = "button", index = 0 } }
        "#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.scheduler.tick_ms, 20);
        assert_eq!(config.scheduler.property_buffer, 8);
        assert_eq!(config.scheduler.input_buffer, 256);
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.hub.battery_level, 80);
        assert_eq!(config.scheme.bindings.len(), 2);
        assert!(matches!(
            config.scheme.bindings[1].config,
            BindingConfig::Stepper(_)
        ));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.scheduler.tick_ms, 50);
    }

    #[test]
    fn should_reject_zero_tick() {
        let mut config = Config::default();
        config.scheduler.tick_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_binding_on_unknown_hub() {
        let toml = r#"
            [scheme]
            name = "remote"

            [[scheme.bindings]]
            output = { hub_id = "elsewhere", port_id = 0 }
            config = { kind = "set_angle", input = { input = { controller_id = "pad", input_type = "button", index = 0 } }, angle = 90, speed = 50, power = 50 }
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: binding targets unknown hub elsewhere"
        );
    }

    #[test]
    fn should_reject_invalid_scheme() {
        let toml = r#"
            [scheme]
            name = ""
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Scheme(_))));
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
