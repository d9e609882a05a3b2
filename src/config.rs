//! Configuration types and functions for the flux_led accessory driver.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Result;

fn default_command() -> String {
    "flux_led".to_string()
}

fn default_name() -> String {
    "LED Controller".to_string()
}

fn default_setup() -> String {
    "RGBW".to_string()
}

fn default_timeout() -> u64 {
    60_000
}

fn default_initial_delay() -> u64 {
    3_000
}

/// Top-level configuration: the control utility and the lights it drives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
pub struct PlatformConfig {
    /// Path or name of the control utility (e.g., "flux_led" or "/usr/local/bin/flux_led")
    #[serde(default = "default_command")]
    pub command: String,
    /// One entry per physical controller
    pub lights: Vec<LightBulbConfig>,
}

/// Configuration of a single LED controller exposed as a light bulb.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
pub struct LightBulbConfig {
    /// Display name reported to the hub
    #[serde(default = "default_name")]
    pub name: String,
    /// Network address of the controller, passed verbatim to the utility
    pub ip: String,
    /// Controller wiring (e.g., "RGB", "RGBW", "RGBWW")
    #[serde(default = "default_setup")]
    pub setup: String,
    /// Expose only brightness and drive the warm white channel
    #[serde(default)]
    pub warm_white_only: bool,
    /// Polling interval in milliseconds, 0 polls once and stops
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Delay in milliseconds before the first poll
    #[serde(default = "default_initial_delay")]
    pub initial_delay: u64,
    /// Log every state transition at info level
    #[serde(default)]
    pub debug: bool,
}

impl LightBulbConfig {
    /// Creates a configuration with defaults for everything but the address.
    pub fn new<S: Into<String>>(ip: S) -> Self {
        Self {
            name: default_name(),
            ip: ip.into(),
            setup: default_setup(),
            warm_white_only: false,
            timeout: default_timeout(),
            initial_delay: default_initial_delay(),
            debug: false,
        }
    }

    /// Interval between polls, or `None` when repeated polling is disabled.
    pub fn poll_interval(&self) -> Option<Duration> {
        match self.timeout {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay)
    }
}

/// Parses a configuration from a YAML string.
pub fn parse_config(yaml: &str) -> Result<PlatformConfig> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Loads a configuration from a YAML file.
///
/// # Arguments
///
/// * `arg` - Path to the YAML configuration file
///
/// # Example
///
/// ```no_run
/// use flux_homekit::config;
///
/// let config = config::load_config("config.yaml").expect("Failed to load config");
/// println!("Driving {} lights via {}", config.lights.len(), config.command);
/// ```
pub fn load_config<S: Into<String>>(arg: S) -> Result<PlatformConfig> {
    let file = std::fs::File::open(arg.into())?;
    let reader = std::io::BufReader::new(file);
    let config: PlatformConfig = serde_yaml::from_reader(reader)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_defaults() {
        let config = parse_config("lights:\n  - ip: 192.168.1.20\n").unwrap();
        assert_eq!(config.command, "flux_led");
        let light = &config.lights[0];
        assert_eq!(light.name, "LED Controller");
        assert_eq!(light.setup, "RGBW");
        assert!(!light.warm_white_only);
        assert_eq!(light.poll_interval(), Some(Duration::from_secs(60)));
        assert_eq!(light.initial_delay(), Duration::from_secs(3));
    }

    #[test]
    fn zero_timeout_disables_polling() {
        let yaml = "command: /opt/flux_led\nlights:\n  - name: Desk\n    ip: 10.0.0.5\n    timeout: 0\n    warm_white_only: true\n";
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.command, "/opt/flux_led");
        assert_eq!(config.lights[0].poll_interval(), None);
        assert!(config.lights[0].warm_white_only);
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = parse_config("lights:\n  - ip: 10.0.0.5\n    colour: red\n").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn loads_from_file() {
        let path = std::env::temp_dir().join(format!("flux-homekit-config-{}.yaml", std::process::id()));
        std::fs::write(&path, "lights:\n  - name: Porch\n    ip: 10.0.0.9\n    timeout: 5000\n").unwrap();
        let config = load_config(path.to_string_lossy()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.lights[0].name, "Porch");
        assert_eq!(config.lights[0].poll_interval(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config("/nonexistent/flux-homekit/config.yaml").unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }

    #[test]
    fn requires_address() {
        assert!(parse_config("lights:\n  - name: Desk\n").is_err());
    }
}
