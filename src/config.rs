//! Configuration file management for the certificate check.
//!
//! This module handles loading, parsing, and merging configuration from TOML
//! files and command-line arguments. Settings can be specified in multiple
//! places with clear precedence rules.
//!
//! # Configuration Precedence
//!
//! 1. Default values (lowest priority)
//! 2. Configuration file (specified with --config)
//! 3. Command-line arguments (highest priority)
//!
//! # Example Configuration File
//!
//! ```toml
//! host = "mail.example.com"
//! port = 587
//! starttls = "smtp"
//! warning_days = 30
//! error_days = 15
//!
//! [prometheus]
//! enabled = true
//! address = "http://localhost:9091"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration structure for the check.
///
/// All fields are optional to support partial configuration and merging.
/// Missing values will be filled in by defaults or overridden by CLI
/// arguments.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Host to contact
    pub host: Option<String>,
    /// Port to use
    pub port: Option<u16>,
    /// Subject to expect; the host is used if not specified
    pub subject: Option<String>,
    /// StartTLS protocol to negotiate before the handshake (smtp, imap, pop3)
    pub starttls: Option<String>,
    /// Days left below which the check reports WARNING
    pub warning_days: Option<i64>,
    /// Days left below which the check reports ERROR
    pub error_days: Option<i64>,
    /// Connect/read timeout in seconds
    pub timeout: Option<u64>,
    /// Output format: text or json
    pub output: Option<String>,
    /// Prometheus configuration
    pub prometheus: Option<PrometheusConfig>,
}

/// Prometheus integration configuration.
///
/// Controls whether check metrics are pushed to a Prometheus Push Gateway
/// and specifies the gateway address.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PrometheusConfig {
    /// Enable prometheus metrics pushing
    pub enabled: Option<bool>,
    /// Prometheus push gateway address (e.g., "http://localhost:9091")
    pub address: Option<String>,
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully parsed configuration
    /// * `Err(ConfigError::Io)` - File could not be read
    /// * `Err(ConfigError::Parse)` - File contains invalid TOML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(config)
    }

    /// Creates a default configuration.
    ///
    /// # Default Values
    ///
    /// - `host`: None (must be provided)
    /// - `port`: 443
    /// - `subject`: None (the host is used)
    /// - `starttls`: None (plain TLS handshake)
    /// - `warning_days`: 30
    /// - `error_days`: 15
    /// - `timeout`: 30 seconds
    /// - `output`: "text"
    /// - `prometheus.enabled`: false
    /// - `prometheus.address`: "http://localhost:9091"
    pub fn default() -> Self {
        Config {
            host: None,
            port: Some(443),
            subject: None,
            starttls: None,
            warning_days: Some(30),
            error_days: Some(15),
            timeout: Some(30),
            output: Some("text".to_string()),
            prometheus: Some(PrometheusConfig {
                enabled: Some(false),
                address: Some("http://localhost:9091".to_string()),
            }),
        }
    }

    /// Merges this configuration with another, prioritizing the other's
    /// values.
    ///
    /// For each field, if the `other` config has a value (Some), it overrides
    /// this config's value. If the `other` value is None, keeps the current
    /// value.
    pub fn merge_with(mut self, other: Config) -> Self {
        if other.host.is_some() {
            self.host = other.host;
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.subject.is_some() {
            self.subject = other.subject;
        }
        if other.starttls.is_some() {
            self.starttls = other.starttls;
        }
        if other.warning_days.is_some() {
            self.warning_days = other.warning_days;
        }
        if other.error_days.is_some() {
            self.error_days = other.error_days;
        }
        if other.timeout.is_some() {
            self.timeout = other.timeout;
        }
        if other.output.is_some() {
            self.output = other.output;
        }
        if let Some(other_prom) = other.prometheus {
            if let Some(ref mut self_prom) = self.prometheus {
                if other_prom.enabled.is_some() {
                    self_prom.enabled = other_prom.enabled;
                }
                if other_prom.address.is_some() {
                    self_prom.address = other_prom.address;
                }
            } else {
                self.prometheus = Some(other_prom);
            }
        }
        self
    }

    /// Creates a Config from command-line arguments for merging.
    ///
    /// Converts CLI arguments into a Config structure that can be merged
    /// with file-based and default configurations. Only provided arguments
    /// (Some values) will override other configurations.
    #[allow(clippy::too_many_arguments)]
    pub fn from_cli_args(
        host: Option<String>,
        port: Option<u16>,
        subject: Option<String>,
        starttls: Option<String>,
        warning_days: Option<i64>,
        error_days: Option<i64>,
        timeout: Option<u64>,
        output: Option<String>,
        prometheus: Option<bool>,
        prometheus_address: Option<String>,
    ) -> Self {
        Config {
            host,
            port,
            subject,
            starttls,
            warning_days,
            error_days,
            timeout,
            output,
            prometheus: Some(PrometheusConfig {
                enabled: prometheus,
                address: prometheus_address,
            }),
        }
    }

    /// Generates an example configuration file in TOML format.
    ///
    /// Creates a sample configuration with all available options set to
    /// example values. Useful for bootstrapping a new configuration file.
    pub fn example_toml() -> String {
        let example = Config {
            host: Some("mail.example.com".to_string()),
            port: Some(587),
            subject: Some("mail.example.com".to_string()),
            starttls: Some("smtp".to_string()),
            warning_days: Some(30),
            error_days: Some(15),
            timeout: Some(30),
            output: Some("text".to_string()),
            prometheus: Some(PrometheusConfig {
                enabled: Some(true),
                address: Some("http://localhost:9091".to_string()),
            }),
        };

        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| "# Error generating example".to_string())
    }
}

/// Errors that can occur during configuration loading and parsing.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error (file not found, permission denied, etc.)
    Io(String),
    /// TOML parsing error (invalid syntax, type mismatch, etc.)
    Parse(String),
    /// Validation error (missing required fields, invalid values, etc.)
    Validation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "IO Error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Parse Error: {}", msg),
            ConfigError::Validation(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_from_toml() {
        let toml_content = r#"
            host = "mail.example.com"
            port = 143
            starttls = "imap"
            warning_days = 21
            error_days = 7
            timeout = 10
            output = "json"

            [prometheus]
            enabled = true
            address = "http://localhost:9092"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();

        assert_eq!(config.host, Some("mail.example.com".to_string()));
        assert_eq!(config.port, Some(143));
        assert_eq!(config.subject, None);
        assert_eq!(config.starttls, Some("imap".to_string()));
        assert_eq!(config.warning_days, Some(21));
        assert_eq!(config.error_days, Some(7));
        assert_eq!(config.timeout, Some(10));
        assert_eq!(config.output, Some("json".to_string()));

        let prometheus = config.prometheus.unwrap();
        assert_eq!(prometheus.enabled, Some(true));
        assert_eq!(
            prometheus.address,
            Some("http://localhost:9092".to_string())
        );
    }

    #[test]
    fn test_config_merge() {
        let base_config = Config {
            host: Some("base.example.com".to_string()),
            port: Some(443),
            subject: Some("base.example.com".to_string()),
            starttls: None,
            warning_days: Some(30),
            error_days: Some(15),
            timeout: Some(30),
            output: Some("text".to_string()),
            prometheus: Some(PrometheusConfig {
                enabled: Some(false),
                address: Some("http://base:9091".to_string()),
            }),
        };

        let override_config = Config {
            host: Some("override.example.com".to_string()),
            port: None,
            subject: None,
            starttls: Some("smtp".to_string()),
            warning_days: None,
            error_days: Some(5),
            timeout: None,
            output: None,
            prometheus: Some(PrometheusConfig {
                enabled: Some(true),
                address: None,
            }),
        };

        let merged = base_config.merge_with(override_config);

        // Override config should take precedence where specified
        assert_eq!(merged.host, Some("override.example.com".to_string()));
        assert_eq!(merged.port, Some(443)); // From base (not overridden)
        assert_eq!(merged.subject, Some("base.example.com".to_string()));
        assert_eq!(merged.starttls, Some("smtp".to_string())); // Overridden
        assert_eq!(merged.warning_days, Some(30)); // From base
        assert_eq!(merged.error_days, Some(5)); // Overridden
        assert_eq!(merged.output, Some("text".to_string()));

        let prometheus = merged.prometheus.unwrap();
        assert_eq!(prometheus.enabled, Some(true)); // Overridden
        assert_eq!(prometheus.address, Some("http://base:9091".to_string())); // From base
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.host, None);
        assert_eq!(config.port, Some(443));
        assert_eq!(config.subject, None);
        assert_eq!(config.starttls, None);
        assert_eq!(config.warning_days, Some(30));
        assert_eq!(config.error_days, Some(15));
        assert_eq!(config.timeout, Some(30));
        assert_eq!(config.output, Some("text".to_string()));

        let prometheus = config.prometheus.unwrap();
        assert_eq!(prometheus.enabled, Some(false));
        assert_eq!(
            prometheus.address,
            Some("http://localhost:9091".to_string())
        );
    }

    #[test]
    fn test_config_from_cli_args() {
        let config = Config::from_cli_args(
            Some("cli.example.com".to_string()),
            Some(993),
            Some("mail.cli.example.com".to_string()),
            Some("imap".to_string()),
            Some(14),
            Some(7),
            Some(5),
            Some("json".to_string()),
            Some(true),
            Some("http://cli:9091".to_string()),
        );

        assert_eq!(config.host, Some("cli.example.com".to_string()));
        assert_eq!(config.port, Some(993));
        assert_eq!(config.subject, Some("mail.cli.example.com".to_string()));
        assert_eq!(config.starttls, Some("imap".to_string()));
        assert_eq!(config.warning_days, Some(14));
        assert_eq!(config.error_days, Some(7));
        assert_eq!(config.timeout, Some(5));
        assert_eq!(config.output, Some("json".to_string()));

        let prometheus = config.prometheus.unwrap();
        assert_eq!(prometheus.enabled, Some(true));
        assert_eq!(prometheus.address, Some("http://cli:9091".to_string()));
    }

    #[test]
    fn test_cli_overrides_file_overrides_defaults() {
        let file_config = Config {
            host: Some("file.example.com".to_string()),
            port: Some(8443),
            subject: None,
            starttls: None,
            warning_days: Some(21),
            error_days: None,
            timeout: None,
            output: None,
            prometheus: None,
        };
        let cli_config = Config::from_cli_args(
            None,
            None,
            None,
            None,
            Some(10),
            None,
            None,
            None,
            None,
            None,
        );

        let merged = Config::default().merge_with(file_config).merge_with(cli_config);

        assert_eq!(merged.host, Some("file.example.com".to_string())); // file
        assert_eq!(merged.port, Some(8443)); // file
        assert_eq!(merged.warning_days, Some(10)); // CLI wins over file
        assert_eq!(merged.error_days, Some(15)); // default survives
        assert_eq!(merged.timeout, Some(30)); // default survives
    }

    #[test]
    fn test_invalid_toml() {
        let invalid_toml = "host = [invalid toml";

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_toml.as_bytes()).unwrap();

        let result = Config::from_file(temp_file.path());
        assert!(result.is_err());

        match result.unwrap_err() {
            ConfigError::Parse(_) => {} // Expected
            other => panic!("Expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file("/nonexistent/certchecker.toml");
        match result.unwrap_err() {
            ConfigError::Io(_) => {} // Expected
            other => panic!("Expected IoError, got {:?}", other),
        }
    }

    #[test]
    fn test_example_toml_generation() {
        let example = Config::example_toml();

        // Should be valid TOML
        let parsed: Config = toml::from_str(&example).unwrap();

        // Should contain expected fields
        assert!(parsed.host.is_some());
        assert!(parsed.starttls.is_some());
        assert!(parsed.prometheus.is_some());
    }
}
