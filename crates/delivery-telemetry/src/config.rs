//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive such as `info,sd_05_finalization=debug`
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "signed-delivery".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// - `SD_SERVICE_NAME`: Service name (default: signed-delivery)
    /// - `SD_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `SD_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `SD_JSON_LOGS`: Enable JSON logs (default: false outside containers)
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: lookup("SD_SERVICE_NAME")
                .unwrap_or_else(|| "signed-delivery".to_string()),

            log_level: lookup("SD_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or_else(|| "info".to_string()),

            console_output: lookup("SD_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: lookup("SD_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),
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
    fn test_defaults_without_variables() {
        let config = TelemetryConfig::from_vars(lookup_from(&[]));
        assert_eq!(config.service_name, "signed-delivery");
        assert_eq!(config.log_level, "info");
        assert!(config.console_output);
        assert!(!config.json_logs);
    }

    #[test]
    fn test_log_level_falls_back_to_rust_log() {
        let config = TelemetryConfig::from_vars(lookup_from(&[("RUST_LOG", "debug")]));
        assert_eq!(config.log_level, "debug");

        let config = TelemetryConfig::from_vars(lookup_from(&[
            ("RUST_LOG", "debug"),
            ("SD_LOG_LEVEL", "warn"),
        ]));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_containers_default_to_json() {
        let config = TelemetryConfig::from_vars(lookup_from(&[("DOCKER_CONTAINER", "1")]));
        assert!(config.json_logs);

        let config = TelemetryConfig::from_vars(lookup_from(&[
            ("DOCKER_CONTAINER", "1"),
            ("SD_JSON_LOGS", "false"),
        ]));
        assert!(!config.json_logs);
    }

    #[test]
    fn test_console_output_can_be_disabled() {
        let config = TelemetryConfig::from_vars(lookup_from(&[("SD_CONSOLE_OUTPUT", "0")]));
        assert!(!config.console_output);
    }
}
