//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics export.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full `EnvFilter` directive
    pub log_level: String,

    /// Whether to write logs to stdout at all
    pub console_output: bool,

    /// JSON formatted logs instead of the human-readable format
    pub json_logs: bool,

    /// Port of the `/metrics` endpoint
    pub metrics_port: u16,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "af-node".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_port: 9464,
        }
    }
}

fn flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `AF_SERVICE_NAME`: Service name (default: af-node)
    /// - `AF_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `AF_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `AF_JSON_LOGS`: JSON logs (default: false locally, true in containers)
    /// - `AF_METRICS_PORT`: Metrics port (default: 9464)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: lookup("AF_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: lookup("AF_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: lookup("AF_CONSOLE_OUTPUT")
                .map(|v| flag(&v))
                .unwrap_or(defaults.console_output),

            json_logs: lookup("AF_JSON_LOGS")
                .map(|v| flag(&v))
                .unwrap_or(is_container),

            metrics_port: lookup("AF_METRICS_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.metrics_port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::from_lookup(lookup(&[]));
        assert_eq!(config.service_name, "af-node");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.metrics_port, 9464);
        assert!(!config.json_logs);
    }

    #[test]
    fn test_container_defaults_to_json() {
        let config = TelemetryConfig::from_lookup(lookup(&[("DOCKER_CONTAINER", "1")]));
        assert!(config.json_logs);

        let config = TelemetryConfig::from_lookup(lookup(&[
            ("DOCKER_CONTAINER", "1"),
            ("AF_JSON_LOGS", "false"),
        ]));
        assert!(!config.json_logs);
    }

    #[test]
    fn test_overrides() {
        let config = TelemetryConfig::from_lookup(lookup(&[
            ("RUST_LOG", "debug"),
            ("AF_METRICS_PORT", "9999"),
            ("AF_CONSOLE_OUTPUT", "0"),
        ]));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.metrics_port, 9999);
        assert!(!config.console_output);

        let config = TelemetryConfig::from_lookup(lookup(&[
            ("RUST_LOG", "debug"),
            ("AF_LOG_LEVEL", "warn"),
            ("AF_METRICS_PORT", "not-a-port"),
        ]));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.metrics_port, 9464);
    }
}
