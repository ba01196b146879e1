//! Builder configuration.

use crate::dialect::Dialect;
use serde::Deserialize;
use std::time::Duration;

/// Configuration shared by builders.
///
/// Can be built in code with the setters or deserialized from an application
/// config file; missing keys take their defaults.
///
/// ```ignore
/// let config = GqbConfig::for_driver("postgres")
///     .query_timeout(Duration::from_secs(5))
///     .slow_query_threshold(Duration::from_millis(200));
/// let mut builder = Builder::with_config(&client, config);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GqbConfig {
    /// Quoting and placeholder conventions.
    pub dialect: Dialect,
    /// Upper bound for each executor call.
    pub query_timeout: Option<Duration>,
    /// Calls slower than this are logged at warn level.
    pub slow_query_threshold: Option<Duration>,
    /// Emit a debug event with the SQL text before each call.
    pub log_sql: bool,
}

impl Default for GqbConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            query_timeout: None,
            slow_query_threshold: None,
            log_sql: true,
        }
    }
}

impl GqbConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with the dialect resolved from a driver name.
    pub fn for_driver(driver: &str) -> Self {
        Self::default().dialect(Dialect::from_driver(driver))
    }

    /// Set the SQL dialect.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set the per-call timeout.
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    /// Set the slow query threshold.
    pub fn slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    /// Enable or disable SQL debug logging.
    pub fn log_sql(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GqbConfig::new();
        assert_eq!(config.dialect, Dialect::MySql);
        assert_eq!(config.query_timeout, None);
        assert!(config.log_sql);
    }

    #[test]
    fn test_for_driver_and_setters() {
        let config = GqbConfig::for_driver("postgres")
            .query_timeout(Duration::from_secs(3))
            .log_sql(false);
        assert_eq!(config.dialect, Dialect::Postgres);
        assert_eq!(config.query_timeout, Some(Duration::from_secs(3)));
        assert!(!config.log_sql);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: GqbConfig = serde_json::from_str(
            r#"{"dialect":"sqlite","query_timeout":{"secs":1,"nanos":0}}"#,
        )
        .unwrap();
        assert_eq!(config.dialect, Dialect::Sqlite);
        assert_eq!(config.query_timeout, Some(Duration::from_secs(1)));
        assert!(config.log_sql);
    }
}
