use std::collections::HashSet;

use super::{
    types::{Config, SubstitutionSourceKind},
    ConfigError,
};

/// Longest cooldown an indexer can be given.
pub const MAX_BACKOFF_SECS: u64 = 365 * 24 * 60 * 60;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Backoff constants are usable
/// - The http substitution source has a URL
/// - Indexer ids are unique
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let status = &config.status;
    if status.initial_backoff_secs == 0 {
        return Err(ConfigError::ValidationError(
            "status.initial_backoff_secs must be greater than 0".to_string(),
        ));
    }
    if !(status.backoff_multiplier >= 1.0 && status.backoff_multiplier.is_finite()) {
        return Err(ConfigError::ValidationError(
            "status.backoff_multiplier must be at least 1.0".to_string(),
        ));
    }
    if status.max_backoff_secs < status.initial_backoff_secs {
        return Err(ConfigError::ValidationError(
            "status.max_backoff_secs cannot be lower than status.initial_backoff_secs".to_string(),
        ));
    }
    if status.max_backoff_secs > MAX_BACKOFF_SECS {
        return Err(ConfigError::ValidationError(format!(
            "status.max_backoff_secs cannot exceed {} (one year)",
            MAX_BACKOFF_SECS
        )));
    }
    if status.max_escalation_level == 0 {
        return Err(ConfigError::ValidationError(
            "status.max_escalation_level must be greater than 0".to_string(),
        ));
    }

    let substitution = &config.substitution;
    if substitution.source == SubstitutionSourceKind::Http
        && substitution.url.as_deref().map_or(true, |u| u.trim().is_empty())
    {
        return Err(ConfigError::ValidationError(
            "substitution.url must be set when substitution.source = \"http\"".to_string(),
        ));
    }
    if substitution.fetch_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "substitution.fetch_timeout_secs must be greater than 0".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for indexer in &config.indexers {
        if !seen.insert(indexer.id) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate indexer id {}",
                indexer.id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config_from_str, ServerConfig};
    use std::net::IpAddr;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_multiplier_below_one_fails() {
        let mut config = Config::default();
        config.status.backoff_multiplier = 0.5;
        assert!(validate_config(&config).is_err());

        config.status.backoff_multiplier = f64::NAN;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_max_below_initial_fails() {
        let mut config = Config::default();
        config.status.initial_backoff_secs = 600;
        config.status.max_backoff_secs = 60;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_max_backoff_upper_bound() {
        let toml = r#"
[status]
initial_backoff_secs = 60
max_backoff_secs = 9000000000000
max_escalation_level = 100
backoff_multiplier = 10.0
"#;
        let mut config = load_config_from_str(toml).unwrap();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_backoff_secs"));

        config.status.max_backoff_secs = MAX_BACKOFF_SECS;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_http_source_requires_url() {
        let mut config = Config::default();
        config.substitution.source = SubstitutionSourceKind::Http;
        assert!(validate_config(&config).is_err());

        config.substitution.url = Some("https://blocklist.example.com/v1".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_duplicate_indexer_ids_fail() {
        let toml = r#"
[[indexers]]
id = 1
name = "A"
implementation = "newznab"

[[indexers]]
id = 1
name = "B"
implementation = "torznab"
"#;
        let config = load_config_from_str(toml).unwrap();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate indexer id 1"));
    }
}
