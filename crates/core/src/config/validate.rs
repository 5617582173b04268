use super::{types::Config, AuthMethod, ConfigError};

/// Validate configuration
/// Checks cross-field constraints that serde defaults cannot express:
/// - server port is not 0
/// - api_key auth method carries a non-empty key
/// - configured collaborator sections have non-empty credentials
/// - an enabled sync driver has all three collaborators and a parent page
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::ApiKey
        && config.auth.api_key.as_deref().unwrap_or("").is_empty()
    {
        return Err(ConfigError::ValidationError(
            "auth.api_key must be set when auth.method is api_key".to_string(),
        ));
    }

    if let Some(sonarr) = &config.sonarr {
        if sonarr.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "sonarr.base_url cannot be empty".to_string(),
            ));
        }
        if sonarr.api_key.is_empty() {
            return Err(ConfigError::ValidationError(
                "sonarr.api_key cannot be empty".to_string(),
            ));
        }
    }

    if let Some(notion) = &config.notion {
        if notion.token.is_empty() {
            return Err(ConfigError::ValidationError(
                "notion.token cannot be empty".to_string(),
            ));
        }
        if notion.max_in_flight == 0 {
            return Err(ConfigError::ValidationError(
                "notion.max_in_flight cannot be 0".to_string(),
            ));
        }
    }

    if let Some(youtube) = &config.youtube {
        if youtube.api_key.is_empty() {
            return Err(ConfigError::ValidationError(
                "youtube.api_key cannot be empty".to_string(),
            ));
        }
        if youtube.channel.is_empty() {
            return Err(ConfigError::ValidationError(
                "youtube.channel cannot be empty".to_string(),
            ));
        }
    }

    if config.sync.enabled {
        if config.sonarr.is_none() || config.notion.is_none() || config.youtube.is_none() {
            return Err(ConfigError::ValidationError(
                "sync.enabled requires [sonarr], [notion] and [youtube] sections".to_string(),
            ));
        }
        if config.sync.parent_page_id.is_empty() {
            return Err(ConfigError::ValidationError(
                "sync.parent_page_id must be set when sync is enabled".to_string(),
            ));
        }
        if config.sync.calendar_past_days < 0 || config.sync.calendar_future_days < 0 {
            return Err(ConfigError::ValidationError(
                "sync calendar window days cannot be negative".to_string(),
            ));
        }
        if config.sync.catalog_interval_hours == 0 || config.sync.stats_interval_mins == 0 {
            return Err(ConfigError::ValidationError(
                "sync intervals cannot be 0".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    #[test]
    fn test_validate_default_config() {
        let config = load_config_from_str("").unwrap();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = load_config_from_str(
            r#"
[server]
port = 0
"#,
        )
        .unwrap();
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_api_key_method_without_key_fails() {
        let config = load_config_from_str(
            r#"
[auth]
method = "api_key"
"#,
        )
        .unwrap();
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_sync_without_collaborators_fails() {
        let config = load_config_from_str(
            r#"
[sync]
enabled = true
parent_page_id = "abc"
"#,
        )
        .unwrap();
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_sync_without_parent_page_fails() {
        let config = load_config_from_str(
            r#"
[sonarr]
base_url = "http://localhost:8989"
api_key = "k"

[notion]
token = "t"

[youtube]
api_key = "k"
channel = "@c"

[sync]
enabled = true
"#,
        )
        .unwrap();
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_enabled_sync_ok() {
        let config = load_config_from_str(
            r#"
[sonarr]
base_url = "http://localhost:8989"
api_key = "k"

[notion]
token = "t"

[youtube]
api_key = "k"
channel = "@c"

[sync]
enabled = true
parent_page_id = "abc"
"#,
        )
        .unwrap();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_sonarr_url_fails() {
        let config = load_config_from_str(
            r#"
[sonarr]
base_url = ""
api_key = "k"
"#,
        )
        .unwrap();
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
