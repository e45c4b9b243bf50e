use crate::config::types::{ArchiveConfig, Config, FetchConfig, OutputConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_archive_config(&config.archive)?;
    validate_fetch_config(&config.fetch)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_archive_config(config: &ArchiveConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 50 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-requests must be between 1 and 50, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.retry_base_delay_ms < 1 {
        return Err(ConfigError::Validation(
            "retry-base-delay-ms must be >= 1".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| ConfigError::Validation(format!("Invalid email format: '{}'", email)))?;

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch_config() -> FetchConfig {
        FetchConfig::default()
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }

    #[test]
    fn test_validate_base_url() {
        let ok = ArchiveConfig {
            base_url: "https://ling.auf.net".to_string(),
        };
        assert!(validate_archive_config(&ok).is_ok());

        let bad_scheme = ArchiveConfig {
            base_url: "ftp://ling.auf.net".to_string(),
        };
        assert!(matches!(
            validate_archive_config(&bad_scheme),
            Err(ConfigError::InvalidUrl(_))
        ));

        let garbage = ArchiveConfig {
            base_url: "not a url".to_string(),
        };
        assert!(validate_archive_config(&garbage).is_err());
    }

    #[test]
    fn test_validate_fetch_bounds() {
        assert!(validate_fetch_config(&fetch_config()).is_ok());

        let mut too_many = fetch_config();
        too_many.max_concurrent_requests = 51;
        assert!(validate_fetch_config(&too_many).is_err());

        let mut retries = fetch_config();
        retries.max_retries = 11;
        assert!(validate_fetch_config(&retries).is_err());

        let mut no_delay = fetch_config();
        no_delay.retry_base_delay_ms = 0;
        assert!(validate_fetch_config(&no_delay).is_err());

        let mut zero_retries = fetch_config();
        zero_retries.max_retries = 0;
        assert!(validate_fetch_config(&zero_retries).is_ok());
    }
}
