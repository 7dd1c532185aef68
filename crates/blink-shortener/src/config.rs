use blink_core::ShortenerError;
use blink_storage::DEFAULT_MAX_ATTEMPTS;
use jiff::SignedDuration;
use typed_builder::TypedBuilder;

pub const DEFAULT_BASE_URL: &str = "https://myurlshortener.com";
pub const DEFAULT_TTL: SignedDuration = SignedDuration::from_secs(120);

/// Settings for a [`ShortenerService`](crate::ShortenerService).
#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenerConfig {
    /// Prefix of every returned short url, e.g. `https://s.co`.
    #[builder(default = DEFAULT_BASE_URL.to_string(), setter(into))]
    pub base_url: String,
    /// Lifetime of newly created mappings.
    #[builder(default = DEFAULT_TTL)]
    pub ttl: SignedDuration,
    /// Bound on code draws and on save retries after a code conflict.
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ShortenerConfig {
    pub fn validate(&self) -> Result<(), ShortenerError> {
        if self.base_url.trim().is_empty() {
            return Err(ShortenerError::InvalidConfig(
                "base url cannot be empty".to_string(),
            ));
        }

        if !self.ttl.is_positive() {
            return Err(ShortenerError::InvalidConfig(format!(
                "ttl must be positive, got {:#}",
                self.ttl
            )));
        }

        if self.max_attempts == 0 {
            return Err(ShortenerError::InvalidConfig(
                "max attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ShortenerConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.ttl, SignedDuration::from_secs(120));
        assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_ttl() {
        for ttl in [SignedDuration::ZERO, SignedDuration::from_secs(-1)] {
            let config = ShortenerConfig::builder().ttl(ttl).build();
            assert!(matches!(
                config.validate(),
                Err(ShortenerError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn rejects_empty_base_url_and_zero_attempts() {
        let config = ShortenerConfig::builder().base_url("  ").build();
        assert!(config.validate().is_err());

        let config = ShortenerConfig::builder().max_attempts(0).build();
        assert!(config.validate().is_err());
    }
}
