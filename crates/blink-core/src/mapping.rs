use crate::error::{CoreError, Result};
use crate::shortcode::ShortCode;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

/// A stored mapping from a short code to the URL it stands for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlMapping {
    /// The code handed out to callers.
    pub short_code: ShortCode,
    /// The original URL that was shortened.
    pub original_url: String,
    /// When the mapping was created.
    pub created_at: Timestamp,
    /// When the mapping stops being visible. Always after `created_at`.
    pub expire_at: Timestamp,
}

impl UrlMapping {
    /// Builds a mapping that lives for `ttl` from `created_at`.
    ///
    /// `ttl` must be strictly positive.
    pub fn new(
        short_code: ShortCode,
        original_url: impl Into<String>,
        created_at: Timestamp,
        ttl: SignedDuration,
    ) -> Result<Self> {
        if !ttl.is_positive() {
            return Err(CoreError::InvalidTtl(format!(
                "ttl must be positive, got {ttl:#}"
            )));
        }

        let expire_at = created_at
            .checked_add(ttl)
            .map_err(|e| CoreError::InvalidTtl(format!("expiry out of range: {e}")))?;

        Ok(Self {
            short_code,
            original_url: original_url.into(),
            created_at,
            expire_at,
        })
    }

    /// Whether the mapping is dead at `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expire_at
    }

    /// The lifetime the mapping was created with.
    pub fn ttl(&self) -> SignedDuration {
        self.expire_at.duration_since(self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> ShortCode {
        ShortCode::new_unchecked("abc123")
    }

    #[test]
    fn expiry_is_created_plus_ttl() {
        let created = Timestamp::from_second(1_000).unwrap();
        let mapping = UrlMapping::new(
            code(),
            "https://example.com",
            created,
            SignedDuration::from_secs(120),
        )
        .unwrap();

        assert_eq!(mapping.expire_at, Timestamp::from_second(1_120).unwrap());
        assert_eq!(mapping.ttl(), SignedDuration::from_secs(120));
    }

    #[test]
    fn zero_or_negative_ttl_is_rejected() {
        let created = Timestamp::from_second(1_000).unwrap();

        for ttl in [SignedDuration::ZERO, SignedDuration::from_secs(-5)] {
            let err = UrlMapping::new(code(), "https://example.com", created, ttl).unwrap_err();
            assert!(matches!(err, CoreError::InvalidTtl(_)));
        }
    }

    #[test]
    fn expired_exactly_at_expire_at() {
        let created = Timestamp::from_second(1_000).unwrap();
        let mapping = UrlMapping::new(
            code(),
            "https://example.com",
            created,
            SignedDuration::from_secs(1),
        )
        .unwrap();

        assert!(!mapping.is_expired_at(created));
        assert!(mapping.is_expired_at(Timestamp::from_second(1_001).unwrap()));
        assert!(mapping.is_expired_at(Timestamp::from_second(2_000).unwrap()));
    }
}
