use crate::config::ShortenerConfig;
use async_trait::async_trait;
use blink_core::{
    Clock, CoreError, Repository, ShortCode, ShortenParams, Shortener, ShortenerError,
    StorageError, SystemClock, UrlMapping,
};
use blink_generator::Generator;
use blink_storage::{DrawBudget, UniqueCodeExt};
use jiff::SignedDuration;
use std::sync::Arc;
use tracing::{debug, info, trace};

type Result<T> = std::result::Result<T, ShortenerError>;

/// A concrete implementation of the `Shortener` trait.
///
/// This service wraps a `Repository`, a `Generator` and a `Clock` to handle:
/// - Deduplication on the original URL
/// - Unique code issuance, retrying when a concurrent save wins a code
/// - Building and parsing full short urls
///
/// The service holds no mutable state of its own. Several services may share
/// one repository by passing clones of the same `Arc`.
///
/// Deduplication is best-effort: two concurrent first-time calls for the same
/// URL can both miss the lookup and create two mappings. Reusing a mapping
/// never extends its expiry.
#[derive(Debug, Clone)]
pub struct ShortenerService<R, G, C = SystemClock> {
    repository: Arc<R>,
    generator: Arc<G>,
    clock: C,
    config: ShortenerConfig,
}

impl<R: Repository, G: Generator> ShortenerService<R, G, SystemClock> {
    /// Creates a new `ShortenerService` on the system clock.
    pub fn new(repository: Arc<R>, generator: G, config: ShortenerConfig) -> Result<Self> {
        Self::with_clock(repository, generator, config, SystemClock)
    }
}

impl<R: Repository, G: Generator, C: Clock> ShortenerService<R, G, C> {
    /// Creates a new `ShortenerService` that timestamps mappings with `clock`.
    pub fn with_clock(
        repository: Arc<R>,
        generator: G,
        config: ShortenerConfig,
        clock: C,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            repository,
            generator: Arc::new(generator),
            clock,
            config,
        })
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Validates that the URL has a valid format (has a scheme and host).
    fn validate_url(url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(ShortenerError::InvalidUrl(
                "URL cannot be empty".to_string(),
            ));
        }

        let Some((scheme, rest)) = url.split_once("://") else {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a valid scheme and host: {}",
                url
            )));
        };

        if scheme.is_empty() || rest.is_empty() || rest.starts_with('/') {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a valid scheme and host: {}",
                url
            )));
        }

        let scheme = scheme.to_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL scheme must be http or https: {}",
                scheme
            )));
        }

        Ok(())
    }

    /// Allocates a code for `original_url` and persists the mapping.
    ///
    /// A `Conflict` from `save` means another writer took the code between
    /// the free check and the insert; a fresh code is drawn in that case.
    /// All draws for one call come out of a single `max_attempts` budget.
    async fn issue_code(&self, original_url: &str, ttl: SignedDuration) -> Result<ShortCode> {
        let mut budget = DrawBudget::new(self.config.max_attempts);

        loop {
            let code = self
                .repository
                .generate_unique_code_within(self.generator.as_ref(), &mut budget)
                .await?;
            let mapping = UrlMapping::new(code.clone(), original_url, self.clock.now(), ttl)?;

            match self.repository.save(mapping).await {
                Ok(()) => return Ok(code),
                Err(StorageError::Conflict(_)) => {
                    debug!(
                        code = %code,
                        draws = budget.used(),
                        "short code taken concurrently, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl<R: Repository, G: Generator, C: Clock> Shortener for ShortenerService<R, G, C> {
    async fn shorten(&self, params: ShortenParams) -> Result<String> {
        Self::validate_url(&params.original_url)?;

        let ttl = params.ttl.unwrap_or(self.config.ttl);
        if !ttl.is_positive() {
            return Err(CoreError::InvalidTtl(format!("ttl must be positive, got {ttl:#}")).into());
        }
        let base_url = params.base_url.as_deref().unwrap_or(&self.config.base_url);

        let code = match self
            .repository
            .find_by_original_url(&params.original_url)
            .await?
        {
            Some(existing) => {
                debug!(
                    code = %existing.short_code,
                    expire_at = %existing.expire_at,
                    "reusing live mapping"
                );
                existing.short_code
            }
            None => {
                let code = self.issue_code(&params.original_url, ttl).await?;
                info!(code = %code, url = %params.original_url, ttl = %ttl, "issued short code");
                code
            }
        };

        Ok(code.to_url(base_url))
    }

    async fn expand(&self, short_url: &str) -> Result<String> {
        let not_found = || ShortenerError::NotFoundOrExpired(short_url.to_string());

        // A malformed code can never have been issued.
        let Ok(code) = ShortCode::from_short_url(short_url) else {
            trace!(short_url, "short url does not carry a valid code");
            return Err(not_found());
        };

        match self.repository.find_by_code(&code).await? {
            Some(mapping) => {
                debug!(code = %code, url = %mapping.original_url, "expanded short code");
                Ok(mapping.original_url)
            }
            None => {
                trace!(code = %code, "short code not found or expired");
                Err(not_found())
            }
        }
    }
}
