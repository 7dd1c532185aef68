use crate::error::ShortenerError;
use async_trait::async_trait;
use jiff::SignedDuration;
use typed_builder::TypedBuilder;

type Result<T> = std::result::Result<T, ShortenerError>;

/// Parameters for creating a shortened URL.
///
/// `ttl` and `base_url` fall back to the service configuration when unset.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenParams {
    /// The original URL to be shortened.
    #[builder(setter(into))]
    pub original_url: String,
    /// Lifetime of a newly created mapping.
    #[builder(default, setter(strip_option))]
    pub ttl: Option<SignedDuration>,
    /// Prefix of the returned short url.
    #[builder(default, setter(strip_option, into))]
    pub base_url: Option<String>,
}

impl ShortenParams {
    /// Parameters that use the configured ttl and base url.
    pub fn new(original_url: impl Into<String>) -> Self {
        Self::builder().original_url(original_url).build()
    }
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Shortens a URL and returns the full short url.
    ///
    /// A URL that already has a live mapping gets its existing code back.
    async fn shorten(&self, params: ShortenParams) -> Result<String>;

    /// Expands a short url back to the original URL.
    ///
    /// Fails with `NotFoundOrExpired` if the code was never issued or its
    /// mapping has expired.
    async fn expand(&self, short_url: &str) -> Result<String>;
}
