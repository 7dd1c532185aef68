use crate::error::StorageError;
use crate::mapping::UrlMapping;
use crate::shortcode::ShortCode;
use async_trait::async_trait;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// The read side of a mapping store.
///
/// Lookups only ever return live mappings: a row whose `expire_at` has passed
/// is reported as absent even if reclamation has not removed it yet.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the live mapping for a short code.
    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlMapping>>;

    /// Retrieves a live mapping for an original URL.
    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<UrlMapping>>;
}

#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a new mapping.
    ///
    /// Returns `Err(Conflict)` if the code is held by a live mapping. The check
    /// and the insert are atomic with respect to other `save` calls.
    async fn save(&self, mapping: UrlMapping) -> Result<()>;

    /// Physically removes expired mappings and returns how many were removed.
    async fn purge_expired(&self) -> Result<u64>;
}
