use thiserror::Error;

/// Result type for core validation.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while validating core values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("invalid ttl: {0}")]
    InvalidTtl(String),
}

/// Errors returned by repository implementations.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The short code is already held by a live mapping.
    #[error("short code already exists: {0}")]
    Conflict(String),
    #[error("no free short code found after {attempts} attempts")]
    CodeSpaceExhausted { attempts: u32 },
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

/// Errors returned by the shortener service.
#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    /// The short url was never issued, or its mapping has expired.
    #[error("short url {0} does not exist or has expired")]
    NotFoundOrExpired(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("no free short code found after {attempts} attempts")]
    CodeSpaceExhausted { attempts: u32 },
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for ShortenerError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::CodeSpaceExhausted { attempts } => Self::CodeSpaceExhausted { attempts },
            other => Self::Storage(other),
        }
    }
}
