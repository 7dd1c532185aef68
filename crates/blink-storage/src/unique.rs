use async_trait::async_trait;
use blink_core::repository::{ReadRepository, Result};
use blink_core::{ShortCode, StorageError};
use blink_generator::Generator;
use tracing::{debug, warn};

/// Draw limit used when callers have no better bound.
///
/// At six characters a single draw collides with probability ~1/5.6e10 per
/// live mapping, so hitting this limit means the code space is saturated.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 16;

/// A limit on code draws, shared by everything that issues one code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawBudget {
    limit: u32,
    used: u32,
}

impl DrawBudget {
    pub fn new(limit: u32) -> Self {
        Self { limit, used: 0 }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Draws spent so far.
    pub fn used(&self) -> u32 {
        self.used
    }

    fn take(&mut self) -> bool {
        if self.used >= self.limit {
            return false;
        }
        self.used += 1;
        true
    }
}

/// Allocates short codes that are free in a repository.
#[async_trait]
pub trait UniqueCodeExt: ReadRepository {
    /// Draws codes from `generator` until one has no live mapping.
    ///
    /// Fails with `CodeSpaceExhausted` after `max_attempts` draws. A code
    /// returned here can still be taken by a concurrent `save`; the store's
    /// uniqueness check on `save` is what settles that race.
    async fn generate_unique_code<G: Generator>(
        &self,
        generator: &G,
        max_attempts: u32,
    ) -> Result<ShortCode> {
        let mut budget = DrawBudget::new(max_attempts);
        self.generate_unique_code_within(generator, &mut budget).await
    }

    /// Like [`generate_unique_code`](Self::generate_unique_code), but spends
    /// draws from a budget the caller keeps across several calls.
    async fn generate_unique_code_within<G: Generator>(
        &self,
        generator: &G,
        budget: &mut DrawBudget,
    ) -> Result<ShortCode> {
        while budget.take() {
            let code: ShortCode = generator.generate().into();
            if self.find_by_code(&code).await?.is_none() {
                return Ok(code);
            }
            debug!(code = %code, attempt = budget.used(), "generated short code is taken");
        }

        warn!(attempts = budget.limit(), "short code generation exhausted");
        Err(StorageError::CodeSpaceExhausted {
            attempts: budget.limit(),
        })
    }
}

impl<R: ReadRepository> UniqueCodeExt for R {}
