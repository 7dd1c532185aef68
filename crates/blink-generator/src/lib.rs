pub mod error;
pub mod random;

pub use error::GeneratorError;
pub use random::RandomGenerator;

use blink_core::ShortCode;

/// Trait for generating short codes.
///
/// Implementations are pure generators that don't interact with storage;
/// uniqueness among live mappings is checked by the store.
pub trait Generator: Send + Sync + 'static {
    type Output: Into<ShortCode>;

    /// Generates a candidate short code.
    fn generate(&self) -> Self::Output;
}
