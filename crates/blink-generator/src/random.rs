use crate::error::GeneratorError;
use crate::Generator;
use blink_core::shortcode::{MAX_LENGTH, MIN_LENGTH};
use blink_core::ShortCode;
use parking_lot::Mutex;
use rand::distr::{Alphanumeric, Distribution};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Draws fixed-length codes uniformly from `[A-Za-z0-9]`.
///
/// The random source is injected, so tests can pin the sequence of codes with
/// [`RandomGenerator::seeded`].
#[derive(Debug)]
pub struct RandomGenerator<R = StdRng> {
    rng: Mutex<R>,
    length: usize,
}

impl RandomGenerator<StdRng> {
    /// Creates a generator seeded from the thread-local entropy source.
    pub fn new(length: usize) -> Result<Self, GeneratorError> {
        Self::with_rng(StdRng::from_rng(&mut rand::rng()), length)
    }

    /// Creates a generator with a fixed seed. Equal seeds yield equal codes.
    pub fn seeded(seed: u64, length: usize) -> Result<Self, GeneratorError> {
        Self::with_rng(StdRng::seed_from_u64(seed), length)
    }
}

impl<R: Rng + Send + 'static> RandomGenerator<R> {
    /// Creates a generator over an arbitrary random source.
    pub fn with_rng(rng: R, length: usize) -> Result<Self, GeneratorError> {
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
            return Err(GeneratorError::InvalidLength {
                length,
                min: MIN_LENGTH,
                max: MAX_LENGTH,
            });
        }

        Ok(Self {
            rng: Mutex::new(rng),
            length,
        })
    }
}

impl<R: Rng + Send + 'static> Generator for RandomGenerator<R> {
    type Output = ShortCode;

    fn generate(&self) -> Self::Output {
        let mut rng = self.rng.lock();
        let code: String = Alphanumeric
            .sample_iter(&mut *rng)
            .take(self.length)
            .map(char::from)
            .collect();
        ShortCode::new_unchecked(code)
    }
}
