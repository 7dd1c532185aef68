//! Core types and traits for the blink URL shortener.
//!
//! This crate provides the shared vocabulary used by the generator, the
//! storage backends and the shortener service: short codes, stored mappings,
//! clocks, error types and the repository/shortener contracts.

pub mod clock;
pub mod error;
pub mod mapping;
pub mod repository;
pub mod shortcode;
pub mod shortener;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, ShortenerError, StorageError};
pub use mapping::UrlMapping;
pub use repository::{ReadRepository, Repository};
pub use shortcode::ShortCode;
pub use shortener::{ShortenParams, Shortener};
