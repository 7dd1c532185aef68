//! URL shortener service implementation.
//!
//! This crate provides [`ShortenerService`], which deduplicates on the
//! original URL, issues unique codes through a [`Generator`] and persists
//! mappings through a [`Repository`]. Core types are re-exported from
//! `blink_core`.
//!
//! [`Generator`]: blink_generator::Generator
//! [`Repository`]: blink_core::Repository

pub mod config;
pub mod service;

pub use blink_core::{ShortenParams, Shortener, ShortenerError};
pub use config::ShortenerConfig;
pub use service::ShortenerService;
