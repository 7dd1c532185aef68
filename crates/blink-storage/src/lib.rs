//! Storage backends for URL mappings.
//!
//! Every backend enforces short code uniqueness at the storage layer and
//! hides expired rows on read. Physical removal of expired rows is left to
//! [`purge_expired`](blink_core::Repository::purge_expired), which the
//! [`reaper`] runs periodically.

pub mod memory;
pub mod mysql;
pub mod reaper;
pub mod unique;

pub use blink_core::repository::{ReadRepository, Repository, Result};
pub use blink_core::StorageError;
pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;
pub use reaper::{spawn_reaper, ReaperHandle};
pub use unique::{DrawBudget, UniqueCodeExt, DEFAULT_MAX_ATTEMPTS};
