use async_trait::async_trait;
use blink_core::repository::{ReadRepository, Repository, Result};
use blink_core::{Clock, ShortCode, StorageError, SystemClock, UrlMapping};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::trace;

/// In-memory implementation of the repository contract using DashMap.
///
/// Mappings are keyed by short code. A second map indexes original URLs to
/// the code most recently issued for them; it may briefly point at a dead or
/// replaced code, so every index hit is re-checked against the primary map.
///
/// Expired mappings stay in memory until they are read or purged, and are
/// never returned by lookups.
#[derive(Debug)]
pub struct InMemoryRepository<C = SystemClock> {
    codes: DashMap<String, UrlMapping>,
    urls: DashMap<String, String>,
    clock: C,
}

impl InMemoryRepository<SystemClock> {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for InMemoryRepository<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryRepository<C> {
    /// Creates a repository that evaluates expiry against `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            codes: DashMap::new(),
            urls: DashMap::new(),
            clock,
        }
    }

    /// Number of stored mappings, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Drops the url index entry for `mapping` if it still points at its code.
    fn unindex(&self, mapping: &UrlMapping) {
        self.urls.remove_if(&mapping.original_url, |_, code| {
            code == mapping.short_code.as_str()
        });
    }
}

#[async_trait]
impl<C: Clock> ReadRepository for InMemoryRepository<C> {
    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<UrlMapping>> {
        let key = code.as_str();
        let now = self.clock.now();

        let Some(mapping) = self.codes.get(key) else {
            return Ok(None);
        };

        if mapping.is_expired_at(now) {
            drop(mapping);
            // Only remove if it's still the expired one; a save may have replaced it.
            if let Some((_, stale)) = self.codes.remove_if(key, |_, m| m.is_expired_at(now)) {
                trace!(code = %code, "dropped expired mapping on read");
                self.unindex(&stale);
            }
            return Ok(None);
        }

        Ok(Some(mapping.value().clone()))
    }

    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<UrlMapping>> {
        // Clone out of the index guard before touching the primary map.
        let Some(code) = self.urls.get(original_url).map(|code| code.value().clone()) else {
            return Ok(None);
        };

        let now = self.clock.now();
        let found = self
            .codes
            .get(&code)
            .filter(|m| m.original_url == original_url && !m.is_expired_at(now))
            .map(|m| m.value().clone());

        Ok(found)
    }
}

#[async_trait]
impl<C: Clock> Repository for InMemoryRepository<C> {
    async fn save(&self, mapping: UrlMapping) -> Result<()> {
        let now = self.clock.now();
        let code = mapping.short_code.as_str().to_owned();
        let original_url = mapping.original_url.clone();

        // The entry guard locks the shard, so check-and-insert is atomic.
        let replaced = match self.codes.entry(code.clone()) {
            Entry::Occupied(mut slot) => {
                if !slot.get().is_expired_at(now) {
                    return Err(StorageError::Conflict(code));
                }
                Some(slot.insert(mapping))
            }
            Entry::Vacant(slot) => {
                slot.insert(mapping);
                None
            }
        };

        if let Some(stale) = replaced {
            trace!(code = %code, "replaced expired mapping");
            self.unindex(&stale);
        }
        self.urls.insert(original_url, code);

        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let now = self.clock.now();
        let mut removed = Vec::new();

        self.codes.retain(|_, mapping| {
            if mapping.is_expired_at(now) {
                removed.push(mapping.clone());
                false
            } else {
                true
            }
        });

        for stale in &removed {
            self.unindex(stale);
        }

        Ok(removed.len() as u64)
    }
}
