//! Structured decoder cache
//!
//! One decoder per distinct schema, shared by every caller for the lifetime
//! of the process. Entries are keyed by the schema's canonical form and are
//! never evicted; schemas are few and reused across many records.
//!
//! Builds happen outside the lock. When two callers race on the same
//! schema, the first install wins and the loser's decoder is dropped
//! without ever being handed out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use super::decoder::StructuredDecoder;
use super::errors::CodecResult;
use crate::observability::{log_event_with_fields, Event};
use crate::schema::Schema;

static GLOBAL: OnceLock<Arc<DecoderCache>> = OnceLock::new();

/// Cache statistics, passive only
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from an installed entry
    pub hits: u64,
    /// Decoders built and installed
    pub builds: u64,
    /// Decoders built but discarded because another caller installed first
    pub races_lost: u64,
}

/// Concurrent schema -> decoder map
#[derive(Debug, Default)]
pub struct DecoderCache {
    entries: RwLock<HashMap<String, Arc<StructuredDecoder>>>,
    hits: AtomicU64,
    builds: AtomicU64,
    races_lost: AtomicU64,
}

impl DecoderCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache
    pub fn global() -> Arc<DecoderCache> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(DecoderCache::new())))
    }

    /// Return the canonical decoder for `schema`, building it if absent.
    ///
    /// A build failure propagates to this caller and installs nothing.
    pub fn get_or_build(&self, schema: &Schema) -> CodecResult<Arc<StructuredDecoder>> {
        let key = schema.canonical_form();

        if let Some(decoder) = self.lookup(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(decoder);
        }

        let built = Arc::new(StructuredDecoder::build(schema)?);

        let winner = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            match entries.get(&key) {
                Some(winner) => Some(Arc::clone(winner)),
                None => {
                    entries.insert(key.clone(), Arc::clone(&built));
                    None
                }
            }
        };

        match winner {
            Some(winner) => {
                self.races_lost.fetch_add(1, Ordering::Relaxed);
                log_event_with_fields(Event::DecoderRaceLost, &[("schema", &key)]);
                Ok(winner)
            }
            None => {
                self.builds.fetch_add(1, Ordering::Relaxed);
                log_event_with_fields(Event::DecoderBuilt, &[("schema", &key)]);
                Ok(built)
            }
        }
    }

    fn lookup(&self, key: &str) -> Option<Arc<StructuredDecoder>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Whether a decoder is installed for `schema`
    pub fn contains(&self, schema: &Schema) -> bool {
        self.lookup(&schema.canonical_form()).is_some()
    }

    /// Number of installed decoders
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
            races_lost: self.races_lost.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecError;
    use crate::schema::SchemaError;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_second_lookup_hits() {
        let cache = DecoderCache::new();
        let schema = Schema::array(Schema::Int);

        let first = cache.get_or_build(&schema).unwrap();
        let second = cache.get_or_build(&schema).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                builds: 1,
                races_lost: 0
            }
        );
    }

    #[test]
    fn test_structurally_equal_schemas_share_entry() {
        let cache = DecoderCache::new();
        let a = cache.get_or_build(&Schema::map(Schema::String)).unwrap();
        let b = cache.get_or_build(&Schema::map(Schema::String)).unwrap();
        let c = cache.get_or_build(&Schema::map(Schema::Long)).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_failed_build_installs_nothing() {
        let cache = DecoderCache::new();
        let schema = Schema::array(Schema::enumeration("Empty", &[]));

        let err = cache.get_or_build(&schema).unwrap_err();
        assert!(matches!(err, CodecError::Schema(SchemaError::EmptyEnum(_))));
        assert!(cache.is_empty());
        assert!(!cache.contains(&schema));
    }

    #[test]
    fn test_concurrent_builds_share_one_winner() {
        const THREADS: usize = 16;
        let cache = DecoderCache::new();
        let schema = Schema::array(Schema::map(Schema::Double));
        let barrier = Barrier::new(THREADS);

        let decoders: Vec<Arc<StructuredDecoder>> = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        cache.get_or_build(&schema).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winner = cache.get_or_build(&schema).unwrap();
        assert!(decoders.iter().all(|d| Arc::ptr_eq(d, &winner)));
        assert_eq!(cache.len(), 1);

        let stats = cache.stats();
        assert_eq!(stats.builds, 1);
        assert_eq!(stats.hits + stats.races_lost, THREADS as u64);
    }

    #[test]
    fn test_lock_released_before_return() {
        let cache = DecoderCache::new();
        let schema = Schema::array(Schema::Bytes);

        let built = cache.get_or_build(&schema).unwrap();
        assert!(cache.entries.try_write().is_ok());

        let hit = cache.get_or_build(&schema).unwrap();
        assert!(Arc::ptr_eq(&built, &hit));
        assert!(cache.entries.try_write().is_ok());
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&DecoderCache::global(), &DecoderCache::global()));
    }
}
