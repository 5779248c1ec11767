//! Cache for decoding short map keys.
//!
//! The same handful of keys repeats across a typical payload. [`CachedKeyDecoder`]
//! remembers the strings it has produced for short byte sequences, bucketed by length,
//! and returns the cached string on a byte-wise match instead of decoding again.

use crate::utf8::utf8_decode;
use parking_lot::Mutex;
use rand::Rng;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::trace;

pub const DEFAULT_MAX_KEY_LENGTH: usize = 16;
pub const DEFAULT_MAX_LENGTH_PER_KEY: usize = 16;

/// Decodes the UTF-8 bytes of a map key.
///
/// Implementations are shared between decoders and must be thread safe.
pub trait KeyDecoder: Send + Sync + fmt::Debug {
    /// Whether a key of `byte_length` bytes should be routed through [`decode`](Self::decode).
    fn can_be_cached(&self, byte_length: usize) -> bool;

    /// Decodes `bytes`, which are at most as long as `can_be_cached` allows.
    fn decode(&self, bytes: &[u8]) -> String;
}

struct KeyCacheRecord {
    bytes: Box<[u8]>,
    value: String,
}

struct CacheState {
    // caches[n - 1] holds keys of n bytes
    caches: Vec<Vec<KeyCacheRecord>>,
    hit: u64,
    miss: u64,
}

/// Hit and miss counters of a [`CachedKeyDecoder`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hit: u64,
    pub miss: u64,
}

/// A [`KeyDecoder`] with a per-length cache and random replacement.
///
/// # Examples
///
/// ```rust
/// use msgpack_codec::key_decoder::{CachedKeyDecoder, KeyDecoder};
///
/// let decoder = CachedKeyDecoder::new(16, 16);
/// assert!(decoder.can_be_cached(3));
/// assert!(!decoder.can_be_cached(0));
///
/// assert_eq!(decoder.decode(b"foo"), "foo");
/// assert_eq!(decoder.decode(b"foo"), "foo");
/// assert_eq!(decoder.stats().hit, 1);
/// assert_eq!(decoder.stats().miss, 1);
/// ```
pub struct CachedKeyDecoder {
    max_key_length: usize,
    max_length_per_key: usize,
    state: Mutex<CacheState>,
}

impl CachedKeyDecoder {
    /// Creates a cache for keys of up to `max_key_length` bytes, holding at most
    /// `max_length_per_key` entries per byte length.
    #[must_use]
    pub fn new(max_key_length: usize, max_length_per_key: usize) -> Self {
        CachedKeyDecoder {
            max_key_length,
            max_length_per_key,
            state: Mutex::new(CacheState {
                caches: (0..max_key_length).map(|_| Vec::new()).collect(),
                hit: 0,
                miss: 0,
            }),
        }
    }

    /// Process-wide cache used by the default decoder options.
    #[must_use]
    pub fn shared() -> Arc<dyn KeyDecoder> {
        static DEFAULT: OnceLock<Arc<CachedKeyDecoder>> = OnceLock::new();
        let shared = DEFAULT.get_or_init(|| Arc::new(CachedKeyDecoder::default()));
        Arc::clone(shared) as Arc<dyn KeyDecoder>
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            hit: state.hit,
            miss: state.miss,
        }
    }

    fn store(&self, state: &mut CacheState, bytes: &[u8], value: &str) {
        let max_length_per_key = self.max_length_per_key;
        let records = &mut state.caches[bytes.len() - 1];
        let record = KeyCacheRecord {
            bytes: bytes.into(),
            value: value.to_string(),
        };
        if records.len() >= max_length_per_key {
            if records.is_empty() {
                return;
            }
            let victim = rand::thread_rng().gen_range(0..records.len());
            trace!(length = bytes.len(), victim, "evicting cached key");
            records[victim] = record;
        } else {
            records.push(record);
        }
    }
}

impl Default for CachedKeyDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_KEY_LENGTH, DEFAULT_MAX_LENGTH_PER_KEY)
    }
}

impl KeyDecoder for CachedKeyDecoder {
    fn can_be_cached(&self, byte_length: usize) -> bool {
        byte_length > 0 && byte_length <= self.max_key_length
    }

    fn decode(&self, bytes: &[u8]) -> String {
        if !self.can_be_cached(bytes.len()) {
            return utf8_decode(bytes);
        }
        let mut state = self.state.lock();
        let found = state.caches[bytes.len() - 1]
            .iter()
            .find(|record| *record.bytes == *bytes)
            .map(|record| record.value.clone());
        if let Some(value) = found {
            state.hit += 1;
            return value;
        }
        state.miss += 1;
        let value = utf8_decode(bytes);
        self.store(&mut state, bytes, &value);
        value
    }
}

impl fmt::Debug for CachedKeyDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedKeyDecoder")
            .field("max_key_length", &self.max_key_length)
            .field("max_length_per_key", &self.max_length_per_key)
            .field("stats", &self.stats())
            .finish()
    }
}
