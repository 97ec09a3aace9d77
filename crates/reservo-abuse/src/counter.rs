//! Fast Counter Cache
//!
//! Primary counting path for rate limiting: an atomic increment-with-expiry
//! keyed by operation class + origin address (fixed-window counting). The
//! [`CounterCache`] trait keeps the backend pluggable; [`MemoryCounterStore`]
//! is the bounded in-process implementation. A distributed store (e.g. a
//! Redis-style cluster) slots in behind the same trait.

use std::fmt::Debug;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;

use crate::clock::Clock;
use crate::config::AbuseConfig;
use reservo_types::prelude::*;

/// Counter backend failure
#[derive(Debug)]
pub enum CounterError {
	/// The backend is unreachable or not open. The evaluator recovers by
	/// falling back to the durable attempt log.
	Unavailable,
	/// The backend answered, but with something unusable. This must surface
	/// to the caller instead of silently under-counting.
	Backend(Box<str>),
}

impl std::fmt::Display for CounterError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			CounterError::Unavailable => write!(f, "counter store unavailable"),
			CounterError::Backend(msg) => write!(f, "counter store error: {}", msg),
		}
	}
}

impl std::error::Error for CounterError {}

impl From<CounterError> for Error {
	fn from(err: CounterError) -> Self {
		match err {
			CounterError::Unavailable => Error::Unavailable,
			CounterError::Backend(_) => Error::CacheError,
		}
	}
}

/// A fixed-window counter store
#[async_trait]
pub trait CounterCache: Debug + Send + Sync {
	/// Cheap connectivity probe. A closed store is skipped without issuing
	/// a call that would fail anyway.
	fn is_open(&self) -> bool;

	/// Atomically increments `key` and returns the post-increment count.
	/// The first increment of a window sets the key to expire after `ttl`;
	/// once the ttl elapses the key disappears and the next increment
	/// restarts the window.
	async fn incr(&self, key: &str, ttl: Duration) -> Result<u64, CounterError>;
}

/// One live counting window
struct CounterEntry {
	count: u64,
	expires_at: Timestamp,
}

/// Bounded in-process counter store
pub struct MemoryCounterStore {
	entries: Mutex<LruCache<Box<str>, CounterEntry>>,
	clock: Arc<dyn Clock>,
}

impl MemoryCounterStore {
	/// Create a store tracking at most `capacity` keys
	pub fn new(capacity: usize, clock: Arc<dyn Clock>) -> Self {
		const DEFAULT_CAP: NonZeroUsize = match NonZeroUsize::new(100_000) {
			Some(v) => v,
			None => unreachable!(),
		};
		let cap = NonZeroUsize::new(capacity).unwrap_or(DEFAULT_CAP);

		Self { entries: Mutex::new(LruCache::new(cap)), clock }
	}

	/// Create a store bounded by the configured key capacity
	pub fn from_config(config: &AbuseConfig, clock: Arc<dyn Clock>) -> Self {
		Self::new(config.max_tracked_keys, clock)
	}

	/// Number of tracked keys, live or expired
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl Debug for MemoryCounterStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MemoryCounterStore").field("tracked_keys", &self.len()).finish()
	}
}

#[async_trait]
impl CounterCache for MemoryCounterStore {
	fn is_open(&self) -> bool {
		true
	}

	async fn incr(&self, key: &str, ttl: Duration) -> Result<u64, CounterError> {
		let now = self.clock.now();
		let mut entries = self.entries.lock();

		if let Some(entry) = entries.get_mut(key) {
			if entry.expires_at > now {
				entry.count += 1;
				return Ok(entry.count);
			}
		}

		// Missing or expired: restart the window
		entries.put(Box::from(key), CounterEntry { count: 1, expires_at: now + ttl });
		Ok(1)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::clock::ManualClock;

	fn store() -> (MemoryCounterStore, Arc<ManualClock>) {
		let clock = Arc::new(ManualClock::new(Timestamp(1_000_000)));
		(MemoryCounterStore::new(100, clock.clone()), clock)
	}

	#[tokio::test]
	async fn test_incr_counts_within_window() {
		let (store, _clock) = store();

		for expected in 1..=5u64 {
			let count = store.incr("rl:login:10.0.0.1", Duration::from_secs(900)).await.unwrap();
			assert_eq!(count, expected);
		}
	}

	#[tokio::test]
	async fn test_window_expiry_restarts_count() {
		let (store, clock) = store();

		store.incr("k", Duration::from_secs(900)).await.unwrap();
		store.incr("k", Duration::from_secs(900)).await.unwrap();

		clock.advance(Duration::from_secs(901));
		let count = store.incr("k", Duration::from_secs(900)).await.unwrap();
		assert_eq!(count, 1);
	}

	#[tokio::test]
	async fn test_keys_are_isolated() {
		let (store, _clock) = store();

		store.incr("rl:login:10.0.0.1", Duration::from_secs(900)).await.unwrap();
		let count = store.incr("rl:login:10.0.0.2", Duration::from_secs(900)).await.unwrap();
		assert_eq!(count, 1);
		assert_eq!(store.len(), 2);
	}

	#[tokio::test]
	async fn test_capacity_bound() {
		let clock = Arc::new(ManualClock::new(Timestamp(1_000_000)));
		let store = MemoryCounterStore::new(2, clock);

		store.incr("a", Duration::from_secs(900)).await.unwrap();
		store.incr("b", Duration::from_secs(900)).await.unwrap();
		store.incr("c", Duration::from_secs(900)).await.unwrap();
		assert_eq!(store.len(), 2);
	}

	#[tokio::test]
	async fn test_from_config_respects_key_capacity() {
		let clock = Arc::new(ManualClock::new(Timestamp(1_000_000)));
		let config = AbuseConfig { max_tracked_keys: 2, ..AbuseConfig::default() };
		let store = MemoryCounterStore::from_config(&config, clock);

		store.incr("a", Duration::from_secs(900)).await.unwrap();
		store.incr("b", Duration::from_secs(900)).await.unwrap();
		store.incr("c", Duration::from_secs(900)).await.unwrap();
		assert_eq!(store.len(), 2);
	}
}

// vim: ts=4
