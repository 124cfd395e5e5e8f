//! Thread-safe in-memory [`TokenCache`] implementation for single-node gateways and tests.

// self
use crate::{
	_prelude::*,
	cache::{CacheError, CacheFuture, CachedTokenRecord, TokenCache},
	secret::TokenSecret,
};

type CacheMap = Arc<RwLock<HashMap<String, CachedTokenRecord>>>;

/// Thread-safe cache backend that keeps records in-process.
///
/// Expired records are evicted lazily on lookup and always read as absent.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache(CacheMap);
impl MemoryCache {
	/// Returns the raw record stored under `key`, including expired ones.
	pub fn record(&self, key: &str) -> Option<CachedTokenRecord> {
		self.0.read().get(key).cloned()
	}

	/// Returns the number of stored records, including expired ones.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true when no records are stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn get_now(map: &CacheMap, key: &str, now: OffsetDateTime) -> Option<TokenSecret> {
		{
			let guard = map.read();

			match guard.get(key) {
				Some(record) if !record.is_expired_at(now) => return Some(record.token.clone()),
				Some(_) => {},
				None => return None,
			}
		}

		let mut guard = map.write();

		// Another request may have stored a fresh token between the two locks.
		if guard.get(key).is_some_and(|record| record.is_expired_at(now)) {
			guard.remove(key);

			None
		} else {
			guard.get(key).map(|record| record.token.clone())
		}
	}

	fn put_now(
		map: &CacheMap,
		key: &str,
		value: TokenSecret,
		ttl: Duration,
		now: OffsetDateTime,
	) -> Result<(), CacheError> {
		if ttl.is_negative() {
			return Err(CacheError::Backend { message: format!("negative TTL for key `{key}`") });
		}

		map.write().insert(key.to_owned(), CachedTokenRecord::new(value, now, ttl));

		Ok(())
	}
}
impl TokenCache for MemoryCache {
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<TokenSecret>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::get_now(&map, key, OffsetDateTime::now_utc())) })
	}

	fn put<'a>(&'a self, key: &'a str, value: TokenSecret, ttl: Duration) -> CacheFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::put_now(&map, key, value, ttl, OffsetDateTime::now_utc()) })
	}
}
