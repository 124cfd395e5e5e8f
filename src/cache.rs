//! Token cache contract and the built-in in-memory implementation.
//!
//! The broker issues at most one [`TokenCache::get`] and one [`TokenCache::put`] per request.
//! Expiry is owned entirely by the cache: an expired entry must read as absent, so the
//! decision engine never compares timestamps itself.

pub mod memory;

pub use memory::MemoryCache;

// self
use crate::{_prelude::*, secret::TokenSecret};

/// Boxed future returned by [`TokenCache`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Storage backend contract implemented by token caches.
pub trait TokenCache
where
	Self: Send + Sync,
{
	/// Returns the unexpired token stored under `key`, if any.
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<TokenSecret>>;

	/// Stores or replaces the token under `key` for `ttl`.
	fn put<'a>(&'a self, key: &'a str, value: TokenSecret, ttl: Duration) -> CacheFuture<'a, ()>;
}

/// Cached token plus its expiry instant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedTokenRecord {
	/// Cached bearer token.
	pub token: TokenSecret,
	/// Instant after which the record must read as absent.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
}
impl CachedTokenRecord {
	/// Creates a record expiring `ttl` after `now`.
	pub fn new(token: TokenSecret, now: OffsetDateTime, ttl: Duration) -> Self {
		Self { token, expires_at: now + ttl }
	}

	/// Returns true once `now` reaches the expiry instant.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		now >= self.expires_at
	}
}

/// Error type produced by [`TokenCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// Backend-level failure for the cache engine.
	#[error("Cache backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
