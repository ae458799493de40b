//! Storage contract and built-in backend for cached bearer tokens.

pub mod memory;

pub use memory::MemoryCache;

// self
use crate::{
	_prelude::*,
	auth::{CachedToken, ClientKey},
};

/// Boxed future returned by [`TokenCache`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Storage contract for tokens keyed by client identity.
///
/// The cache stores whatever it is given and returns whatever it holds;
/// freshness is judged by the caller against its own clock. There is no
/// eviction beyond replacement via [`put`](Self::put), and the token service
/// only calls `put` after a successful fetch, so a failed refresh can never
/// displace a prior entry.
pub trait TokenCache
where
	Self: Send + Sync,
{
	/// Fetches the entry associated with the key, if present.
	///
	/// Entries come back exactly as stored, expired or not; callers judge
	/// freshness against their own clock via [`CachedToken::is_fresh_at`].
	fn get<'a>(&'a self, key: &'a ClientKey) -> CacheFuture<'a, Option<CachedToken>>;

	/// Inserts or replaces the entry for `token.issued_for`.
	fn put(&self, token: CachedToken) -> CacheFuture<'_, ()>;
}

/// Error type produced by [`TokenCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// Backend-level failure for the storage engine.
	#[error("Cache backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
