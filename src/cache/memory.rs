//! Thread-safe in-memory [`TokenCache`] implementation.

// self
use crate::{
	_prelude::*,
	auth::{CachedToken, ClientKey},
	cache::{CacheError, CacheFuture, TokenCache},
};

type CacheMap = Arc<RwLock<HashMap<ClientKey, CachedToken>>>;

/// Process-wide in-memory token cache guarded by a read-write lock.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache(CacheMap);
impl MemoryCache {
	fn get_now(map: CacheMap, key: ClientKey) -> Option<CachedToken> {
		map.read().get(&key).cloned()
	}

	fn put_now(map: CacheMap, token: CachedToken) -> Result<(), CacheError> {
		map.write().insert(token.issued_for.clone(), token);

		Ok(())
	}
}
impl TokenCache for MemoryCache {
	fn get<'a>(&'a self, key: &'a ClientKey) -> CacheFuture<'a, Option<CachedToken>> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Ok(Self::get_now(map, key)) })
	}

	fn put(&self, token: CachedToken) -> CacheFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::put_now(map, token) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::{AccessToken, ScopeList};

	fn key(client_id: &str) -> ClientKey {
		let endpoint =
			Url::parse("https://id.example.com/token").expect("Endpoint fixture should parse.");
		let scopes = ScopeList::new(["api.read"]).expect("Scope fixture should be valid.");

		ClientKey::new(endpoint, client_id, &scopes)
	}

	fn token(client_id: &str, value: &str) -> CachedToken {
		CachedToken::issued(
			key(client_id),
			AccessToken::new(value),
			Duration::seconds(600),
			OffsetDateTime::now_utc(),
		)
		.expect("Lifetime fixture should be in range.")
	}

	#[tokio::test]
	async fn put_replaces_the_entry_for_the_same_key() {
		let cache = MemoryCache::default();

		cache.put(token("client-a", "first")).await.expect("First put should succeed.");
		cache.put(token("client-a", "second")).await.expect("Second put should succeed.");

		let stored = cache
			.get(&key("client-a"))
			.await
			.expect("Cache get should succeed.")
			.expect("Entry should be present after two puts.");

		assert_eq!(stored.access_token.expose(), "second");
	}

	#[tokio::test]
	async fn keys_partition_by_client_identity() {
		let cache = MemoryCache::default();

		cache.put(token("client-a", "token-a")).await.expect("Put for client-a should succeed.");

		let missing = cache.get(&key("client-b")).await.expect("Cache get should succeed.");

		assert!(missing.is_none(), "client-b must not observe client-a's token.");
	}
}
