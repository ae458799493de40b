//! Cache identity for issued tokens.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::ScopeList};

/// Identity a cached token was issued for.
///
/// Tokens are keyed by token endpoint, client identifier, and a stable
/// fingerprint of the requested scopes; the same credentials asked for a
/// different scope list occupy a separate cache slot.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ClientKey {
	/// Token endpoint the credentials authenticate against.
	pub token_endpoint: Url,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Base64 (no padding) SHA-256 digest of the canonical key string.
	pub fingerprint: String,
}
impl ClientKey {
	/// Builds a key for the provided endpoint, client id, and scopes.
	pub fn new(token_endpoint: Url, client_id: impl Into<String>, scopes: &ScopeList) -> Self {
		let client_id = client_id.into();
		let fingerprint = compute_fingerprint(&token_endpoint, &client_id, scopes);

		Self { token_endpoint, client_id, fingerprint }
	}
}
impl Debug for ClientKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientKey")
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("client_id", &self.client_id)
			.field("fingerprint", &self.fingerprint)
			.finish()
	}
}
impl Display for ClientKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}@{}", self.client_id, self.token_endpoint)
	}
}

fn compute_fingerprint(endpoint: &Url, client_id: &str, scopes: &ScopeList) -> String {
	let canonical = format!("{endpoint}|{client_id}|{}", scopes.joined());
	let mut hasher = Sha256::new();

	hasher.update(canonical.as_bytes());

	let digest = hasher.finalize();

	STANDARD_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn endpoint() -> Url {
		Url::parse("https://id.example.com/token").expect("Endpoint fixture should parse.")
	}

	#[test]
	fn fingerprint_is_stable_for_equal_inputs() {
		let scopes = ScopeList::new(["api.read"]).expect("Scope fixture should be valid.");
		let lhs = ClientKey::new(endpoint(), "client-a", &scopes);
		let rhs = ClientKey::new(endpoint(), "client-a", &scopes);

		assert_eq!(lhs, rhs);
		assert_eq!(lhs.fingerprint, rhs.fingerprint);
	}

	#[test]
	fn fingerprint_distinguishes_client_and_scope_order() {
		let scopes = ScopeList::new(["api.read", "api.write"]).expect("Scopes should be valid.");
		let reversed = ScopeList::new(["api.write", "api.read"]).expect("Scopes should be valid.");
		let base = ClientKey::new(endpoint(), "client-a", &scopes);
		let other_client = ClientKey::new(endpoint(), "client-b", &scopes);
		let other_order = ClientKey::new(endpoint(), "client-a", &reversed);

		assert_ne!(base.fingerprint, other_client.fingerprint);
		assert_ne!(base.fingerprint, other_order.fingerprint);
	}
}
