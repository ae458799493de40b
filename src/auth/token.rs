//! Cached bearer tokens and their expiry discipline.

// self
use crate::{
	_prelude::*,
	auth::{key::ClientKey, secret::AccessToken},
};

/// Fixed margin subtracted from the provider-reported lifetime so a token is
/// treated as expired slightly before the provider does, avoiding a token
/// that expires mid-flight.
pub const SAFETY_MARGIN: Duration = Duration::seconds(5);

/// Immutable cached bearer token.
///
/// Created on a successful token fetch and replaced, never mutated, on
/// refresh. `expires_at` already has [`SAFETY_MARGIN`] applied; a token is
/// never considered fresh past that adjusted instant.
#[derive(Clone)]
pub struct CachedToken {
	/// Bearer secret attached to outgoing requests.
	pub access_token: AccessToken,
	/// Instant the token was obtained.
	pub issued_at: OffsetDateTime,
	/// Adjusted expiry instant (`issued_at + lifetime - SAFETY_MARGIN`).
	pub expires_at: OffsetDateTime,
	/// Identity the token was issued for.
	pub issued_for: ClientKey,
}
impl CachedToken {
	/// Builds a token from the provider-reported lifetime, applying the
	/// safety margin. Lifetimes at or below the margin yield an entry that is
	/// already expired, forcing the next call back to the endpoint; a lifetime
	/// pushing the expiry outside the representable date range yields `None`.
	pub fn issued(
		issued_for: ClientKey,
		access_token: AccessToken,
		lifetime: Duration,
		issued_at: OffsetDateTime,
	) -> Option<Self> {
		let expires_at = issued_at.checked_add(lifetime)?.checked_sub(SAFETY_MARGIN)?;

		Some(Self { access_token, issued_at, expires_at, issued_for })
	}

	/// Returns `true` if the token is usable at the provided instant.
	pub fn is_fresh_at(&self, instant: OffsetDateTime) -> bool {
		instant < self.expires_at
	}

	/// Convenience helper that checks freshness against the current UTC instant.
	pub fn is_fresh(&self) -> bool {
		self.is_fresh_at(OffsetDateTime::now_utc())
	}
}
impl Debug for CachedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedToken")
			.field("access_token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.field("issued_for", &self.issued_for)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::auth::ScopeList;

	fn key() -> ClientKey {
		let endpoint =
			Url::parse("https://id.example.com/token").expect("Endpoint fixture should parse.");
		let scopes = ScopeList::new(["api.read"]).expect("Scope fixture should be valid.");

		ClientKey::new(endpoint, "client-a", &scopes)
	}

	#[test]
	fn expiry_applies_the_safety_margin() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let token =
			CachedToken::issued(key(), AccessToken::new("tok"), Duration::seconds(1800), issued)
				.expect("Lifetime fixture should be in range.");

		assert_eq!(token.expires_at, macros::datetime!(2025-01-01 00:29:55 UTC));
		assert!(token.is_fresh_at(macros::datetime!(2025-01-01 00:29:54 UTC)));
		assert!(!token.is_fresh_at(macros::datetime!(2025-01-01 00:29:55 UTC)));
	}

	#[test]
	fn lifetimes_within_the_margin_are_already_expired() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let token = CachedToken::issued(key(), AccessToken::new("tok"), Duration::seconds(5), issued)
			.expect("Lifetime fixture should be in range.");

		assert!(!token.is_fresh_at(issued));
	}

	#[test]
	fn out_of_range_lifetimes_are_rejected() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let token =
			CachedToken::issued(key(), AccessToken::new("tok"), Duration::seconds(i64::MAX), issued);

		assert!(token.is_none(), "An overflowing expiry must not produce a token.");
	}

	#[test]
	fn debug_output_redacts_the_secret() {
		let token = CachedToken::issued(
			key(),
			AccessToken::new("tok"),
			Duration::seconds(60),
			OffsetDateTime::now_utc(),
		)
		.expect("Lifetime fixture should be in range.");
		let rendered = format!("{token:?}");

		assert!(rendered.contains("<redacted>"));
		assert!(!rendered.contains("tok\""));
	}
}
