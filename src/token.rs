//! Client-credentials token acquisition with caching + singleflight guards.
//!
//! [`TokenService::get_token`] checks the cache first and only contacts the
//! token endpoint when no fresh entry exists. A per-[`ClientKey`] guard
//! serializes concurrent misses so the losers re-check the cache and reuse
//! the winner's token instead of stampeding the endpoint. The cache is only
//! written after a successful exchange; a rejected or failed refresh leaves
//! any prior entry in place.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, CachedToken, ClientKey, ScopeList},
	cache::TokenCache,
	client::response::decode_json,
	error::{ConfigError, DecodeError},
	http::{HttpTransport, Method, TransportRequest, TransportResponse},
	obs::{self, CallKind, CallOutcome, CallSpan},
};

/// Bytes escaped when form-encoding the token request (everything outside
/// the unreserved set).
const FORM_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');
/// Longest provider error body excerpt carried into a denial description.
const BODY_PREVIEW_LIMIT: usize = 256;

/// Immutable client-credentials configuration bound to a request.
///
/// Built via [`CredentialOptions::builder`]; missing endpoint, id, or secret
/// is a configuration error raised at build time, not at call time.
#[derive(Clone)]
pub struct CredentialOptions {
	token_endpoint: Url,
	client_id: String,
	client_secret: AccessToken,
	scopes: ScopeList,
	force_refresh: bool,
}
impl CredentialOptions {
	/// Returns a builder with no fields set.
	pub fn builder() -> CredentialOptionsBuilder {
		CredentialOptionsBuilder::default()
	}

	/// Token endpoint the credentials authenticate against.
	pub fn token_endpoint(&self) -> &Url {
		&self.token_endpoint
	}

	/// OAuth 2.0 client identifier.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// Requested scopes, in caller order.
	pub fn scopes(&self) -> &ScopeList {
		&self.scopes
	}

	/// Returns `true` when the freshness check is bypassed.
	pub fn force_refresh(&self) -> bool {
		self.force_refresh
	}

	/// Cache identity derived from endpoint, client id, and scopes.
	pub fn client_key(&self) -> ClientKey {
		ClientKey::new(self.token_endpoint.clone(), self.client_id.clone(), &self.scopes)
	}

	fn token_request(&self) -> TransportRequest {
		let mut form = vec![("grant_type", "client_credentials".to_owned())];

		if !self.scopes.is_empty() {
			form.push(("scope", self.scopes.joined()));
		}

		let credentials =
			STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret.expose()));

		TransportRequest {
			method: Method::Post,
			url: self.token_endpoint.clone(),
			headers: vec![
				("authorization".into(), format!("Basic {credentials}")),
				("content-type".into(), "application/x-www-form-urlencoded".into()),
				("accept".into(), "application/json".into()),
			],
			body: Some(form_encode(&form).into_bytes()),
		}
	}
}
impl Debug for CredentialOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialOptions")
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("scopes", &self.scopes)
			.field("force_refresh", &self.force_refresh)
			.finish()
	}
}

/// Builder for [`CredentialOptions`].
#[derive(Clone, Debug, Default)]
pub struct CredentialOptionsBuilder {
	token_endpoint: Option<Url>,
	client_id: Option<String>,
	client_secret: Option<AccessToken>,
	scopes: ScopeList,
	force_refresh: bool,
}
impl CredentialOptionsBuilder {
	/// Sets the token endpoint URL.
	pub fn token_endpoint(mut self, endpoint: Url) -> Self {
		self.token_endpoint = Some(endpoint);

		self
	}

	/// Sets the OAuth 2.0 client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<AccessToken>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Sets the requested scopes (optional; defaults to none).
	pub fn scopes(mut self, scopes: ScopeList) -> Self {
		self.scopes = scopes;

		self
	}

	/// Bypasses the freshness check on the next acquisition.
	pub fn force_refresh(mut self, force: bool) -> Self {
		self.force_refresh = force;

		self
	}

	/// Validates the required fields and produces [`CredentialOptions`].
	pub fn build(self) -> Result<CredentialOptions, ConfigError> {
		let token_endpoint = self
			.token_endpoint
			.ok_or(ConfigError::MissingCredentialField { field: "token_endpoint" })?;
		let client_id =
			self.client_id.ok_or(ConfigError::MissingCredentialField { field: "client_id" })?;
		let client_secret = self
			.client_secret
			.ok_or(ConfigError::MissingCredentialField { field: "client_secret" })?;

		Ok(CredentialOptions {
			token_endpoint,
			client_id,
			client_secret,
			scopes: self.scopes,
			force_refresh: self.force_refresh,
		})
	}
}

/// Result of a token acquisition attempt.
///
/// A provider rejection is data, not an error: callers receive the
/// provider-reported code/description/status and decide how to proceed.
#[derive(Clone, Debug)]
pub enum TokenOutcome {
	/// A usable token, either cached or freshly fetched.
	Granted(CachedToken),
	/// The provider rejected the credentials; the cache was left untouched.
	Denied {
		/// RFC 6749 `error` code, when the provider supplied one.
		code: Option<String>,
		/// RFC 6749 `error_description`, or a body excerpt as fallback.
		description: Option<String>,
		/// Raw HTTP status returned by the token endpoint.
		status: u16,
	},
}

/// Wire shape of a successful token endpoint response.
#[derive(Debug, Deserialize)]
struct WireTokenResponse {
	access_token: AccessToken,
	expires_in: i64,
}

/// Lenient wire shape of an RFC 6749 error response.
#[derive(Debug, Default, Deserialize)]
struct WireTokenError {
	#[serde(default)]
	error: Option<String>,
	#[serde(default)]
	error_description: Option<String>,
}

/// Acquires and caches client-credentials tokens over an [`HttpTransport`].
pub struct TokenService<C>
where
	C: ?Sized + HttpTransport,
{
	cache: Arc<dyn TokenCache>,
	transport: Arc<C>,
	guards: Arc<Mutex<HashMap<ClientKey, Arc<AsyncMutex<()>>>>>,
}
impl<C> TokenService<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a service over the provided cache and transport.
	pub fn new(cache: Arc<dyn TokenCache>, transport: impl Into<Arc<C>>) -> Self {
		Self { cache, transport: transport.into(), guards: Default::default() }
	}

	/// Returns a token for the provided credentials, fetching on cache miss.
	pub async fn get_token(&self, options: &CredentialOptions) -> Result<TokenOutcome> {
		const KIND: CallKind = CallKind::TokenFetch;

		let span = CallSpan::new(KIND, "get_token");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.get_token_inner(options)).await;

		match &result {
			Ok(TokenOutcome::Granted(_)) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Ok(TokenOutcome::Denied { .. }) => obs::record_call_outcome(KIND, CallOutcome::Denied),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	async fn get_token_inner(&self, options: &CredentialOptions) -> Result<TokenOutcome> {
		let key = options.client_key();
		let guard = self.refresh_guard(&key);
		let _singleflight = guard.lock().await;
		let now = OffsetDateTime::now_utc();

		if !options.force_refresh()
			&& let Some(cached) =
				self.cache.get(&key).await?.filter(|token| token.is_fresh_at(now))
		{
			return Ok(TokenOutcome::Granted(cached));
		}

		let response = self.transport.execute(options.token_request()).await?;

		if !response.is_success() {
			return Ok(denial_from(&response));
		}

		let wire: WireTokenResponse = decode_json(&response.body, "token response")?;

		if wire.expires_in <= 0 {
			return Err(DecodeError::InvalidLifetime { seconds: wire.expires_in }.into());
		}

		let token =
			CachedToken::issued(key, wire.access_token, Duration::seconds(wire.expires_in), now)
				.ok_or(DecodeError::InvalidLifetime { seconds: wire.expires_in })?;

		self.cache.put(token.clone()).await?;

		Ok(TokenOutcome::Granted(token))
	}

	/// Returns (and creates on demand) the singleflight guard for a client key.
	fn refresh_guard(&self, key: &ClientKey) -> Arc<AsyncMutex<()>> {
		let mut guards = self.guards.lock();

		guards.entry(key.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}
}
impl<C> Clone for TokenService<C>
where
	C: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			cache: self.cache.clone(),
			transport: self.transport.clone(),
			guards: self.guards.clone(),
		}
	}
}
impl<C> Debug for TokenService<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenService").finish_non_exhaustive()
	}
}

fn denial_from(response: &TransportResponse) -> TokenOutcome {
	let wire: WireTokenError = serde_json::from_slice(&response.body).unwrap_or_default();
	let description = wire.error_description.or_else(|| body_preview(&response.body));

	TokenOutcome::Denied { code: wire.error, description, status: response.status }
}

fn body_preview(body: &[u8]) -> Option<String> {
	if body.is_empty() {
		return None;
	}

	Some(String::from_utf8_lossy(body).chars().take(BODY_PREVIEW_LIMIT).collect())
}

fn form_encode(pairs: &[(&str, String)]) -> String {
	let mut buf = String::new();

	for (idx, (name, value)) in pairs.iter().enumerate() {
		if idx > 0 {
			buf.push('&');
		}

		buf.push_str(&utf8_percent_encode(name, FORM_ESCAPE).to_string());
		buf.push('=');
		buf.push_str(&utf8_percent_encode(value, FORM_ESCAPE).to_string());
	}

	buf
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::{cache::MemoryCache, error::Error, http::TransportFuture};

	/// Transport double that counts dispatches and replays a canned response.
	struct CountingTransport {
		calls: AtomicUsize,
		status: u16,
		body: &'static str,
	}
	impl CountingTransport {
		fn new(status: u16, body: &'static str) -> Self {
			Self { calls: AtomicUsize::new(0), status, body }
		}

		fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}
	impl HttpTransport for CountingTransport {
		fn execute(&self, _request: TransportRequest) -> TransportFuture<'_, TransportResponse> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			let response = TransportResponse {
				status: self.status,
				reason: None,
				headers: Vec::new(),
				body: self.body.as_bytes().to_vec(),
			};

			Box::pin(async move { Ok(response) })
		}
	}

	fn options() -> CredentialOptions {
		CredentialOptions::builder()
			.token_endpoint(
				Url::parse("https://id.example.com/token").expect("Endpoint fixture should parse."),
			)
			.client_id("client-a")
			.client_secret("secret-a")
			.scopes(ScopeList::new(["api.read"]).expect("Scope fixture should be valid."))
			.build()
			.expect("Credential options fixture should build.")
	}

	fn service(
		transport: Arc<CountingTransport>,
	) -> (TokenService<CountingTransport>, Arc<MemoryCache>) {
		let cache = Arc::new(MemoryCache::default());

		(TokenService::new(cache.clone(), transport), cache)
	}

	#[test]
	fn builder_requires_endpoint_id_and_secret() {
		let err = CredentialOptions::builder()
			.client_id("client-a")
			.client_secret("secret-a")
			.build()
			.expect_err("Builder should reject missing endpoints.");

		assert!(matches!(
			err,
			ConfigError::MissingCredentialField { field: "token_endpoint" }
		));

		let err = CredentialOptions::builder()
			.token_endpoint(
				Url::parse("https://id.example.com/token").expect("Endpoint fixture should parse."),
			)
			.client_secret("secret-a")
			.build()
			.expect_err("Builder should reject missing client ids.");

		assert!(matches!(err, ConfigError::MissingCredentialField { field: "client_id" }));
	}

	#[test]
	fn token_request_encodes_form_and_basic_auth() {
		let request = options().token_request();
		let body = String::from_utf8(request.body.expect("Token request should carry a body."))
			.expect("Form body should be UTF-8.");

		assert_eq!(request.method, Method::Post);
		assert_eq!(body, "grant_type=client_credentials&scope=api.read");

		let authorization = request
			.headers
			.iter()
			.find(|(name, _)| name == "authorization")
			.map(|(_, value)| value.clone())
			.expect("Token request should carry an authorization header.");

		assert_eq!(
			authorization,
			format!("Basic {}", STANDARD.encode("client-a:secret-a")),
		);
	}

	#[test]
	fn form_encoding_escapes_reserved_bytes() {
		let encoded = form_encode(&[("scope", "api read&write".to_owned())]);

		assert_eq!(encoded, "scope=api%20read%26write");
	}

	#[tokio::test]
	async fn second_call_reuses_the_cached_token() {
		let transport = Arc::new(CountingTransport::new(
			200,
			"{\"access_token\":\"tok\",\"token_type\":\"bearer\",\"expires_in\":1800}",
		));
		let (service, _cache) = service(transport.clone());
		let options = options();
		let first = service.get_token(&options).await.expect("First fetch should succeed.");
		let second = service.get_token(&options).await.expect("Second fetch should succeed.");

		assert!(matches!(first, TokenOutcome::Granted(_)));
		assert!(matches!(second, TokenOutcome::Granted(_)));
		assert_eq!(transport.calls(), 1, "Second call must be served from the cache.");
	}

	#[tokio::test]
	async fn concurrent_misses_coalesce_into_one_fetch() {
		let transport = Arc::new(CountingTransport::new(
			200,
			"{\"access_token\":\"tok\",\"token_type\":\"bearer\",\"expires_in\":900}",
		));
		let (service, _cache) = service(transport.clone());
		let options = options();
		let (first, second) =
			tokio::join!(service.get_token(&options), service.get_token(&options));

		assert!(matches!(first.expect("First concurrent call should succeed."), TokenOutcome::Granted(_)));
		assert!(matches!(second.expect("Second concurrent call should succeed."), TokenOutcome::Granted(_)));
		assert_eq!(transport.calls(), 1, "Concurrent misses must share one endpoint call.");
	}

	#[tokio::test]
	async fn denial_carries_provider_fields_and_skips_the_cache() {
		let transport = Arc::new(CountingTransport::new(
			401,
			"{\"error\":\"invalid_client\",\"error_description\":\"unknown client\"}",
		));
		let (service, cache) = service(transport);
		let options = options();
		let outcome = service.get_token(&options).await.expect("Denial should not be an Err.");

		match outcome {
			TokenOutcome::Denied { code, description, status } => {
				assert_eq!(code.as_deref(), Some("invalid_client"));
				assert_eq!(description.as_deref(), Some("unknown client"));
				assert_eq!(status, 401);
			},
			TokenOutcome::Granted(_) => panic!("A 401 must not grant a token."),
		}

		let cached = cache
			.get(&options.client_key())
			.await
			.expect("Cache get should succeed.");

		assert!(cached.is_none(), "A denied fetch must not populate the cache.");
	}

	#[tokio::test]
	async fn non_positive_lifetime_is_a_decode_error() {
		let transport = Arc::new(CountingTransport::new(
			200,
			"{\"access_token\":\"tok\",\"expires_in\":0}",
		));
		let (service, _cache) = service(transport);
		let err = service
			.get_token(&options())
			.await
			.expect_err("A zero lifetime should be rejected.");

		assert!(matches!(err, Error::Decode(DecodeError::InvalidLifetime { seconds: 0 })));
	}

	#[tokio::test]
	async fn overflowing_lifetime_is_a_decode_error() {
		let transport = Arc::new(CountingTransport::new(
			200,
			"{\"access_token\":\"tok\",\"expires_in\":9223372036854775807}",
		));
		let (service, cache) = service(transport);
		let options = options();
		let err = service
			.get_token(&options)
			.await
			.expect_err("A lifetime that overflows the expiry instant should be rejected.");

		assert!(matches!(err, Error::Decode(DecodeError::InvalidLifetime { seconds: i64::MAX })));

		let cached = cache.get(&options.client_key()).await.expect("Cache get should succeed.");

		assert!(cached.is_none(), "A rejected lifetime must not populate the cache.");
	}
}
