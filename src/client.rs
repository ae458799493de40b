//! Request service: builds, authorizes, dispatches, and maps one request.

pub mod body;
pub mod request;
pub mod response;

pub use body::RequestBody;
pub use request::RequestSpec;
pub use response::{Decode, Envelope, Json};

// self
use crate::{
	_prelude::*,
	cache::TokenCache,
	http::{HttpTransport, TransportRequest},
	obs::{self, CallKind, CallOutcome, CallSpan},
	token::{TokenOutcome, TokenService},
};
#[cfg(feature = "reqwest")]
use crate::{error::ConfigError, http::ReqwestTransport};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestTransport>;

/// Typed HTTP client that attaches cached bearer tokens before dispatch.
///
/// The client owns the transport and a [`TokenService`] sharing the same
/// transport, so token fetches and resource calls travel the same stack.
/// Each [`send`](Self::send) call runs the full pipeline: precondition
/// validation, optional token acquisition, dispatch, and envelope mapping.
pub struct ApiClient<C>
where
	C: ?Sized + HttpTransport,
{
	transport: Arc<C>,
	tokens: TokenService<C>,
}
impl<C> ApiClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a client over the provided cache and transport.
	pub fn with_transport(cache: Arc<dyn TokenCache>, transport: impl Into<Arc<C>>) -> Self {
		let transport = transport.into();

		Self { tokens: TokenService::new(cache, transport.clone()), transport }
	}

	/// Token service backing this client; usable directly when only a token
	/// is needed.
	pub fn tokens(&self) -> &TokenService<C> {
		&self.tokens
	}

	/// Dispatches the spec and maps the response into a typed envelope.
	pub async fn send<T>(&self, spec: RequestSpec) -> Result<Envelope<T>>
	where
		T: Decode,
	{
		const KIND: CallKind = CallKind::Resource;

		let span = CallSpan::new(KIND, "send");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.send_inner(spec)).await;

		match &result {
			Ok(envelope) if envelope.is_error =>
				obs::record_call_outcome(KIND, CallOutcome::Denied),
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	async fn send_inner<T>(&self, spec: RequestSpec) -> Result<Envelope<T>>
	where
		T: Decode,
	{
		spec.validate()?;

		let RequestSpec { method, url, mut headers, body, credentials } = spec;

		if let Some(options) = credentials {
			match self.tokens.get_token(&options).await? {
				TokenOutcome::Granted(token) => headers.push((
					"authorization".into(),
					format!("Bearer {}", token.access_token.expose()),
				)),
				TokenOutcome::Denied { code, description, status } =>
					return Ok(Envelope::denied(status, code, description)),
			}
		}
		if let Some(content_type) = body.content_type()
			&& !headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("content-type"))
		{
			headers.push(("content-type".into(), content_type.to_owned()));
		}

		let request = TransportRequest { method, url, headers, body: body.into_bytes() };
		let response = self.transport.execute(request).await?;

		if !response.is_success() {
			return Ok(Envelope::http_failure(response));
		}

		Ok(Envelope::decoded(response)?)
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestTransport> {
	/// Creates a client with a fresh reqwest-backed transport.
	pub fn new(cache: Arc<dyn TokenCache>) -> Result<Self, ConfigError> {
		Ok(Self::with_transport(cache, ReqwestTransport::new()?))
	}
}
impl<C> Clone for ApiClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { transport: self.transport.clone(), tokens: self.tokens.clone() }
	}
}
impl<C> Debug for ApiClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient").finish_non_exhaustive()
	}
}
