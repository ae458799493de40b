//! Transport primitives shared by the token service and the request client.
//!
//! [`HttpTransport`] is the crate's only dependency on an HTTP stack. The
//! token service and the request client both dispatch through it, so a
//! custom transport (or a test double) slots in behind a single trait.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;
use crate::error::TransportError;

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, TransportError>> + 'a + Send>>;

/// HTTP methods the client can dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`; no request-body semantics.
	Get,
	/// `HEAD`; no request-body semantics.
	Head,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `PATCH`.
	Patch,
	/// `DELETE`; no request-body semantics.
	Delete,
}
impl Method {
	/// Returns the canonical uppercase method label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Head => "HEAD",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}

	/// Returns `true` if the method carries request-body semantics.
	///
	/// GET, HEAD, and DELETE are bodyless; supplying a body for them is a
	/// precondition failure, not a network round trip.
	pub const fn allows_body(self) -> bool {
		match self {
			Method::Get | Method::Head | Method::Delete => false,
			Method::Post | Method::Put | Method::Patch => true,
		}
	}

	#[cfg(feature = "reqwest")]
	pub(crate) fn as_reqwest(self) -> reqwest::Method {
		match self {
			Method::Get => reqwest::Method::GET,
			Method::Head => reqwest::Method::HEAD,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fully assembled outbound request handed to the transport.
#[derive(Clone, Debug)]
pub struct TransportRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Header name/value pairs in dispatch order.
	pub headers: Vec<(String, String)>,
	/// Encoded request body, if any.
	pub body: Option<Vec<u8>>,
}

/// Materialized response returned by the transport.
///
/// The body is read to completion inside the transport so callers own plain
/// bytes with no borrow back into the HTTP stack.
#[derive(Clone, Debug)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: u16,
	/// Canonical reason phrase, when the status defines one.
	pub reason: Option<String>,
	/// Response header name/value pairs.
	pub headers: Vec<(String, String)>,
	/// Complete response body.
	pub body: Vec<u8>,
}
impl TransportResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Abstraction over HTTP transports capable of executing the crate's requests.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared via
/// `Arc` across in-flight requests, and the returned future must be `Send`
/// so callers can box it onto any executor.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Dispatches the request and materializes the response.
	fn execute(&self, request: TransportRequest) -> TransportFuture<'_, TransportResponse>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a transport from a fresh client, surfacing builder failures as
	/// configuration errors.
	pub fn new() -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder()
			.build()
			.map_err(crate::error::ConfigError::http_client_build)?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: TransportRequest) -> TransportFuture<'_, TransportResponse> {
		let client = self.0.clone();

		Box::pin(async move {
			let TransportRequest { method, url, headers, body } = request;
			let mut builder = client.request(method.as_reqwest(), url);

			for (name, value) in &headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status();
			let headers = response
				.headers()
				.iter()
				.map(|(name, value)| {
					(name.as_str().to_owned(), String::from_utf8_lossy(value.as_bytes()).into_owned())
				})
				.collect();
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(TransportResponse {
				status: status.as_u16(),
				reason: status.canonical_reason().map(str::to_owned),
				headers,
				body,
			})
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn bodyless_methods_are_classified() {
		assert!(!Method::Get.allows_body());
		assert!(!Method::Head.allows_body());
		assert!(!Method::Delete.allows_body());
		assert!(Method::Post.allows_body());
		assert!(Method::Put.allows_body());
		assert!(Method::Patch.allows_body());
	}

	#[test]
	fn success_covers_the_2xx_range() {
		let mut response =
			TransportResponse { status: 200, reason: None, headers: Vec::new(), body: Vec::new() };

		assert!(response.is_success());

		response.status = 299;

		assert!(response.is_success());

		response.status = 301;

		assert!(!response.is_success());
	}
}
