//! Fluent request specification assembled before a single dispatch.

// self
use crate::{
	_prelude::*,
	client::body::RequestBody,
	error::ValidationError,
	http::Method,
	token::CredentialOptions,
};

/// Complete description of one outbound request.
///
/// Assembled fluently, then handed to `ApiClient::send`; nothing is
/// dispatched until `send` runs, and no state is shared across calls.
#[derive(Clone, Debug)]
pub struct RequestSpec {
	pub(crate) method: Method,
	pub(crate) url: Url,
	pub(crate) headers: Vec<(String, String)>,
	pub(crate) body: RequestBody,
	pub(crate) credentials: Option<CredentialOptions>,
}
impl RequestSpec {
	/// Creates a spec for the provided method and URL.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: Vec::new(), body: RequestBody::Empty, credentials: None }
	}

	/// Shorthand for a `GET` spec.
	pub fn get(url: Url) -> Self {
		Self::new(Method::Get, url)
	}

	/// Shorthand for a `HEAD` spec.
	pub fn head(url: Url) -> Self {
		Self::new(Method::Head, url)
	}

	/// Shorthand for a `POST` spec.
	pub fn post(url: Url) -> Self {
		Self::new(Method::Post, url)
	}

	/// Shorthand for a `PUT` spec.
	pub fn put(url: Url) -> Self {
		Self::new(Method::Put, url)
	}

	/// Shorthand for a `PATCH` spec.
	pub fn patch(url: Url) -> Self {
		Self::new(Method::Patch, url)
	}

	/// Shorthand for a `DELETE` spec.
	pub fn delete(url: Url) -> Self {
		Self::new(Method::Delete, url)
	}

	/// Appends a header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Sets the request body.
	pub fn body(mut self, body: RequestBody) -> Self {
		self.body = body;

		self
	}

	/// Sets a scalar body encoded as its textual representation.
	pub fn scalar(self, value: impl ToString) -> Self {
		self.body(RequestBody::scalar(value))
	}

	/// Sets a JSON body, surfacing serialization failures immediately.
	pub fn json<T>(self, value: &T) -> Result<Self, ValidationError>
	where
		T: Serialize + ?Sized,
	{
		Ok(self.body(RequestBody::json(value)?))
	}

	/// Sets a pre-encoded body with an explicit content type.
	pub fn raw(self, bytes: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
		self.body(RequestBody::raw(bytes, content_type))
	}

	/// Attaches client credentials; a bearer token will be fetched (or served
	/// from cache) and attached before dispatch.
	pub fn credentials(mut self, options: CredentialOptions) -> Self {
		self.credentials = Some(options);

		self
	}

	/// Validates preconditions that must fail before any network call.
	pub(crate) fn validate(&self) -> Result<(), ValidationError> {
		if !self.body.is_empty() && !self.method.allows_body() {
			return Err(ValidationError::BodyNotAllowed { method: self.method.as_str() });
		}

		for (name, value) in &self.headers {
			if !header_name_valid(name) || !header_value_valid(value) {
				return Err(ValidationError::Header { name: name.clone() });
			}
		}

		Ok(())
	}
}

fn header_name_valid(name: &str) -> bool {
	!name.is_empty() && name.chars().all(|c| c.is_ascii_graphic() && c != ':')
}

fn header_value_valid(value: &str) -> bool {
	value.chars().all(|c| c == '\t' || (c != '\r' && c != '\n' && !c.is_ascii_control()))
}
