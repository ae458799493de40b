//! Crate-level error types shared across the token service, cache, and client.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Token acquisition failures are deliberately absent here: a provider that
/// rejects the credentials is reported as data inside the result envelope
/// (`is_error` + status + detail), never as an `Err`, so callers can branch
/// without unwinding.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem raised at setup time.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Request precondition failure raised before any network call.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Transport failure (DNS, TCP, TLS, I/O).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be converted into the requested type.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Token cache backend failure.
	#[error("{0}")]
	Cache(#[from] crate::cache::CacheError),
}

/// Configuration and validation failures raised before any request is made.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Credential options are missing a required field.
	#[error("Credential options are missing the required `{field}` field.")]
	MissingCredentialField {
		/// Name of the absent field.
		field: &'static str,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Request precondition failures surfaced before dispatch.
#[derive(Debug, ThisError)]
pub enum ValidationError {
	/// A body was supplied for a method with no request-body semantics.
	#[error("{method} requests cannot carry a body.")]
	BodyNotAllowed {
		/// Offending HTTP method label.
		method: &'static str,
	},
	/// The request body failed to serialize as JSON.
	#[error("Request body could not be serialized as JSON.")]
	BodyEncode(#[from] serde_json::Error),
	/// A header name or value contains characters the wire format forbids.
	#[error("Header `{name}` contains an invalid name or value.")]
	Header {
		/// Offending header name.
		name: String,
	},
}

/// Transport-level failures (network, I/O); always propagated, never enveloped.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred during the HTTP exchange.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying I/O failure surfaced during transport.
	#[error("I/O error occurred during the HTTP exchange.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Failures converting an otherwise successful response into the requested type.
///
/// Surfaced distinctly from HTTP-level failures, which are reported inside the
/// envelope with `is_error` set and no decode attempted.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// The body is not valid UTF-8 but a textual target was requested.
	#[error("Response body for {target} is not valid UTF-8 text.")]
	NonUtf8Text {
		/// Label of the requested target type.
		target: &'static str,
		/// Underlying UTF-8 validation failure.
		#[source]
		source: std::str::Utf8Error,
	},
	/// The textual body could not be converted into the requested scalar.
	#[error("Response body cannot be parsed as {target}: {detail}.")]
	Scalar {
		/// Label of the requested scalar type.
		target: &'static str,
		/// Conversion failure detail.
		detail: String,
	},
	/// The JSON body does not match the requested type.
	#[error("Response JSON does not match the requested type {target}.")]
	Json {
		/// Label of the requested target type.
		target: &'static str,
		/// Structured parsing failure carrying the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The token endpoint reported a token lifetime outside the usable range,
	/// either non-positive or too large to compute an expiry instant.
	#[error("Token endpoint reported an unusable lifetime of {seconds} seconds.")]
	InvalidLifetime {
		/// Reported `expires_in` value.
		seconds: i64,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn cache_error_converts_with_source() {
		let cache_error = crate::cache::CacheError::Backend { message: "map poisoned".into() };
		let error: Error = cache_error.clone().into();

		assert!(matches!(error, Error::Cache(_)));
		assert!(error.to_string().contains("map poisoned"));

		let source = std::error::Error::source(&error)
			.expect("Crate error should expose the original cache error as its source.");

		assert_eq!(source.to_string(), cache_error.to_string());
	}

	#[test]
	fn validation_messages_name_the_method() {
		let err = ValidationError::BodyNotAllowed { method: "GET" };

		assert_eq!(err.to_string(), "GET requests cannot carry a body.");
	}
}
