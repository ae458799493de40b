//! Typed result envelopes and response decoding.

// std
use std::any::type_name;
// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, error::DecodeError, http::TransportResponse};

/// Typed result of one request.
///
/// Produced once per call and owned by the caller. HTTP-level failures set
/// [`is_error`](Self::is_error) and skip typed decoding; provider token
/// denials do the same without any downstream dispatch. A decode failure on
/// a successful response is an `Err`, never a silently absent body.
#[derive(Clone, Debug)]
pub struct Envelope<T> {
	/// HTTP status code, or the token endpoint's status on a denial.
	pub status: u16,
	/// Canonical reason phrase, when the status defines one.
	pub reason: Option<String>,
	/// Response header name/value pairs.
	pub headers: Vec<(String, String)>,
	/// Raw response body bytes.
	pub raw: Vec<u8>,
	/// Body captured as text, when UTF-8 and the target wants text capture.
	pub text: Option<String>,
	/// Decoded body; absent on any error path.
	pub body: Option<T>,
	/// Set on non-success statuses and token denials.
	pub is_error: bool,
	/// Reason phrase or provider error text accompanying `is_error`.
	pub error_detail: Option<String>,
}
impl<T> Envelope<T> {
	/// Returns `true` when the request completed without an error status.
	pub fn is_success(&self) -> bool {
		!self.is_error
	}

	/// Consumes the envelope and returns the decoded body, if present.
	pub fn into_body(self) -> Option<T> {
		self.body
	}

	pub(crate) fn denied(status: u16, code: Option<String>, description: Option<String>) -> Self {
		let error_detail = match (code, description) {
			(Some(code), Some(description)) => Some(format!("{code}: {description}")),
			(Some(code), None) => Some(code),
			(None, Some(description)) => Some(description),
			(None, None) => Some(format!("token request rejected (HTTP {status})")),
		};

		Self {
			status,
			reason: None,
			headers: Vec::new(),
			raw: Vec::new(),
			text: None,
			body: None,
			is_error: true,
			error_detail,
		}
	}

	pub(crate) fn http_failure(response: TransportResponse) -> Self {
		let TransportResponse { status, reason, headers, body: raw } = response;
		let error_detail =
			Some(reason.clone().unwrap_or_else(|| format!("HTTP {status}")));
		let text = std::str::from_utf8(&raw).ok().map(str::to_owned);

		Self {
			status,
			reason,
			headers,
			raw,
			text,
			body: None,
			is_error: true,
			error_detail,
		}
	}
}
impl<T> Envelope<T>
where
	T: Decode,
{
	pub(crate) fn decoded(response: TransportResponse) -> Result<Self, DecodeError> {
		let TransportResponse { status, reason, headers, body: raw } = response;
		let text =
			if T::CAPTURE_TEXT { std::str::from_utf8(&raw).ok().map(str::to_owned) } else { None };
		let body = T::decode(&raw, text.as_deref())?;

		Ok(Self {
			status,
			reason,
			headers,
			raw,
			text,
			body: Some(body),
			is_error: false,
			error_detail: None,
		})
	}
}

/// Conversion from a successful response body into a requested target type.
///
/// The implementations form a small closed set of content kinds: `()`
/// ignores the body, `String` and the primitive scalars convert the textual
/// body directly, `Vec<u8>` takes the raw bytes (and skips text capture for
/// efficiency), and [`Json`] decodes through `serde`.
pub trait Decode
where
	Self: Sized,
{
	/// Whether the client should capture the body as text alongside bytes.
	const CAPTURE_TEXT: bool = true;

	/// Label used in decode error messages.
	fn target() -> &'static str;

	/// Converts the captured body into the target type.
	fn decode(raw: &[u8], text: Option<&str>) -> Result<Self, DecodeError>;
}
impl Decode for () {
	fn target() -> &'static str {
		"()"
	}

	fn decode(_raw: &[u8], _text: Option<&str>) -> Result<Self, DecodeError> {
		Ok(())
	}
}
impl Decode for String {
	fn target() -> &'static str {
		"String"
	}

	fn decode(raw: &[u8], text: Option<&str>) -> Result<Self, DecodeError> {
		text_or_utf8(raw, text, Self::target()).map(str::to_owned)
	}
}
impl Decode for Vec<u8> {
	const CAPTURE_TEXT: bool = false;

	fn target() -> &'static str {
		"Vec<u8>"
	}

	fn decode(raw: &[u8], _text: Option<&str>) -> Result<Self, DecodeError> {
		Ok(raw.to_vec())
	}
}

macro_rules! impl_scalar_decode {
	($($ty:ty),* $(,)?) => {$(
		impl Decode for $ty {
			fn target() -> &'static str {
				stringify!($ty)
			}

			fn decode(raw: &[u8], text: Option<&str>) -> Result<Self, DecodeError> {
				let text = text_or_utf8(raw, text, Self::target())?;

				text.trim().parse::<$ty>().map_err(|e| DecodeError::Scalar {
					target: Self::target(),
					detail: e.to_string(),
				})
			}
		}
	)*};
}

impl_scalar_decode!(bool, i8, i16, i32, i64, i128, u8, u16, u32, u64, u128, f32, f64);

/// Marker directing the decode of a response body through JSON.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Json<T>(pub T);
impl<T> Json<T> {
	/// Consumes the marker and returns the decoded value.
	pub fn into_inner(self) -> T {
		self.0
	}
}
impl<T> Decode for Json<T>
where
	T: DeserializeOwned,
{
	fn target() -> &'static str {
		type_name::<T>()
	}

	fn decode(raw: &[u8], _text: Option<&str>) -> Result<Self, DecodeError> {
		decode_json(raw, Self::target()).map(Json)
	}
}

/// Decodes JSON with path-aware error reporting.
pub(crate) fn decode_json<T>(raw: &[u8], target: &'static str) -> Result<T, DecodeError>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(raw);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| DecodeError::Json { target, source })
}

fn text_or_utf8<'a>(
	raw: &'a [u8],
	text: Option<&'a str>,
	target: &'static str,
) -> Result<&'a str, DecodeError> {
	match text {
		Some(text) => Ok(text),
		None => std::str::from_utf8(raw).map_err(|source| DecodeError::NonUtf8Text { target, source }),
	}
}
