//! Request body content kinds.

// self
use crate::{_prelude::*, error::ValidationError};

/// Request body variants, resolved once when the spec is assembled.
///
/// A pre-built wrapper ([`Raw`](Self::Raw)) passes through unchanged;
/// scalars travel as their textual representation; everything else is
/// serialized as UTF-8 JSON up front so serialization failures surface
/// before any network activity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RequestBody {
	/// No body.
	#[default]
	Empty,
	/// Textual representation of a scalar value, sent as `text/plain`.
	Scalar(String),
	/// Pre-encoded bytes with an explicit content type, passed through unchanged.
	Raw {
		/// Encoded payload.
		bytes: Vec<u8>,
		/// Content type reported alongside the payload.
		content_type: String,
	},
	/// UTF-8 JSON payload, sent as `application/json`.
	Json(Vec<u8>),
}
impl RequestBody {
	/// Encodes a scalar value as its textual representation.
	pub fn scalar(value: impl ToString) -> Self {
		Self::Scalar(value.to_string())
	}

	/// Wraps pre-encoded bytes with an explicit content type.
	pub fn raw(bytes: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
		Self::Raw { bytes: bytes.into(), content_type: content_type.into() }
	}

	/// Serializes a value as UTF-8 JSON.
	pub fn json<T>(value: &T) -> Result<Self, ValidationError>
	where
		T: Serialize + ?Sized,
	{
		Ok(Self::Json(serde_json::to_vec(value)?))
	}

	/// Returns `true` when no body is present.
	pub fn is_empty(&self) -> bool {
		matches!(self, Self::Empty)
	}

	/// Content type to report for this body, if any.
	pub fn content_type(&self) -> Option<&str> {
		match self {
			Self::Empty => None,
			Self::Scalar(_) => Some("text/plain; charset=utf-8"),
			Self::Raw { content_type, .. } => Some(content_type),
			Self::Json(_) => Some("application/json"),
		}
	}

	pub(crate) fn into_bytes(self) -> Option<Vec<u8>> {
		match self {
			Self::Empty => None,
			Self::Scalar(text) => Some(text.into_bytes()),
			Self::Raw { bytes, .. } => Some(bytes),
			Self::Json(bytes) => Some(bytes),
		}
	}
}
