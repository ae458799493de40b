//! Typed HTTP client wrapper that transparently attaches cached OAuth 2.0
//! client-credentials bearer tokens to outgoing requests.
//!
//! Assemble a [`client::RequestSpec`] fluently, hand it to
//! [`client::ApiClient::send`], and receive a typed [`client::Envelope`].
//! When credentials are attached, a bearer token is served from the
//! process-wide cache or fetched from the token endpoint exactly once per
//! client identity, with a safety margin keeping tokens from expiring
//! mid-flight.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod client;
pub mod error;
pub mod http;
pub mod obs;
pub mod token;

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::Result;
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use httpmock as _;
