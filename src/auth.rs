//! Token material and client identity primitives.

pub mod key;
pub mod scope;
pub mod secret;
pub mod token;

pub use key::ClientKey;
pub use scope::{ScopeList, ScopeValidationError};
pub use secret::AccessToken;
pub use token::{CachedToken, SAFETY_MARGIN};
