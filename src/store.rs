//! Storage contract and built-in store implementation for the cached CSRF token.

pub mod memory;

pub use memory::MemoryTokenStore;

// self
use crate::{_prelude::*, token::CsrfToken};

/// Single source of truth for the currently believed-valid token.
///
/// The store is a pure cache, not a verifier: no validation is performed on the values
/// it holds. Implementations are injected into the client as `Arc<dyn TokenStore>` so
/// multiple clients and tests run in isolation instead of sharing ambient global state.
/// All three operations are synchronous; an in-process cache never suspends.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns the cached token, if any.
	fn get(&self) -> Option<CsrfToken>;

	/// Replaces any cached value with the provided token.
	fn set(&self, token: CsrfToken);

	/// Removes the cached value (used after a rejected request).
	fn clear(&self);
}
