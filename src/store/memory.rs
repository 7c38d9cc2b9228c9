//! Thread-safe in-memory [`TokenStore`] implementation.

// self
use crate::{_prelude::*, store::TokenStore, token::CsrfToken};

type TokenSlot = Arc<RwLock<Option<CsrfToken>>>;

/// In-process token cache holding zero or one token.
///
/// Empty at construction; populated whenever a token is fetched or observed in a
/// response; cleared when a request is rejected for stale authorization. Clones share
/// the same slot, so a client and its test harness observe identical state.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore(TokenSlot);
impl TokenStore for MemoryTokenStore {
	fn get(&self) -> Option<CsrfToken> {
		self.0.read().clone()
	}

	fn set(&self, token: CsrfToken) {
		*self.0.write() = Some(token);
	}

	fn clear(&self) {
		*self.0.write() = None;
	}
}
