//! CSRF-protected HTTP client—transparent token attachment for state-changing requests,
//! carrier-precedence acquisition, and one-shot stale-token recovery, with the token
//! cache, transport, and session hooks injected instead of living in global state.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod session;
pub mod store;
pub mod token;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests against a mock server; enabled
	//! via `cfg(test)` or the `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		client::CsrfClient,
		config::GuardConfig,
		http::ReqwestTransport,
		session::SessionNavigator,
		store::{MemoryTokenStore, TokenStore},
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = CsrfClient<ReqwestTransport>;

	/// Navigator that records redirects instead of performing them.
	#[derive(Debug, Default)]
	pub struct RecordingNavigator {
		current: RwLock<String>,
		redirects: Mutex<Vec<String>>,
	}
	impl RecordingNavigator {
		/// Creates a navigator reporting the provided path as the current location.
		pub fn at(path: impl Into<String>) -> Arc<Self> {
			Arc::new(Self { current: RwLock::new(path.into()), redirects: Default::default() })
		}

		/// Returns every login path this navigator was asked to redirect to.
		pub fn redirects(&self) -> Vec<String> {
			self.redirects.lock().clone()
		}
	}
	impl SessionNavigator for RecordingNavigator {
		fn current_path(&self) -> String {
			self.current.read().clone()
		}

		fn redirect(&self, login_path: &str) {
			self.redirects.lock().push(login_path.to_owned());
			*self.current.write() = login_path.to_owned();
		}
	}

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock` during tests, with the cookie store enabled.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.cookie_store(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Constructs a [`CsrfClient`] backed by an in-memory store, a recording navigator
	/// positioned away from the login route, and the reqwest transport used across
	/// integration tests.
	pub fn build_reqwest_test_client(
		config: GuardConfig,
	) -> (ReqwestTestClient, Arc<MemoryTokenStore>, Arc<RecordingNavigator>) {
		let store_backend = Arc::new(MemoryTokenStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let navigator = RecordingNavigator::at("/admin/dashboard");
		let client = CsrfClient::with_transport(
			config,
			test_reqwest_transport(),
			store,
			navigator.clone() as Arc<dyn SessionNavigator>,
		);

		(client, store_backend, navigator)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
