//! Transport primitives for intercepted HTTP requests.
//!
//! The module exposes [`HttpTransport`] alongside the [`TransportRequest`] and
//! [`TransportResponse`] envelope types so downstream crates can integrate custom HTTP
//! stacks. The trait is the guard's only dependency on an HTTP implementation: the
//! client hands it fully-resolved requests and receives final responses back, status
//! and headers intact, regardless of the status class. Status-based decisions (the
//! one-shot retry, the session redirect) belong to the interceptor layer, never to the
//! transport.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing intercepted requests.
///
/// Implementations must include credentials (cookies) on every request; the cookie
/// carrier and the server session depend on it. Error statuses are not transport
/// errors: `execute` resolves with the response for any status the server produced and
/// fails only when no response was obtained at all.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Dispatches the request and resolves with the final response.
	fn execute(
		&self,
		request: TransportRequest,
	) -> TransportFuture<'_, TransportResponse, Self::TransportError>;
}

/// Fully-resolved outgoing request handed to the transport.
#[derive(Clone, Debug)]
pub struct TransportRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute target URL.
	pub url: Url,
	/// Ordered header map, already normalized at the client boundary.
	pub headers: HeaderMap,
	/// Optional request body bytes.
	pub body: Option<Vec<u8>>,
}

/// Final response as observed by the interceptor layer.
#[derive(Clone, Debug)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: StatusCode,
	/// Response headers, `Set-Cookie` lines included.
	pub headers: HeaderMap,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl TransportResponse {
	/// Returns a header value as a string slice, if present and valid UTF-8.
	pub fn header_str(&self, name: &HeaderName) -> Option<&str> {
		self.headers.get(name).and_then(|value| value.to_str().ok())
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// [`ReqwestTransport::new`] enables the cookie store so the session cookie and the
/// cookie carrier survive across requests. Callers supplying their own client through
/// [`ReqwestTransport::with_client`] must enable the cookie store themselves.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a credentialed transport with the cookie store enabled.
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().cookie_store(true).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
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
	type TransportError = ReqwestError;

	fn execute(
		&self,
		request: TransportRequest,
	) -> TransportFuture<'_, TransportResponse, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let mut builder =
				client.request(request.method, request.url).headers(request.headers);

			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?.to_vec();

			Ok(TransportResponse { status, headers, body })
		})
	}
}
