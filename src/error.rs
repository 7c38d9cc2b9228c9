//! Guard-level error types shared across the client, transport, and fetch paths.

// self
use crate::{_prelude::*, http::TransportResponse};

/// Guard-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical guard error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// No carrier yielded a token after a fetch attempt; the request never left the process.
	#[error("No carrier yielded a CSRF token after fetching from the CSRF endpoint.")]
	TokenAcquisition,
	/// The server answered with an error status; the full response is preserved for the caller.
	#[error("Server rejected the request with status {}.", .response.status)]
	Rejected {
		/// Final response as received from the transport, headers and body included.
		response: Box<TransportResponse>,
	},
}
impl Error {
	/// Returns the HTTP status when the error wraps a rejected response.
	pub fn status(&self) -> Option<StatusCode> {
		match self {
			Self::Rejected { response } => Some(response.status),
			_ => None,
		}
	}

	/// Consumes the error and returns the rejected response, if one was captured.
	pub fn into_rejected(self) -> Option<TransportResponse> {
		match self {
			Self::Rejected { response } => Some(*response),
			_ => None,
		}
	}
}

/// Configuration and request-construction failures raised by the guard.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Request path cannot be resolved against the configured base URL.
	#[error("Path `{path}` cannot be resolved against the base URL.")]
	InvalidPath {
		/// Path that failed to resolve.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Token value contains bytes that are not legal in an HTTP header.
	#[error("CSRF token cannot be encoded as a header value.")]
	InvalidTokenValue(#[from] http::header::InvalidHeaderValue),
	/// JSON request body could not be serialized.
	#[error("Request body cannot be serialized to JSON.")]
	BodySerialize(#[from] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while dispatching the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
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

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn rejected(status: StatusCode) -> Error {
		Error::Rejected {
			response: Box::new(TransportResponse {
				status,
				headers: HeaderMap::new(),
				body: Vec::new(),
			}),
		}
	}

	#[test]
	fn status_is_exposed_for_rejected_responses() {
		assert_eq!(rejected(StatusCode::FORBIDDEN).status(), Some(StatusCode::FORBIDDEN));
		assert_eq!(Error::TokenAcquisition.status(), None);
	}

	#[test]
	fn into_rejected_returns_the_captured_response() {
		let response = rejected(StatusCode::UNAUTHORIZED)
			.into_rejected()
			.expect("Rejected error should return its response.");

		assert_eq!(response.status, StatusCode::UNAUTHORIZED);
		assert!(Error::TokenAcquisition.into_rejected().is_none());
	}
}
