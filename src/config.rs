//! Guard configuration: base URL, carrier names, and well-known paths.

// self
use crate::{_prelude::*, error::ConfigError};

/// Endpoint and carrier configuration shared by every request a client issues.
///
/// Defaults match the widely used `XSRF-TOKEN` carrier conventions; each can be
/// overridden for servers that name things differently.
#[derive(Clone, Debug)]
pub struct GuardConfig {
	/// Base URL every request path is resolved against.
	pub base_url: Url,
	/// Absolute path of the token endpoint (default `/csrf`).
	pub csrf_path: String,
	/// Path prefix of the login route used for session-expiry redirects (default `/login`).
	pub login_path: String,
	/// Header carrying the token in both directions (default `x-xsrf-token`).
	pub token_header: HeaderName,
	/// Cookie name the server may set as a fetch side effect (default `XSRF-TOKEN`).
	pub token_cookie: String,
	/// JSON body field the token endpoint may respond with (default `token`).
	pub token_field: String,
}
impl GuardConfig {
	/// Default token endpoint path.
	pub const CSRF_PATH: &'static str = "/csrf";
	/// Default login route prefix.
	pub const LOGIN_PATH: &'static str = "/login";
	/// Default cookie carrier name.
	pub const TOKEN_COOKIE: &'static str = "XSRF-TOKEN";
	/// Default JSON body carrier field.
	pub const TOKEN_FIELD: &'static str = "token";
	/// Default header carrier name.
	pub const TOKEN_HEADER: HeaderName = HeaderName::from_static("x-xsrf-token");

	/// Creates a configuration with the default carrier names and paths.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			csrf_path: Self::CSRF_PATH.into(),
			login_path: Self::LOGIN_PATH.into(),
			token_header: Self::TOKEN_HEADER,
			token_cookie: Self::TOKEN_COOKIE.into(),
			token_field: Self::TOKEN_FIELD.into(),
		}
	}

	/// Overrides the token endpoint path.
	pub fn with_csrf_path(mut self, path: impl Into<String>) -> Self {
		self.csrf_path = path.into();

		self
	}

	/// Overrides the login route prefix.
	pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Overrides the header carrier name.
	pub fn with_token_header(mut self, name: HeaderName) -> Self {
		self.token_header = name;

		self
	}

	/// Overrides the cookie carrier name.
	pub fn with_token_cookie(mut self, name: impl Into<String>) -> Self {
		self.token_cookie = name.into();

		self
	}

	/// Overrides the JSON body carrier field.
	pub fn with_token_field(mut self, field: impl Into<String>) -> Self {
		self.token_field = field.into();

		self
	}

	/// Resolves a request path against the base URL.
	pub(crate) fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
		self.base_url
			.join(path)
			.map_err(|source| ConfigError::InvalidPath { path: path.into(), source })
	}

	/// Returns the absolute URL of the token endpoint.
	pub(crate) fn csrf_url(&self) -> Result<Url, ConfigError> {
		self.resolve(&self.csrf_path)
	}

	/// Checks whether a resolved URL targets the token endpoint itself.
	pub(crate) fn is_csrf_endpoint(&self, url: &Url) -> bool {
		url.origin() == self.base_url.origin() && url.path() == self.csrf_path
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn base() -> Url {
		Url::parse("https://search.example.test").expect("Base URL fixture should parse.")
	}

	#[test]
	fn defaults_match_the_conventional_carrier_names() {
		let config = GuardConfig::new(base());

		assert_eq!(config.csrf_path, "/csrf");
		assert_eq!(config.login_path, "/login");
		assert_eq!(config.token_header.as_str(), "x-xsrf-token");
		assert_eq!(config.token_cookie, "XSRF-TOKEN");
		assert_eq!(config.token_field, "token");
	}

	#[test]
	fn resolve_joins_paths_against_the_base() {
		let config = GuardConfig::new(base());
		let url = config.resolve("/sn/1").expect("Absolute path should resolve.");

		assert_eq!(url.as_str(), "https://search.example.test/sn/1");
	}

	#[test]
	fn csrf_endpoint_detection_requires_same_origin_and_path() {
		let config = GuardConfig::new(base());
		let endpoint = config.csrf_url().expect("CSRF endpoint should resolve.");
		let other_path = config.resolve("/sn").expect("Resource path should resolve.");
		let other_origin =
			Url::parse("https://evil.example.test/csrf").expect("Foreign URL fixture should parse.");

		assert!(config.is_csrf_endpoint(&endpoint));
		assert!(!config.is_csrf_endpoint(&other_path));
		assert!(!config.is_csrf_endpoint(&other_origin));
	}

	#[test]
	fn overrides_replace_the_defaults() {
		let config = GuardConfig::new(base())
			.with_csrf_path("/api/antiforgery")
			.with_login_path("/auth/login")
			.with_token_header(HeaderName::from_static("x-antiforgery"))
			.with_token_cookie("ANTIFORGERY")
			.with_token_field("value");

		assert_eq!(config.csrf_path, "/api/antiforgery");
		assert_eq!(config.login_path, "/auth/login");
		assert_eq!(config.token_header.as_str(), "x-antiforgery");
		assert_eq!(config.token_cookie, "ANTIFORGERY");
		assert_eq!(config.token_field, "value");
	}
}
