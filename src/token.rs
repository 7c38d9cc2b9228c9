//! CSRF token value types and carrier helpers.

// self
use crate::_prelude::*;

/// Redacted CSRF token wrapper keeping the opaque value out of logs.
///
/// The token is never interpreted by the guard; it is only compared for presence and
/// forwarded verbatim in the designated request header.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrfToken(String);
impl CsrfToken {
	/// Wraps a new token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for CsrfToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for CsrfToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("CsrfToken").field(&"<redacted>").finish()
	}
}
impl Display for CsrfToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Channels through which the server may communicate the current token value.
///
/// Extraction precedence during a fetch is strict: header, then body, then cookie.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenCarrier {
	/// Token delivered in the designated response header.
	Header,
	/// Token delivered in a JSON body field.
	Body,
	/// Token delivered as a cookie set by the server.
	Cookie,
}
impl TokenCarrier {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenCarrier::Header => "header",
			TokenCarrier::Body => "body",
			TokenCarrier::Cookie => "cookie",
		}
	}
}
impl Display for TokenCarrier {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Extracts the named cookie's value from a single `Set-Cookie` header line.
///
/// Attributes after the first `;` are ignored; an empty value counts as absent.
pub(crate) fn cookie_value(set_cookie: &str, name: &str) -> Option<String> {
	let pair = set_cookie.split(';').next()?;
	let (cookie_name, value) = pair.split_once('=')?;

	if cookie_name.trim() != name {
		return None;
	}

	let value = value.trim();

	if value.is_empty() { None } else { Some(value.to_owned()) }
}
