//! Token acquisition with carrier precedence and a shared in-flight fetch.
//!
//! [`CsrfClient::ensure_token`] guarantees a token is cached before a state-changing
//! request leaves the process. Cache hits return immediately; otherwise a credentialed
//! GET to the CSRF endpoint runs under a singleflight guard so concurrent requests
//! racing in with an empty store share one fetch instead of issuing one each. The
//! store is re-checked after the guard is acquired, so losers of the race reuse the
//! winner's token.

// self
use crate::{
	_prelude::*,
	client::CsrfClient,
	config::GuardConfig,
	error::TransportError,
	http::{HttpTransport, TransportRequest, TransportResponse},
	obs::{self, GuardStage, StageOutcome, StageSpan},
	token::{self, CsrfToken, TokenCarrier},
};

impl<T> CsrfClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Guarantees a token is cached, fetching one from the CSRF endpoint if absent.
	///
	/// Extraction follows the strict carrier precedence: response header, then JSON
	/// body field, then cookie set as a side effect of the GET. The first non-empty
	/// value is cached and returned; if none of the three carriers yields a value the
	/// operation fails with [`Error::TokenAcquisition`].
	pub async fn ensure_token(&self) -> Result<CsrfToken> {
		if let Some(token) = self.store.get() {
			return Ok(token);
		}

		const STAGE: GuardStage = GuardStage::Fetch;

		let span = StageSpan::new(STAGE, "ensure_token");

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);

		let result = span.instrument(self.fetch_token()).await;

		match &result {
			Ok(_) => obs::record_stage_outcome(STAGE, StageOutcome::Success),
			Err(_) => obs::record_stage_outcome(STAGE, StageOutcome::Failure),
		}

		result
	}

	async fn fetch_token(&self) -> Result<CsrfToken> {
		let _singleflight = self.fetch_guard.lock().await;

		// Another request may have completed the fetch while this one waited.
		if let Some(token) = self.store.get() {
			return Ok(token);
		}

		let request = TransportRequest {
			method: Method::GET,
			url: self.config.csrf_url()?,
			headers: HeaderMap::new(),
			body: None,
		};
		let response = self
			.transport
			.execute(request)
			.await
			.map_err(|e| Error::from(TransportError::network(e)))?;
		let (token, _) = extract_token(&self.config, &response).ok_or(Error::TokenAcquisition)?;

		self.store.set(token.clone());

		Ok(token)
	}
}

/// Extracts a token from a fetch response, returning the carrier that yielded it.
pub(crate) fn extract_token(
	config: &GuardConfig,
	response: &TransportResponse,
) -> Option<(CsrfToken, TokenCarrier)> {
	if let Some(token) = header_token(config, response) {
		return Some((token, TokenCarrier::Header));
	}
	if let Some(token) = body_token(config, response) {
		return Some((token, TokenCarrier::Body));
	}

	cookie_token(config, response).map(|token| (token, TokenCarrier::Cookie))
}

fn header_token(config: &GuardConfig, response: &TransportResponse) -> Option<CsrfToken> {
	let value = response.header_str(&config.token_header)?.trim();

	if value.is_empty() { None } else { Some(CsrfToken::new(value)) }
}

/// Malformed JSON is not an error here; the carrier merely yields nothing and
/// precedence falls through to the cookie.
fn body_token(config: &GuardConfig, response: &TransportResponse) -> Option<CsrfToken> {
	if response.body.is_empty() {
		return None;
	}

	let mut deserializer = serde_json::Deserializer::from_slice(&response.body);
	let payload: serde_json::Value = serde_path_to_error::deserialize(&mut deserializer).ok()?;
	let value = payload.get(config.token_field.as_str())?.as_str()?.trim();

	if value.is_empty() { None } else { Some(CsrfToken::new(value)) }
}

fn cookie_token(config: &GuardConfig, response: &TransportResponse) -> Option<CsrfToken> {
	response
		.headers
		.get_all(http::header::SET_COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.find_map(|raw| token::cookie_value(raw, &config.token_cookie))
		.map(CsrfToken::new)
}
