//! Request/response interception around a pluggable transport.
//!
//! [`CsrfClient`] is the crate's orchestrator: before dispatch it guarantees that
//! state-changing requests carry the CSRF header (fetching a token when none is
//! cached), and after dispatch it keeps the cache fresh and recovers from exactly one
//! class of failure — a 403 on a state-changing request — with a single resubmission.
//! Everything else is surfaced to the caller unchanged.

mod fetch;

// self
use crate::{
	_prelude::*,
	config::GuardConfig,
	error::ConfigError,
	http::{HttpTransport, TransportRequest, TransportResponse},
	obs::{self, GuardStage, StageOutcome, StageSpan},
	session::{self, SessionNavigator},
	store::TokenStore,
	token::CsrfToken,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestTransport, session::NoopNavigator, store::MemoryTokenStore};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport stack.
pub type ReqwestCsrfClient = CsrfClient<ReqwestTransport>;

/// One logical request threaded through the interceptor chain.
///
/// The envelope owns everything the transport needs plus the retry marker for the
/// stale-authorization recovery. The marker is scoped to this envelope, never shared
/// across requests, and once set it is never cleared for the life of the request.
#[derive(Clone, Debug)]
pub struct RequestEnvelope {
	/// HTTP method.
	pub method: Method,
	/// Absolute target URL, already resolved against the client's base URL.
	pub url: Url,
	/// Ordered header map attached to the outgoing request.
	pub headers: HeaderMap,
	/// Optional request body bytes.
	pub body: Option<Vec<u8>>,
	authorization_retried: bool,
}
impl RequestEnvelope {
	/// Creates an envelope for the provided method and absolute URL.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), body: None, authorization_retried: false }
	}

	/// Adds or replaces a header on the outgoing request.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Serializes the payload as the JSON request body and sets the content type.
	pub fn with_json<P>(mut self, payload: &P) -> Result<Self, ConfigError>
	where
		P: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(payload)?);
		self.headers
			.insert(http::header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

		Ok(self)
	}

	/// Returns `true` for methods whose semantics change server-side state.
	pub fn is_state_changing(&self) -> bool {
		matches!(self.method.as_str(), "POST" | "PUT" | "PATCH" | "DELETE")
	}

	/// Returns whether this request has already been resubmitted for stale authorization.
	pub fn authorization_retried(&self) -> bool {
		self.authorization_retried
	}

	fn mark_authorization_retried(&mut self) {
		self.authorization_retried = true;
	}

	fn to_transport(&self) -> TransportRequest {
		TransportRequest {
			method: self.method.clone(),
			url: self.url.clone(),
			headers: self.headers.clone(),
			body: self.body.clone(),
		}
	}
}

/// CSRF-protected HTTP client coordinating the token store, transport, and navigator.
///
/// The client owns its collaborators behind `Arc` so clones stay cheap and share one
/// token cache and one in-flight-fetch guard. Interceptors for a given request run
/// strictly in sequence; distinct requests interleave freely.
pub struct CsrfClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound request, the token fetch included.
	pub transport: Arc<T>,
	/// Token store implementation holding the cached token.
	pub store: Arc<dyn TokenStore>,
	/// Host hook performing the session-expiry redirect.
	pub navigator: Arc<dyn SessionNavigator>,
	/// Endpoint and carrier configuration.
	pub config: GuardConfig,
	fetch_guard: Arc<AsyncMutex<()>>,
}
impl<T> CsrfClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that reuses the caller-provided transport and collaborators.
	pub fn with_transport(
		config: GuardConfig,
		transport: impl Into<Arc<T>>,
		store: Arc<dyn TokenStore>,
		navigator: Arc<dyn SessionNavigator>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			navigator,
			config,
			fetch_guard: Default::default(),
		}
	}

	/// Builds an envelope for the provided method and request path.
	pub fn request(&self, method: Method, path: &str) -> Result<RequestEnvelope> {
		Ok(RequestEnvelope::new(method, self.config.resolve(path)?))
	}

	/// Issues a read-only GET; no token is attached and no fetch is triggered.
	pub async fn get(&self, path: &str) -> Result<TransportResponse> {
		self.send(self.request(Method::GET, path)?).await
	}

	/// Issues a DELETE with the CSRF header attached.
	pub async fn delete(&self, path: &str) -> Result<TransportResponse> {
		self.send(self.request(Method::DELETE, path)?).await
	}

	/// Issues a POST carrying the payload as JSON, with the CSRF header attached.
	pub async fn post_json<P>(&self, path: &str, payload: &P) -> Result<TransportResponse>
	where
		P: ?Sized + Serialize,
	{
		self.send(self.request(Method::POST, path)?.with_json(payload)?).await
	}

	/// Issues a PUT carrying the payload as JSON, with the CSRF header attached.
	pub async fn put_json<P>(&self, path: &str, payload: &P) -> Result<TransportResponse>
	where
		P: ?Sized + Serialize,
	{
		self.send(self.request(Method::PUT, path)?.with_json(payload)?).await
	}

	/// Issues a PATCH carrying the payload as JSON, with the CSRF header attached.
	pub async fn patch_json<P>(&self, path: &str, payload: &P) -> Result<TransportResponse>
	where
		P: ?Sized + Serialize,
	{
		self.send(self.request(Method::PATCH, path)?.with_json(payload)?).await
	}

	/// Runs the envelope through the full interceptor chain and dispatches it.
	///
	/// Success means a 2xx response. Every other status resolves to
	/// [`Error::Rejected`] carrying the final response, after the response
	/// interceptor had its chance to refresh the cache, resubmit once, or redirect.
	pub async fn send(&self, envelope: RequestEnvelope) -> Result<TransportResponse> {
		const STAGE: GuardStage = GuardStage::Dispatch;

		let span = StageSpan::new(STAGE, "send");

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);

		let result = span.instrument(self.send_inner(envelope)).await;

		match &result {
			Ok(_) => obs::record_stage_outcome(STAGE, StageOutcome::Success),
			Err(_) => obs::record_stage_outcome(STAGE, StageOutcome::Failure),
		}

		result
	}

	async fn send_inner(&self, mut envelope: RequestEnvelope) -> Result<TransportResponse> {
		self.prepare(&mut envelope).await?;

		let response = self.dispatch(&envelope).await?;

		self.capture_refreshed_token(&response);

		if response.status == StatusCode::FORBIDDEN
			&& envelope.is_state_changing()
			&& !envelope.authorization_retried()
		{
			obs::record_stage_outcome(GuardStage::Retry, StageOutcome::Attempt);

			let result = self.resubmit_with_fresh_token(envelope).await;

			match &result {
				Ok(_) => obs::record_stage_outcome(GuardStage::Retry, StageOutcome::Success),
				Err(_) => obs::record_stage_outcome(GuardStage::Retry, StageOutcome::Failure),
			}

			return result;
		}

		self.conclude(response)
	}

	/// Request interceptor: attach the token to requests that need it, without
	/// recursing into the token endpoint itself.
	async fn prepare(&self, envelope: &mut RequestEnvelope) -> Result<()> {
		if !envelope.is_state_changing() {
			return Ok(());
		}
		if self.config.is_csrf_endpoint(&envelope.url) {
			return Ok(());
		}

		self.ensure_token().await?;
		self.attach_token(envelope)
	}

	/// One-shot recovery for a stale-token rejection. The outcome, success or
	/// failure, is returned as-is; the retry marker guarantees no third attempt.
	async fn resubmit_with_fresh_token(
		&self,
		mut envelope: RequestEnvelope,
	) -> Result<TransportResponse> {
		self.store.clear();
		envelope.mark_authorization_retried();
		self.ensure_token().await?;
		self.attach_token(&mut envelope)?;

		let response = self.dispatch(&envelope).await?;

		self.capture_refreshed_token(&response);

		self.conclude(response)
	}

	fn attach_token(&self, envelope: &mut RequestEnvelope) -> Result<()> {
		let token = self.store.get().ok_or(Error::TokenAcquisition)?;
		let value =
			HeaderValue::from_str(token.expose()).map_err(ConfigError::InvalidTokenValue)?;

		envelope.headers.insert(self.config.token_header.clone(), value);

		Ok(())
	}

	async fn dispatch(&self, envelope: &RequestEnvelope) -> Result<TransportResponse> {
		self.transport
			.execute(envelope.to_transport())
			.await
			.map_err(|e| crate::error::TransportError::network(e).into())
	}

	/// Opportunistic refresh: the server may rotate the token per-request and attach
	/// the replacement to any response, error responses included. Values are trimmed
	/// before the emptiness check, matching the fetch-path extraction.
	fn capture_refreshed_token(&self, response: &TransportResponse) {
		let rotated = response.header_str(&self.config.token_header).map(str::trim);

		if let Some(value) = rotated
			&& !value.is_empty()
		{
			self.store.set(CsrfToken::new(value));
		}
	}

	fn conclude(&self, response: TransportResponse) -> Result<TransportResponse> {
		if response.status.is_success() {
			return Ok(response);
		}
		if response.status == StatusCode::UNAUTHORIZED {
			self.redirect_to_login();
		}

		Err(Error::Rejected { response: Box::new(response) })
	}

	/// Session expiry: navigate to the login route unless already under it. The
	/// navigation is a side effect; the triggering request still fails.
	fn redirect_to_login(&self) {
		let current = self.navigator.current_path();

		if session::under_login_prefix(&current, &self.config.login_path) {
			return;
		}

		const STAGE: GuardStage = GuardStage::Redirect;

		let _span = StageSpan::new(STAGE, "redirect_to_login").entered();

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);
		self.navigator.redirect(&self.config.login_path);
		obs::record_stage_outcome(STAGE, StageOutcome::Success);
	}
}
#[cfg(feature = "reqwest")]
impl CsrfClient<ReqwestTransport> {
	/// Creates a client with the default reqwest transport, an in-memory token store,
	/// and a no-op navigator.
	///
	/// The transport is built with its cookie store enabled so the session and the
	/// cookie carrier work out of the box. Use [`CsrfClient::with_transport`] to inject
	/// a custom store or a real navigator.
	pub fn new(config: GuardConfig) -> Result<Self> {
		Ok(Self::with_transport(
			config,
			ReqwestTransport::new()?,
			Arc::new(MemoryTokenStore::default()),
			Arc::new(NoopNavigator),
		))
	}
}
impl<T> Clone for CsrfClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: Arc::clone(&self.transport),
			store: Arc::clone(&self.store),
			navigator: Arc::clone(&self.navigator),
			config: self.config.clone(),
			fetch_guard: Arc::clone(&self.fetch_guard),
		}
	}
}
impl<T> Debug for CsrfClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CsrfClient")
			.field("config", &self.config)
			.field("token_cached", &self.store.get().is_some())
			.finish()
	}
}
