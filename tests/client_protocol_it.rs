// crates.io
use http::Method;
use httpmock::prelude::*;
// self
use csrf_guard::{
	_preludet::*,
	client::CsrfClient,
	config::GuardConfig,
	session::SessionNavigator,
	store::{MemoryTokenStore, TokenStore},
	token::CsrfToken,
};

fn build_config(server: &MockServer) -> GuardConfig {
	GuardConfig::new(Url::parse(&server.base_url()).expect("Mock server URL should parse."))
}

fn cached(store: &MemoryTokenStore) -> Option<String> {
	store.get().map(|token| token.expose().to_owned())
}

#[tokio::test]
async fn post_fetches_and_attaches_the_token() {
	let server = MockServer::start_async().await;
	let (client, store, _navigator) = build_reqwest_test_client(build_config(&server));
	let fetch = server
		.mock_async(|when, then| {
			when.method(GET).path("/csrf");
			then.status(200).header("x-xsrf-token", "abc123");
		})
		.await;
	let post = server
		.mock_async(|when, then| {
			when.method(POST).path("/sn/1").header("x-xsrf-token", "abc123");
			then.status(200);
		})
		.await;
	let response = client
		.post_json("/sn/1", &serde_json::json!({ "name": "site" }))
		.await
		.expect("POST with a freshly fetched token should succeed.");

	assert!(response.status.is_success());
	assert_eq!(cached(&store), Some("abc123".into()));

	fetch.assert_async().await;
	post.assert_async().await;
}

#[tokio::test]
async fn stale_rejection_is_retried_once_with_a_fresh_token() {
	let server = MockServer::start_async().await;
	let (client, store, _navigator) = build_reqwest_test_client(build_config(&server));

	store.set(CsrfToken::new("abc123"));

	let stale = server
		.mock_async(|when, then| {
			when.method(POST).path("/sn/1").header("x-xsrf-token", "abc123");
			then.status(403);
		})
		.await;
	let fetch = server
		.mock_async(|when, then| {
			when.method(GET).path("/csrf");
			then.status(200).header("x-xsrf-token", "def456");
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/sn/1").header("x-xsrf-token", "def456");
			then.status(200);
		})
		.await;
	let response = client
		.post_json("/sn/1", &serde_json::json!({ "name": "site" }))
		.await
		.expect("Retried POST with the rotated token should succeed.");

	assert!(response.status.is_success());
	assert_eq!(cached(&store), Some("def456".into()));

	stale.assert_async().await;
	fetch.assert_calls_async(1).await;
	fresh.assert_async().await;
}

#[tokio::test]
async fn second_rejection_propagates_without_a_third_attempt() {
	let server = MockServer::start_async().await;
	let (client, store, _navigator) = build_reqwest_test_client(build_config(&server));

	store.set(CsrfToken::new("abc123"));

	let post = server
		.mock_async(|when, then| {
			when.method(POST).path("/sn/1");
			then.status(403);
		})
		.await;
	let fetch = server
		.mock_async(|when, then| {
			when.method(GET).path("/csrf");
			then.status(200).header("x-xsrf-token", "def456");
		})
		.await;
	let err = client
		.post_json("/sn/1", &serde_json::json!({ "name": "site" }))
		.await
		.expect_err("A 403 on the retry should surface to the caller.");

	assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));

	post.assert_calls_async(2).await;
	fetch.assert_calls_async(1).await;
}

#[tokio::test]
async fn read_only_requests_never_trigger_a_fetch() {
	let server = MockServer::start_async().await;
	let (client, store, _navigator) = build_reqwest_test_client(build_config(&server));
	let list = server
		.mock_async(|when, then| {
			when.method(GET).path("/sn");
			then.status(200);
		})
		.await;
	let fetch = server
		.mock_async(|when, then| {
			when.method(GET).path("/csrf");
			then.status(200).header("x-xsrf-token", "abc123");
		})
		.await;

	client.get("/sn").await.expect("Read-only GET should succeed with an empty store.");

	assert!(store.get().is_none());

	list.assert_async().await;
	fetch.assert_calls_async(0).await;
}

#[tokio::test]
async fn rotated_token_from_any_response_is_reused_without_a_fetch() {
	let server = MockServer::start_async().await;
	let (client, store, _navigator) = build_reqwest_test_client(build_config(&server));
	let list = server
		.mock_async(|when, then| {
			when.method(GET).path("/sn");
			then.status(200).header("x-xsrf-token", "newtok");
		})
		.await;
	let fetch = server
		.mock_async(|when, then| {
			when.method(GET).path("/csrf");
			then.status(200).header("x-xsrf-token", "unexpected");
		})
		.await;
	let post = server
		.mock_async(|when, then| {
			when.method(POST).path("/sn/1").header("x-xsrf-token", "newtok");
			then.status(200);
		})
		.await;

	client.get("/sn").await.expect("GET carrying the rotated token should succeed.");

	assert_eq!(cached(&store), Some("newtok".into()));

	client
		.post_json("/sn/1", &serde_json::json!({ "name": "site" }))
		.await
		.expect("POST should reuse the captured token.");

	list.assert_async().await;
	fetch.assert_calls_async(0).await;
	post.assert_async().await;
}

#[tokio::test]
async fn session_expiry_redirects_to_login() {
	let server = MockServer::start_async().await;
	let (client, store, navigator) = build_reqwest_test_client(build_config(&server));

	store.set(CsrfToken::new("abc123"));

	let post = server
		.mock_async(|when, then| {
			when.method(POST).path("/sn/1");
			then.status(401);
		})
		.await;
	let err = client
		.post_json("/sn/1", &serde_json::json!({ "name": "site" }))
		.await
		.expect_err("The 401 should still fail the triggering request.");

	assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
	assert_eq!(navigator.redirects(), vec!["/login".to_owned()]);

	post.assert_async().await;
}

#[tokio::test]
async fn session_expiry_at_login_does_not_redirect() {
	let server = MockServer::start_async().await;
	let store_backend = Arc::new(MemoryTokenStore::default());
	let navigator = RecordingNavigator::at("/login");
	let client = CsrfClient::with_transport(
		build_config(&server),
		test_reqwest_transport(),
		store_backend.clone() as Arc<dyn TokenStore>,
		navigator.clone() as Arc<dyn SessionNavigator>,
	);

	store_backend.set(CsrfToken::new("abc123"));

	let post = server
		.mock_async(|when, then| {
			when.method(POST).path("/sn/1");
			then.status(401);
		})
		.await;
	let err = client
		.post_json("/sn/1", &serde_json::json!({ "name": "site" }))
		.await
		.expect_err("The 401 should fail the request even without a redirect.");

	assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
	assert!(navigator.redirects().is_empty());

	post.assert_async().await;
}

#[tokio::test]
async fn posting_to_the_csrf_endpoint_passes_through() {
	let server = MockServer::start_async().await;
	let (client, store, _navigator) = build_reqwest_test_client(build_config(&server));
	let direct = server
		.mock_async(|when, then| {
			when.method(POST).path("/csrf");
			then.status(200);
		})
		.await;
	let fetch = server
		.mock_async(|when, then| {
			when.method(GET).path("/csrf");
			then.status(200).header("x-xsrf-token", "abc123");
		})
		.await;
	let envelope = client
		.request(Method::POST, "/csrf")
		.expect("Envelope for the CSRF endpoint should build.");

	client.send(envelope).await.expect("POST to the CSRF endpoint should pass through.");

	assert!(store.get().is_none());

	direct.assert_async().await;
	fetch.assert_calls_async(0).await;
}

#[tokio::test]
async fn concurrent_posts_share_a_single_fetch() {
	let server = MockServer::start_async().await;
	let (client, store, _navigator) = build_reqwest_test_client(build_config(&server));
	let fetch = server
		.mock_async(|when, then| {
			when.method(GET).path("/csrf");
			then.status(200).header("x-xsrf-token", "abc123");
		})
		.await;
	let post = server
		.mock_async(|when, then| {
			when.method(POST).path("/sn/1").header("x-xsrf-token", "abc123");
			then.status(200);
		})
		.await;
	let body_a = serde_json::json!({ "name": "a" });
	let body_b = serde_json::json!({ "name": "b" });
	let (first, second) =
		tokio::join!(client.post_json("/sn/1", &body_a), client.post_json("/sn/1", &body_b),);

	first.expect("First concurrent POST should succeed.");
	second.expect("Second concurrent POST should succeed.");

	assert_eq!(cached(&store), Some("abc123".into()));

	fetch.assert_calls_async(1).await;
	post.assert_calls_async(2).await;
}

#[tokio::test]
async fn fetch_prefers_the_header_carrier() {
	let server = MockServer::start_async().await;
	let (client, store, _navigator) = build_reqwest_test_client(build_config(&server));
	let fetch = server
		.mock_async(|when, then| {
			when.method(GET).path("/csrf");
			then.status(200)
				.header("x-xsrf-token", "from-header")
				.header("set-cookie", "XSRF-TOKEN=from-cookie; Path=/")
				.header("content-type", "application/json")
				.body("{\"token\":\"from-body\"}");
		})
		.await;
	let post = server
		.mock_async(|when, then| {
			when.method(POST).path("/sn/1").header("x-xsrf-token", "from-header");
			then.status(200);
		})
		.await;

	client
		.post_json("/sn/1", &serde_json::json!({ "name": "site" }))
		.await
		.expect("POST should carry the header-carrier token.");

	assert_eq!(cached(&store), Some("from-header".into()));

	fetch.assert_async().await;
	post.assert_async().await;
}
