#![cfg(all(feature = "reqwest", feature = "test"))]

// std
use std::collections::{HashMap, VecDeque};
// crates.io
use parking_lot::Mutex;
// self
use spapi_client::{
	_preludet::*,
	client::SpApiClient,
	client::ConnectionReport,
	error::{ConfigError, SigningError, TransportError},
	http::{Headers, HttpRequest, HttpResponse, HttpTransport, Method, TransportFuture},
};

const TOKEN_PATH: &str = "/auth/o2/token";
const STS_PATH: &str = "/sts";
const ORDERS_PATH: &str = "/orders/v0/orders";
const ROLE_BODY: &str = "{\"AssumeRoleResponse\":{\"AssumeRoleResult\":{\"Credentials\":{\
	\"AccessKeyId\":\"ASIATEMP\",\"SecretAccessKey\":\"temp-secret\",\
	\"SessionToken\":\"temp-session\",\"Expiration\":\"2099-01-01T00:00:00Z\"}}}}";

/// Answers each path from a queue; the last queued response repeats.
#[derive(Default)]
struct ScriptedTransport {
	routes: Mutex<HashMap<&'static str, VecDeque<HttpResponse>>>,
	requests: Mutex<Vec<HttpRequest>>,
}
impl ScriptedTransport {
	fn route(self, path: &'static str, responses: impl IntoIterator<Item = HttpResponse>) -> Self {
		self.routes.lock().insert(path, responses.into_iter().collect());

		self
	}

	fn with_credentials(self) -> Self {
		self.route(TOKEN_PATH, [HttpResponse::new(
			200,
			"{\"access_token\":\"T1\",\"expires_in\":3600}",
		)])
		.route(STS_PATH, [HttpResponse::new(200, ROLE_BODY)])
	}

	fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
		self.requests.lock().iter().filter(|request| request.url.path() == path).cloned().collect()
	}
}
impl HttpTransport for ScriptedTransport {
	fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let path = request.url.path().to_owned();

			self.requests.lock().push(request);

			let mut routes = self.routes.lock();
			let queue = routes.get_mut(path.as_str()).ok_or_else(|| {
				TransportError::Io(std::io::Error::new(
					std::io::ErrorKind::ConnectionRefused,
					format!("no route for {path}"),
				))
			})?;
			let response = if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() };

			response.ok_or_else(|| {
				TransportError::Io(std::io::Error::other(format!("empty script for {path}")))
			})
		})
	}
}

fn build_client(transport: &Arc<ScriptedTransport>) -> SpApiClient<ScriptedTransport> {
	let config = test_config_builder("http://127.0.0.1")
		.build()
		.expect("Scripted client config should build successfully.");

	SpApiClient::with_transport(config, transport.clone())
}

#[tokio::test]
async fn throttled_call_is_retried_once_then_succeeds() {
	let transport = Arc::new(ScriptedTransport::default().with_credentials().route(ORDERS_PATH, [
		HttpResponse::new(429, "{\"errors\":[{\"code\":\"QuotaExceeded\"}]}"),
		HttpResponse::new(200, "{\"payload\":{\"Orders\":[]}}"),
	]));
	let client = build_client(&transport);
	let payload = client.call_orders_today().await.expect("Retry should recover from one 429.");

	assert_eq!(payload, serde_json::json!({ "payload": { "Orders": [] } }));
	assert_eq!(client.metrics().api_calls(), 2);
	assert_eq!(client.metrics().throttled(), 1);
	assert_eq!(transport.requests_to(ORDERS_PATH).len(), 2);
	assert_eq!(transport.requests_to(TOKEN_PATH).len(), 1);
	assert_eq!(transport.requests_to(STS_PATH).len(), 1);
}

#[tokio::test]
async fn persistent_throttling_stops_after_one_retry() {
	let transport = Arc::new(
		ScriptedTransport::default()
			.with_credentials()
			.route(ORDERS_PATH, [HttpResponse::new(429, "slow down")]),
	);
	let client = build_client(&transport);
	let err = client.call_orders_week().await.expect_err("Persistent 429 should be terminal.");

	assert!(err.is_rate_limited());
	assert!(matches!(err, Error::Http { status: 429, ref body, .. } if body == "slow down"));
	assert_eq!(transport.requests_to(ORDERS_PATH).len(), 2);
	assert_eq!(client.metrics().throttled(), 2);
}

#[tokio::test]
async fn role_failure_prevents_signing_and_the_api_call() {
	let transport = Arc::new(
		ScriptedTransport::default()
			.route(TOKEN_PATH, [HttpResponse::new(
				200,
				"{\"access_token\":\"T1\",\"expires_in\":3600}",
			)])
			.route(STS_PATH, [HttpResponse::new(
				403,
				"{\"Error\":{\"Code\":\"AccessDenied\",\"Message\":\"denied\"}}",
			)])
			.route(ORDERS_PATH, [HttpResponse::new(200, "{}")]),
	);
	let client = build_client(&transport);
	let err = client.call_orders_today().await.expect_err("Role failure should stop the call.");

	assert!(matches!(err, Error::Signing(SigningError::CredentialsUnavailable { .. })));
	assert_eq!(err.status(), Some(403));
	assert!(transport.requests_to(ORDERS_PATH).is_empty());

	let url = Url::parse("http://127.0.0.1/orders/v0/orders").expect("Fixture URL should parse.");
	let err = client
		.sign(Method::Get, &url, Default::default(), b"")
		.await
		.expect_err("Direct signing should fail without credentials.");

	assert!(matches!(err, Error::Signing(SigningError::CredentialsUnavailable { .. })));
}

#[tokio::test]
async fn token_failure_skips_role_and_api_call() {
	let transport = Arc::new(
		ScriptedTransport::default()
			.route(TOKEN_PATH, [HttpResponse::new(400, "{\"error\":\"invalid_grant\"}")])
			.route(STS_PATH, [HttpResponse::new(200, ROLE_BODY)])
			.route(ORDERS_PATH, [HttpResponse::new(200, "{}")]),
	);
	let client = build_client(&transport);
	let err = client.call_inventory().await.expect_err("Token failure should stop the call.");

	assert!(matches!(err, Error::Authentication(_)));
	assert!(transport.requests_to(STS_PATH).is_empty());
	assert!(transport.requests_to(ORDERS_PATH).is_empty());
}

#[tokio::test]
async fn signed_requests_carry_token_and_session_headers() {
	let transport = Arc::new(
		ScriptedTransport::default()
			.with_credentials()
			.route(ORDERS_PATH, [HttpResponse::new(200, "{\"payload\":{\"Orders\":[]}}")]),
	);
	let client = build_client(&transport);

	client.call_orders_today().await.expect("Orders call should succeed.");

	let role = transport.requests_to(STS_PATH).remove(0);
	let role_authorization =
		role.header("authorization").expect("STS request should be signed.").to_owned();

	assert!(role_authorization.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"));
	assert!(role_authorization.contains("/us-east-1/sts/aws4_request,"));
	assert!(role.header("x-amz-security-token").is_none());

	let call = transport.requests_to(ORDERS_PATH).remove(0);
	let authorization = call.header("authorization").expect("API request should be signed.");
	let query = call.url.query().expect("Orders request should carry a query.");

	assert!(authorization.starts_with("AWS4-HMAC-SHA256 Credential=ASIATEMP/"));
	assert!(authorization.contains("/us-east-1/execute-api/aws4_request,"));
	assert!(authorization.contains(
		"SignedHeaders=host;user-agent;x-amz-access-token;x-amz-date;x-amz-security-token,"
	));
	assert_eq!(call.header("x-amz-access-token"), Some("T1"));
	assert_eq!(call.header("x-amz-security-token"), Some("temp-session"));
	assert_eq!(call.header("host"), Some("127.0.0.1"));
	assert_eq!(call.method, Method::Get);
	assert_eq!(call.timeout, Duration::seconds(15));
	assert!(query.starts_with("CreatedAfter="));
	assert!(query.ends_with("&MarketplaceIds=ATVPDKIKX0DER&OrderStatuses=Shipped%2CDelivered"));
}

#[tokio::test]
async fn transport_failure_is_returned_as_a_value() {
	let transport = Arc::new(ScriptedTransport::default().with_credentials());
	let client = build_client(&transport);
	let err = client.call_orders_today().await.expect_err("Missing route should fail.");

	assert!(matches!(err, Error::Transport(TransportError::Io(_))));
}

#[tokio::test]
async fn non_json_success_body_is_a_decode_error() {
	let transport = Arc::new(
		ScriptedTransport::default()
			.with_credentials()
			.route(ORDERS_PATH, [HttpResponse::new(200, "<html>maintenance</html>")]),
	);
	let client = build_client(&transport);
	let err = client.call_orders_today().await.expect_err("HTML body should not decode.");

	assert!(matches!(err, Error::Decode { .. }));
}

#[tokio::test]
async fn connection_probe_covers_the_last_day_without_status_filter() {
	let transport = Arc::new(ScriptedTransport::default().with_credentials().route(
		ORDERS_PATH,
		[HttpResponse::new(200, "{\"payload\":{\"Orders\":[{},{}]}}")],
	));
	let client = build_client(&transport);
	let report = client.test_connection().await;

	assert!(matches!(report, ConnectionReport::Success { sample_orders: 2, .. }));

	let call = transport.requests_to(ORDERS_PATH).remove(0);
	let created_after = call
		.url
		.query_pairs()
		.find(|(key, _)| key == "CreatedAfter")
		.map(|(_, value)| value.into_owned())
		.expect("Probe should bound the creation instant.");
	let created_after = OffsetDateTime::parse(
		&created_after,
		&time::format_description::well_known::Rfc3339,
	)
	.expect("CreatedAfter should be RFC 3339.");
	let age = OffsetDateTime::now_utc() - created_after;

	assert!(call.url.query_pairs().all(|(key, _)| key != "OrderStatuses"));
	assert!(age >= Duration::hours(24) && age < Duration::hours(24) + Duration::minutes(5));
}

#[tokio::test]
async fn endpoint_carrying_a_query_is_rejected_before_any_request() {
	let transport = Arc::new(ScriptedTransport::default().with_credentials());
	let client = build_client(&transport);
	let err = client
		.call("/orders/v0/orders?MarketplaceIds=X", [("CreatedAfter", "2025-01-01T00:00:00Z")])
		.await
		.expect_err("Endpoint with a query should be rejected.");

	assert!(matches!(err, Error::Config(ConfigError::EndpointWithQuery { .. })));
	assert!(transport.requests.lock().is_empty());
}

#[tokio::test]
async fn caller_headers_differing_in_case_are_signed_once() {
	let transport = Arc::new(ScriptedTransport::default().with_credentials());
	let client = build_client(&transport);
	let url = Url::parse("http://127.0.0.1/orders/v0/orders").expect("Fixture URL should parse.");
	let headers = Headers::from([
		("Host".to_owned(), "127.0.0.1".to_owned()),
		("host".to_owned(), "127.0.0.1".to_owned()),
		("User-Agent".to_owned(), "spapi-client/test".to_owned()),
	]);
	let signed =
		client.sign(Method::Get, &url, headers, b"").await.expect("Signing should succeed.");
	let authorization = signed.get("authorization").expect("Authorization should be set.");

	assert!(!signed.contains_key("Host"));
	assert!(!signed.contains_key("User-Agent"));
	assert_eq!(signed.get("user-agent").map(String::as_str), Some("spapi-client/test"));
	assert!(authorization.contains(
		"SignedHeaders=host;user-agent;x-amz-date;x-amz-security-token,"
	));
}
