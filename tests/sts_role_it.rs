#![cfg(all(feature = "reqwest", feature = "test"))]

// crates.io
use httpmock::prelude::*;
use time::macros;
// self
use spapi_client::{
	_preludet::*, auth::AwsCredentials, error::ExchangeError, http::ReqwestHttpClient,
	sts::RoleAssumer,
};

const ROLE_ARN: &str = "arn:aws:iam::123456789012:role/SellingPartnerApiRole";

fn build_assumer(server: &MockServer) -> RoleAssumer<ReqwestHttpClient> {
	let endpoint =
		Url::parse(&server.url("/sts")).expect("Mock STS endpoint should parse successfully.");

	RoleAssumer::new(
		Arc::new(test_reqwest_http_client()),
		endpoint,
		AwsCredentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY"),
		ROLE_ARN,
		"us-east-1",
	)
	.with_session_name("dashboard")
}

#[tokio::test]
async fn assumed_credentials_are_parsed_and_cached() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/sts")
				.header("accept", "application/json")
				.header_exists("authorization")
				.header_exists("x-amz-date")
				.body_includes("Action=AssumeRole")
				.body_includes("DurationSeconds=3600")
				.body_includes("RoleSessionName=dashboard")
				.body_includes("Version=2011-06-15");
			then.status(200).header("content-type", "application/json").body(
				"{\"AssumeRoleResponse\":{\"AssumeRoleResult\":{\"Credentials\":{\
				 \"AccessKeyId\":\"ASIATEMP\",\"SecretAccessKey\":\"temp-secret\",\
				 \"SessionToken\":\"temp-session\",\"Expiration\":\"2099-01-01T00:00:00Z\"}}}}",
			);
		})
		.await;
	let assumer = build_assumer(&server);
	let first = assumer.credentials().await.expect("Role assumption should succeed.");
	let second = assumer.credentials().await.expect("Cached credentials should be returned.");

	assert_eq!(first.credentials.access_key_id, "ASIATEMP");
	assert_eq!(first.credentials.secret_access_key.expose(), "temp-secret");
	assert_eq!(
		first.credentials.session_token.as_ref().map(|token| token.expose()),
		Some("temp-session")
	);
	assert_eq!(first.expires_at, macros::datetime!(2098-12-31 23:59 UTC));
	assert_eq!(first, second);
	assert_eq!(assumer.metrics().role_assumptions(), 1);

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn denied_role_is_reported_and_not_cached() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/sts");
			then.status(403).header("content-type", "application/json").body(
				"{\"Error\":{\"Code\":\"AccessDenied\",\"Message\":\"User is not authorized to \
				 perform: sts:AssumeRole\",\"Type\":\"Sender\"}}",
			);
		})
		.await;
	let assumer = build_assumer(&server);
	let err = assumer.credentials().await.expect_err("Denied role should surface an error.");

	match err {
		ExchangeError::Rejected { status, message, .. } => {
			assert_eq!(status, 403);
			assert!(message.starts_with("AccessDenied: "));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	assert!(assumer.cached().is_none());

	assumer.credentials().await.expect_err("Failures should not be cached.");

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn incomplete_credentials_are_rejected() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/sts");
			then.status(200).header("content-type", "application/json").body(
				"{\"AssumeRoleResponse\":{\"AssumeRoleResult\":{\"Credentials\":{\
				 \"AccessKeyId\":\"ASIATEMP\",\"SecretAccessKey\":\"temp-secret\",\
				 \"SessionToken\":\"\",\"Expiration\":4102444800}}}}",
			);
		})
		.await;

	let assumer = build_assumer(&server);
	let err = assumer.credentials().await.expect_err("Empty session token should be rejected.");

	assert!(matches!(err, ExchangeError::InvalidResponse { .. }));
	assert!(assumer.cached().is_none());
}
