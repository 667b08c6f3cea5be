//! Drives the full token, role, and signed-call pipeline against local mock endpoints and
//! shows that the second call reuses both cached credentials.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use spapi_client::{
	client::SpApiClient, config::SpApiConfig, http::ReqwestHttpClient, reqwest::Client,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/o2/token").body_includes("grant_type=refresh_token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"Atza|demo\",\"expires_in\":3600}");
		})
		.await;
	let role_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/sts").body_includes("Action=AssumeRole");
			then.status(200).header("content-type", "application/json").body(
				"{\"AssumeRoleResponse\":{\"AssumeRoleResult\":{\"Credentials\":{\
				 \"AccessKeyId\":\"ASIADEMO\",\"SecretAccessKey\":\"demo-secret\",\
				 \"SessionToken\":\"demo-session\",\"Expiration\":4102444800}}}}",
			);
		})
		.await;
	let orders_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/orders/v0/orders").header_exists("authorization");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"payload\":{\"Orders\":[{\"OrderItems\":[{},{}]}]}}");
		})
		.await;
	let config = SpApiConfig::builder()
		.client_id("amzn1.application-oa2-client.demo")
		.client_secret("demo-client-secret")
		.refresh_token("Atzr|demo-refresh")
		.aws_access_key_id("AKIDEMO")
		.aws_secret_access_key("demo-account-secret")
		.role_arn("arn:aws:iam::123456789012:role/SpApiDemo")
		.seller_id("A1DEMO")
		.lwa_endpoint(Url::parse(&server.url("/auth/o2/token"))?)
		.sts_endpoint(Url::parse(&server.url("/sts"))?)
		.base_url(Url::parse(&server.base_url())?)
		.build()?;
	let client = <SpApiClient<ReqwestHttpClient>>::with_transport(
		config,
		ReqwestHttpClient::with_client(Client::builder().build()?),
	);

	for _ in 0..2 {
		let orders = client.call_orders_today().await?;

		println!("Orders payload: {orders}.");
	}

	println!(
		"Network calls: {} token, {} role, {} API.",
		client.metrics().lwa_exchanges(),
		client.metrics().role_assumptions(),
		client.metrics().api_calls()
	);

	token_mock.assert_async().await;
	role_mock.assert_async().await;
	orders_mock.assert_calls_async(2).await;

	Ok(())
}
