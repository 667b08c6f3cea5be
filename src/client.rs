//! Signed Selling Partner API client.
//!
//! [`SpApiClient`] owns one [`LwaAuthenticator`], one [`RoleAssumer`], and the Signature V4
//! signer, so every client instance carries its own credential caches. Each call walks the
//! same pipeline: bearer token, temporary role credentials, signature, HTTP request. An
//! HTTP 429 is absorbed by the bounded [`RetryPolicy`]; every other failure is returned as
//! an [`Error`] value for the caller to inspect.

pub mod diagnostics;
pub mod endpoints;
pub mod retry;

mod metrics;

pub use diagnostics::*;
pub use endpoints::*;
pub use metrics::ClientMetrics;
pub use retry::*;

// self
use crate::{
	_prelude::*,
	auth::{BearerToken, TemporaryCredential},
	config::SpApiConfig,
	error::{ConfigError, SigningError},
	http::{Headers, HttpRequest, HttpResponse, HttpTransport, Method},
	lwa::LwaAuthenticator,
	obs::{self, Stage, StageOutcome, StageSpan},
	sign::{self, RequestSigner},
	sts::RoleAssumer,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Header carrying the LWA bearer token.
pub const ACCESS_TOKEN_HEADER: &str = "x-amz-access-token";

const ENDPOINT_LABEL: &str = "sp_api";

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestSpApiClient = SpApiClient<ReqwestHttpClient>;

/// Authenticated Selling Partner API client.
pub struct SpApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	config: SpApiConfig,
	transport: Arc<T>,
	authenticator: LwaAuthenticator<T>,
	role_assumer: RoleAssumer<T>,
	signer: RequestSigner,
	metrics: Arc<ClientMetrics>,
}
impl<T> SpApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that sends every request through `transport`.
	pub fn with_transport(config: SpApiConfig, transport: impl Into<Arc<T>>) -> Self {
		let transport = transport.into();
		let metrics = Arc::new(ClientMetrics::default());
		let authenticator = LwaAuthenticator::new(
			transport.clone(),
			config.lwa_endpoint.clone(),
			config.refresh.clone(),
		)
		.with_safety_margin(config.safety_margin)
		.with_timeout(config.exchange_timeout)
		.with_metrics(metrics.clone());
		let role_assumer = RoleAssumer::new(
			transport.clone(),
			config.sts_endpoint.clone(),
			config.account.clone(),
			config.role_arn.clone(),
			config.region.clone(),
		)
		.with_session_name(config.role_session_name.clone())
		.with_duration(config.role_duration)
		.with_safety_margin(config.safety_margin)
		.with_timeout(config.exchange_timeout)
		.with_metrics(metrics.clone());
		let signer = RequestSigner::execute_api(config.region.clone());

		Self { config, transport, authenticator, role_assumer, signer, metrics }
	}

	/// Validated configuration backing this client.
	pub fn config(&self) -> &SpApiConfig {
		&self.config
	}

	/// Network counters for this client.
	pub fn metrics(&self) -> &ClientMetrics {
		&self.metrics
	}

	/// Login with Amazon authenticator owned by this client.
	pub fn authenticator(&self) -> &LwaAuthenticator<T> {
		&self.authenticator
	}

	/// STS role assumer owned by this client.
	pub fn role_assumer(&self) -> &RoleAssumer<T> {
		&self.role_assumer
	}

	/// Returns a fresh bearer token, exchanging the refresh credential when needed.
	pub async fn bearer_token(&self) -> Result<BearerToken> {
		self.authenticator.token().await.map_err(Error::Authentication)
	}

	/// Returns live temporary role credentials, assuming the role when needed.
	pub async fn temporary_credentials(&self) -> Result<TemporaryCredential> {
		self.role_assumer.credentials().await.map_err(Error::Authorization)
	}

	/// Signs a request with the current role credentials and returns the full header set
	/// (caller headers plus authorization, timestamp, and session token).
	///
	/// Fails with [`SigningError::CredentialsUnavailable`] when the role cannot be assumed.
	pub async fn sign(
		&self,
		method: Method,
		url: &Url,
		headers: Headers,
		body: &[u8],
	) -> Result<Headers> {
		let mut request = HttpRequest::new(ENDPOINT_LABEL, method, url.clone()).with_body(body);

		request.headers = headers;

		Ok(self.sign_request(request).await?.headers)
	}

	/// Issues a signed `GET` against `base_url + endpoint` and decodes the JSON response.
	///
	/// `endpoint` is a bare path; a path carrying `?` is rejected before any network call.
	///
	/// A 429 is retried after the configured backoff until the retry budget is spent; the
	/// last 429 is then returned as [`Error::Http`].
	pub async fn call<I, K, V>(&self, endpoint: &str, params: I) -> Result<serde_json::Value>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		const STAGE: Stage = Stage::SpApiCall;

		let span = StageSpan::new(STAGE, "call");
		let url = self.endpoint_url(endpoint, params)?;

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);

		let result = span.instrument(self.call_url(url)).await;

		obs::record_result(STAGE, &result);

		result
	}

	/// Fetches orders matching `query`.
	pub async fn call_orders(&self, query: &OrdersQuery) -> Result<serde_json::Value> {
		self.call(ORDERS_PATH, query.params()?).await
	}

	/// Fetches orders created since 00:00 UTC today in the configured marketplace.
	pub async fn call_orders_today(&self) -> Result<serde_json::Value> {
		self.call_orders(&OrdersQuery::today(
			self.config.marketplace_id.as_str(),
			OffsetDateTime::now_utc(),
		))
		.await
	}

	/// Fetches orders created during the last seven days in the configured marketplace.
	pub async fn call_orders_week(&self) -> Result<serde_json::Value> {
		self.call_orders(&OrdersQuery::last_week(
			self.config.marketplace_id.as_str(),
			OffsetDateTime::now_utc(),
		))
		.await
	}

	/// Fetches FBA inventory summaries for the configured marketplace.
	pub async fn call_inventory(&self) -> Result<serde_json::Value> {
		let query = InventoryQuery::marketplace(self.config.marketplace_id.as_str());

		self.call(INVENTORY_PATH, query.params()).await
	}

	/// Runs the token, role, and orders stages in order and reports the first that fails.
	///
	/// The orders probe covers the last 24 hours with no status filter.
	pub async fn test_connection(&self) -> ConnectionReport {
		if let Err(error) = self.bearer_token().await {
			return ConnectionReport::Failed { stage: Stage::LwaToken, error };
		}
		if let Err(error) = self.temporary_credentials().await {
			return ConnectionReport::Failed { stage: Stage::AwsRole, error };
		}

		let probe =
			OrdersQuery::last_day(self.config.marketplace_id.as_str(), OffsetDateTime::now_utc());

		match self.call_orders(&probe).await {
			Ok(response) => ConnectionReport::Success {
				seller_id: self.config.seller_id.clone(),
				marketplace_id: self.config.marketplace_id.clone(),
				api_calls: self.metrics.api_calls(),
				sample_orders: sample_order_count(&response),
			},
			Err(error) => ConnectionReport::Failed { stage: Stage::SpApiCall, error },
		}
	}

	fn endpoint_url<I, K, V>(&self, endpoint: &str, params: I) -> Result<Url>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		if endpoint.contains('?') {
			return Err(ConfigError::EndpointWithQuery { endpoint: endpoint.to_owned() }.into());
		}

		let params = params.into_iter().collect::<Vec<_>>();
		let query = sign::canonical_query(
			params.iter().map(|(key, value)| (key.as_ref(), value.as_ref())),
		);
		let base = self.config.base_url.as_str().trim_end_matches('/');
		let separator = if endpoint.starts_with('/') { "" } else { "/" };
		let mut raw = format!("{base}{separator}{endpoint}");

		if !query.is_empty() {
			raw.push('?');
			raw.push_str(&query);
		}

		Url::parse(&raw)
			.map_err(|source| ConfigError::InvalidUrl { name: "endpoint", source }.into())
	}

	async fn call_url(&self, url: Url) -> Result<serde_json::Value> {
		let token = self.bearer_token().await?;
		let mut retries = 0;

		loop {
			let request = HttpRequest::new(ENDPOINT_LABEL, Method::Get, url.clone())
				.with_header("user-agent", self.config.user_agent.as_str())
				.with_header(ACCESS_TOKEN_HEADER, token.value.expose())
				.with_timeout(self.config.api_timeout);
			let request = self.sign_request(request).await?;

			self.metrics.record_api_call();

			let response = self.transport.send(request).await?;

			if response.is_success() {
				return decode(&response);
			}
			if response.status == 429 {
				self.metrics.record_throttled();
				obs::record_stage_outcome(Stage::SpApiCall, StageOutcome::Throttled);

				if let Some(delay) = self.config.retry.next_delay(retries) {
					#[cfg(feature = "tracing")]
					tracing::warn!(
						path = url.path(),
						retry = retries + 1,
						delay_ms = delay.whole_milliseconds() as u64,
						"Selling Partner API throttled the call; retrying."
					);

					tokio::time::sleep(delay.unsigned_abs()).await;

					retries += 1;

					continue;
				}
			}

			#[cfg(feature = "tracing")]
			tracing::warn!(
				path = url.path(),
				status = response.status,
				"Selling Partner API returned an error status."
			);

			return Err(Error::Http {
				status: response.status,
				body: response.text(),
				retry_after: response.retry_after,
			});
		}
	}

	async fn sign_request(&self, mut request: HttpRequest) -> Result<HttpRequest> {
		let credential = self
			.role_assumer
			.credentials()
			.await
			.map_err(|source| SigningError::CredentialsUnavailable { source })?;

		request.headers =
			self.signer.sign_at(&credential.credentials, &request, OffsetDateTime::now_utc())?;

		Ok(request)
	}
}
#[cfg(feature = "reqwest")]
impl SpApiClient<ReqwestHttpClient> {
	/// Creates a client backed by a reqwest transport using the configured user agent.
	pub fn new(config: SpApiConfig) -> Result<Self> {
		let transport = ReqwestHttpClient::with_user_agent(&config.user_agent)?;

		Ok(Self::with_transport(config, transport))
	}

	/// Creates a client from [`SpApiConfig::from_env`].
	pub fn from_env() -> Result<Self> {
		Self::new(SpApiConfig::from_env()?)
	}
}
impl<T> Debug for SpApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SpApiClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("seller_id", &self.config.seller_id)
			.field("marketplace_id", &self.config.marketplace_id)
			.field("signer", &self.signer)
			.finish_non_exhaustive()
	}
}

fn decode(response: &HttpResponse) -> Result<serde_json::Value> {
	if response.body.iter().all(u8::is_ascii_whitespace) {
		return Ok(serde_json::Value::Null);
	}

	response.json().map_err(|source| Error::Decode { source })
}
