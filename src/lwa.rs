//! Login with Amazon bearer-token exchange.
//!
//! [`LwaAuthenticator`] trades the application's refresh credential for a short-lived access
//! token via a `grant_type=refresh_token` form POST. Tokens live in a single-flight
//! [`TokenCache`], so concurrent callers racing past an expired token trigger exactly one
//! exchange, and a failed exchange never replaces the cached record.

// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{BearerToken, RefreshCredential},
	cache::TokenCache,
	client::ClientMetrics,
	error::ExchangeError,
	http::{HttpRequest, HttpResponse, HttpTransport, Method},
	obs::{self, Stage, StageOutcome, StageSpan},
};

/// Content type used by form-encoded credential exchanges.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

const ENDPOINT_LABEL: &str = "lwa_token";
const DEFAULT_EXPIRES_IN: i64 = 3_600;

/// Exchanges a [`RefreshCredential`] for cached [`BearerToken`]s.
pub struct LwaAuthenticator<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<T>,
	endpoint: Url,
	credential: RefreshCredential,
	safety_margin: Duration,
	timeout: Duration,
	cache: TokenCache<BearerToken>,
	metrics: Arc<ClientMetrics>,
}
impl<T> LwaAuthenticator<T>
where
	T: ?Sized + HttpTransport,
{
	const DEFAULT_SAFETY_MARGIN: Duration = Duration::seconds(60);
	const DEFAULT_TIMEOUT: Duration = Duration::seconds(10);

	/// Creates an authenticator posting to `endpoint` with default margin and timeout.
	pub fn new(transport: Arc<T>, endpoint: Url, credential: RefreshCredential) -> Self {
		Self {
			transport,
			endpoint,
			credential,
			safety_margin: Self::DEFAULT_SAFETY_MARGIN,
			timeout: Self::DEFAULT_TIMEOUT,
			cache: TokenCache::default(),
			metrics: Default::default(),
		}
	}

	/// Overrides the margin subtracted from `expires_in` (defaults to 60 seconds).
	pub fn with_safety_margin(mut self, margin: Duration) -> Self {
		self.safety_margin = margin;

		self
	}

	/// Overrides the exchange timeout (defaults to 10 seconds).
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Shares a counter set with the owning client.
	pub fn with_metrics(mut self, metrics: Arc<ClientMetrics>) -> Self {
		self.metrics = metrics;

		self
	}

	/// Counters updated by this authenticator.
	pub fn metrics(&self) -> &ClientMetrics {
		&self.metrics
	}

	/// Token endpoint this authenticator posts to.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// Returns the cached token (even if stale) without contacting the endpoint.
	pub fn cached(&self) -> Option<BearerToken> {
		self.cache.snapshot()
	}

	/// Drops the cached token so the next [`Self::token`] call performs an exchange.
	pub fn invalidate(&self) {
		self.cache.invalidate();
	}

	/// Returns a fresh bearer token, exchanging the refresh credential only when the cached
	/// token is missing or expired.
	pub async fn token(&self) -> Result<BearerToken, ExchangeError> {
		const STAGE: Stage = Stage::LwaToken;

		let span = StageSpan::new(STAGE, "token");

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);

		let result = span.instrument(self.cache.get_or_refresh(|| self.exchange())).await;

		obs::record_result(STAGE, &result);

		result
	}

	async fn exchange(&self) -> Result<BearerToken, ExchangeError> {
		self.metrics.record_lwa_exchange();

		let body = form_urlencoded::Serializer::new(String::new())
			.append_pair("grant_type", "refresh_token")
			.append_pair("refresh_token", self.credential.refresh_token.expose())
			.append_pair("client_id", &self.credential.client_id)
			.append_pair("client_secret", self.credential.client_secret.expose())
			.finish();
		let request = HttpRequest::new(ENDPOINT_LABEL, Method::Post, self.endpoint.clone())
			.with_header("content-type", FORM_CONTENT_TYPE)
			.with_header("accept", "application/json")
			.with_body(body)
			.with_timeout(self.timeout);
		let issued_at = OffsetDateTime::now_utc();
		let response = self.transport.send(request).await?;

		if !response.is_success() {
			#[cfg(feature = "tracing")]
			tracing::warn!(status = response.status, "LWA token exchange rejected.");

			return Err(rejection(&response));
		}

		let payload = response
			.json::<TokenResponse>()
			.map_err(|source| ExchangeError::Parse { source, status: response.status })?;

		if payload.access_token.trim().is_empty() {
			return Err(ExchangeError::InvalidResponse {
				reason: "access_token is empty".into(),
			});
		}

		let expires_in = payload.expires_in.unwrap_or(DEFAULT_EXPIRES_IN);

		if expires_in <= 0 {
			return Err(ExchangeError::InvalidResponse {
				reason: format!("expires_in must be positive, got {expires_in}"),
			});
		}

		let token = BearerToken::from_lifetime(
			payload.access_token,
			issued_at,
			Duration::seconds(expires_in),
			self.safety_margin,
		);

		#[cfg(feature = "tracing")]
		tracing::debug!(expires_at = %token.expires_at, "LWA bearer token refreshed.");

		Ok(token)
	}
}
impl<T> Debug for LwaAuthenticator<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LwaAuthenticator")
			.field("endpoint", &self.endpoint.as_str())
			.field("credential", &self.credential)
			.field("safety_margin", &self.safety_margin)
			.field("timeout", &self.timeout)
			.finish_non_exhaustive()
	}
}

#[derive(Deserialize)]
struct TokenResponse {
	access_token: String,
	#[serde(default)]
	expires_in: Option<i64>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
	error: Option<String>,
	error_description: Option<String>,
}

fn rejection(response: &HttpResponse) -> ExchangeError {
	let body = response.text();
	let message = response
		.json::<TokenErrorResponse>()
		.ok()
		.and_then(|err| match (err.error, err.error_description) {
			(Some(code), Some(description)) => Some(format!("{code}: {description}")),
			(code, description) => code.or(description),
		})
		.unwrap_or_else(|| body.trim().to_owned());

	ExchangeError::Rejected { status: response.status, message, body }
}
