//! STS role assumption.
//!
//! [`RoleAssumer`] signs an `AssumeRole` query-API call with the account-level key pair and
//! caches the returned temporary credentials until their expiration (minus the safety
//! margin). Responses are requested as JSON; `Expiration` is accepted either as epoch seconds
//! or as an RFC 3339 timestamp.

// crates.io
use time::format_description::well_known::Rfc3339;
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{AwsCredentials, TemporaryCredential},
	cache::TokenCache,
	client::ClientMetrics,
	error::ExchangeError,
	http::{HttpRequest, HttpResponse, HttpTransport, Method},
	lwa::FORM_CONTENT_TYPE,
	obs::{self, Stage, StageOutcome, StageSpan},
	sign::RequestSigner,
};

/// Service name STS signatures are scoped to.
pub const STS_SERVICE: &str = "sts";
/// Query API version sent with every `AssumeRole` call.
pub const STS_API_VERSION: &str = "2011-06-15";

const ENDPOINT_LABEL: &str = "sts_assume_role";

/// Exchanges account-level keys for cached, role-scoped [`TemporaryCredential`]s.
pub struct RoleAssumer<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<T>,
	endpoint: Url,
	account: AwsCredentials,
	role_arn: String,
	session_name: String,
	duration: Duration,
	signer: RequestSigner,
	safety_margin: Duration,
	timeout: Duration,
	cache: TokenCache<TemporaryCredential>,
	metrics: Arc<ClientMetrics>,
}
impl<T> RoleAssumer<T>
where
	T: ?Sized + HttpTransport,
{
	const DEFAULT_DURATION: Duration = Duration::hours(1);
	const DEFAULT_SAFETY_MARGIN: Duration = Duration::seconds(60);
	const DEFAULT_SESSION_NAME: &'static str = "spapi-client-session";
	const DEFAULT_TIMEOUT: Duration = Duration::seconds(10);

	/// Creates a role assumer for `role_arn`, signing for `region`.
	pub fn new(
		transport: Arc<T>,
		endpoint: Url,
		account: AwsCredentials,
		role_arn: impl Into<String>,
		region: impl Into<String>,
	) -> Self {
		Self {
			transport,
			endpoint,
			account,
			role_arn: role_arn.into(),
			session_name: Self::DEFAULT_SESSION_NAME.into(),
			duration: Self::DEFAULT_DURATION,
			signer: RequestSigner::new(region, STS_SERVICE),
			safety_margin: Self::DEFAULT_SAFETY_MARGIN,
			timeout: Self::DEFAULT_TIMEOUT,
			cache: TokenCache::default(),
			metrics: Default::default(),
		}
	}

	/// Overrides the role session name.
	pub fn with_session_name(mut self, name: impl Into<String>) -> Self {
		self.session_name = name.into();

		self
	}

	/// Overrides the requested session lifetime (defaults to one hour).
	pub fn with_duration(mut self, duration: Duration) -> Self {
		self.duration = duration;

		self
	}

	/// Overrides the margin subtracted from the STS expiration (defaults to 60 seconds).
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

	/// Counters updated by this role assumer.
	pub fn metrics(&self) -> &ClientMetrics {
		&self.metrics
	}

	/// Role ARN being assumed.
	pub fn role_arn(&self) -> &str {
		&self.role_arn
	}

	/// Returns the cached credentials (even if stale) without contacting STS.
	pub fn cached(&self) -> Option<TemporaryCredential> {
		self.cache.snapshot()
	}

	/// Drops the cached credentials so the next [`Self::credentials`] call assumes the role.
	pub fn invalidate(&self) {
		self.cache.invalidate();
	}

	/// Returns live temporary credentials, assuming the role only when the cached set is
	/// missing or expired.
	pub async fn credentials(&self) -> Result<TemporaryCredential, ExchangeError> {
		const STAGE: Stage = Stage::AwsRole;

		let span = StageSpan::new(STAGE, "credentials");

		obs::record_stage_outcome(STAGE, StageOutcome::Attempt);

		let result = span.instrument(self.cache.get_or_refresh(|| self.assume())).await;

		obs::record_result(STAGE, &result);

		result
	}

	async fn assume(&self) -> Result<TemporaryCredential, ExchangeError> {
		self.metrics.record_role_assumption();

		let body = form_urlencoded::Serializer::new(String::new())
			.append_pair("Action", "AssumeRole")
			.append_pair("DurationSeconds", &self.duration.whole_seconds().to_string())
			.append_pair("RoleArn", &self.role_arn)
			.append_pair("RoleSessionName", &self.session_name)
			.append_pair("Version", STS_API_VERSION)
			.finish();
		let mut request = HttpRequest::new(ENDPOINT_LABEL, Method::Post, self.endpoint.clone())
			.with_header("content-type", FORM_CONTENT_TYPE)
			.with_header("accept", "application/json")
			.with_body(body)
			.with_timeout(self.timeout);

		request.headers = self.signer.sign_at(&self.account, &request, OffsetDateTime::now_utc())?;

		let response = self.transport.send(request).await?;

		if !response.is_success() {
			#[cfg(feature = "tracing")]
			tracing::warn!(
				status = response.status,
				role_arn = %self.role_arn,
				"STS role assumption rejected."
			);

			return Err(rejection(&response));
		}

		let envelope = response
			.json::<AssumeRoleEnvelope>()
			.map_err(|source| ExchangeError::Parse { source, status: response.status })?;
		let issued = envelope.assume_role_response.assume_role_result.credentials;

		if issued.access_key_id.is_empty()
			|| issued.secret_access_key.is_empty()
			|| issued.session_token.is_empty()
		{
			return Err(ExchangeError::InvalidResponse {
				reason: "temporary credentials are incomplete".into(),
			});
		}

		let expiration = issued.expiration.to_datetime()?;
		let credential = TemporaryCredential::from_expiration(
			AwsCredentials::new(issued.access_key_id, issued.secret_access_key)
				.with_session_token(issued.session_token),
			expiration,
			self.safety_margin,
		);

		#[cfg(feature = "tracing")]
		tracing::debug!(expires_at = %credential.expires_at, "STS role credentials refreshed.");

		Ok(credential)
	}
}
impl<T> Debug for RoleAssumer<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RoleAssumer")
			.field("endpoint", &self.endpoint.as_str())
			.field("account", &self.account)
			.field("role_arn", &self.role_arn)
			.field("session_name", &self.session_name)
			.field("signer", &self.signer)
			.finish_non_exhaustive()
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleEnvelope {
	assume_role_response: AssumeRoleResponse,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleResponse {
	assume_role_result: AssumeRoleResult,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleResult {
	credentials: IssuedCredentials,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct IssuedCredentials {
	access_key_id: String,
	secret_access_key: String,
	session_token: String,
	expiration: Expiration,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Expiration {
	EpochSeconds(f64),
	Timestamp(String),
}
impl Expiration {
	fn to_datetime(&self) -> Result<OffsetDateTime, ExchangeError> {
		let invalid = || ExchangeError::InvalidResponse {
			reason: format!("unrecognised credential expiration {self:?}"),
		};

		match self {
			Self::EpochSeconds(secs) if secs.is_finite() =>
				OffsetDateTime::from_unix_timestamp(secs.trunc() as i64).map_err(|_| invalid()),
			Self::EpochSeconds(_) => Err(invalid()),
			Self::Timestamp(raw) => OffsetDateTime::parse(raw, &Rfc3339).map_err(|_| invalid()),
		}
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StsErrorEnvelope {
	error: StsErrorDetail,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StsErrorDetail {
	code: Option<String>,
	message: Option<String>,
}

fn rejection(response: &HttpResponse) -> ExchangeError {
	let body = response.text();
	let message = response
		.json::<StsErrorEnvelope>()
		.ok()
		.and_then(|envelope| match (envelope.error.code, envelope.error.message) {
			(Some(code), Some(message)) => Some(format!("{code}: {message}")),
			(code, message) => code.or(message),
		})
		.unwrap_or_else(|| body.trim().to_owned());

	ExchangeError::Rejected { status: response.status, message, body }
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn expiration_accepts_epoch_and_rfc3339() {
		let epoch: Expiration =
			serde_json::from_str("1735693200.0").expect("Epoch expiration should deserialize.");
		let text: Expiration = serde_json::from_str("\"2025-01-01T01:00:00Z\"")
			.expect("Timestamp expiration should deserialize.");

		assert_eq!(
			epoch.to_datetime().expect("Epoch should convert."),
			macros::datetime!(2025-01-01 01:00 UTC)
		);
		assert_eq!(
			text.to_datetime().expect("Timestamp should convert."),
			macros::datetime!(2025-01-01 01:00 UTC)
		);
		assert!(Expiration::Timestamp("tomorrow".into()).to_datetime().is_err());
	}

	#[test]
	fn rejection_surfaces_sts_error_code() {
		let response = HttpResponse::new(
			403,
			r#"{"Error":{"Code":"AccessDenied","Message":"Not authorized","Type":"Sender"}}"#,
		);

		match rejection(&response) {
			ExchangeError::Rejected { status, message, .. } => {
				assert_eq!(status, 403);
				assert_eq!(message, "AccessDenied: Not authorized");
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}
}
