//! Client configuration: credentials, endpoints, timeouts, and retry tunables.
//!
//! [`SpApiConfig`] is assembled through [`SpApiConfigBuilder`] or loaded from the process
//! environment with [`SpApiConfig::from_env`]. Validation happens once, up front: a missing
//! credential fails construction instead of surfacing later as a half-authenticated call.

pub mod region;

pub use region::*;

// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	auth::{AwsCredentials, RefreshCredential, Secret},
	client::RetryPolicy,
	error::ConfigError,
};

/// Environment variable names read by [`SpApiConfig::from_env`].
pub mod env {
	/// LWA application client identifier.
	pub const CLIENT_ID: &str = "SP_API_CLIENT_ID";
	/// LWA application client secret.
	pub const CLIENT_SECRET: &str = "SP_API_CLIENT_SECRET";
	/// LWA refresh token.
	pub const REFRESH_TOKEN: &str = "SP_API_REFRESH_TOKEN";
	/// Account-level AWS access key identifier.
	pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
	/// Account-level AWS secret access key.
	pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
	/// IAM role assumed for Selling Partner API calls.
	pub const AWS_ROLE_ARN: &str = "AWS_ROLE_ARN";
	/// AWS signing region.
	pub const AWS_REGION: &str = "AWS_REGION";
	/// Seller (merchant) identifier.
	pub const SELLER_ID: &str = "SELLER_ID";
	/// Marketplace identifier.
	pub const MARKETPLACE_ID: &str = "MARKETPLACE_ID";
	/// Optional Selling Partner API root override.
	pub const BASE_URL: &str = "SP_API_BASE_URL";
	/// Optional LWA token endpoint override.
	pub const LWA_URL: &str = "SP_API_LWA_URL";
	/// Optional STS endpoint override.
	pub const STS_URL: &str = "SP_API_STS_URL";
	/// Optional role session name override.
	pub const ROLE_SESSION_NAME: &str = "SP_API_ROLE_SESSION_NAME";
}

/// Default AWS region (North America).
pub const DEFAULT_REGION: &str = "us-east-1";
/// Default marketplace (amazon.com).
pub const DEFAULT_MARKETPLACE_ID: &str = "ATVPDKIKX0DER";
/// Login with Amazon token endpoint.
pub const DEFAULT_LWA_ENDPOINT: &str = "https://api.amazon.com/auth/o2/token";
/// Default role session name.
pub const DEFAULT_ROLE_SESSION_NAME: &str = "spapi-client-session";
/// Default user agent sent with every call.
pub const DEFAULT_USER_AGENT: &str = concat!("spapi-client/", env!("CARGO_PKG_VERSION"));

/// Validated client configuration.
#[derive(Clone, Debug)]
pub struct SpApiConfig {
	/// LWA client triple.
	pub refresh: RefreshCredential,
	/// Account-level key pair used only to assume the role.
	pub account: AwsCredentials,
	/// IAM role ARN assumed for API calls.
	pub role_arn: String,
	/// Session name recorded by STS for the assumed role.
	pub role_session_name: String,
	/// Requested role session lifetime.
	pub role_duration: Duration,
	/// AWS signing region.
	pub region: String,
	/// Seller identifier reported by diagnostics.
	pub seller_id: String,
	/// Marketplace used by the endpoint helpers.
	pub marketplace_id: String,
	/// Selling Partner API root.
	pub base_url: Url,
	/// Login with Amazon token endpoint.
	pub lwa_endpoint: Url,
	/// STS endpoint.
	pub sts_endpoint: Url,
	/// User agent sent with every request.
	pub user_agent: String,
	/// Margin subtracted from every credential expiry.
	pub safety_margin: Duration,
	/// Timeout for LWA and STS exchanges.
	pub exchange_timeout: Duration,
	/// Timeout for Selling Partner API calls.
	pub api_timeout: Duration,
	/// Throttling retry policy.
	pub retry: RetryPolicy,
}
impl SpApiConfig {
	/// Creates an empty builder.
	pub fn builder() -> SpApiConfigBuilder {
		SpApiConfigBuilder::default()
	}

	/// Loads configuration from the process environment (see [`env`] for variable names).
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Loads configuration from an arbitrary variable lookup. Blank values count as missing.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
		let url = |name: &'static str| {
			get(name)
				.map(|raw| Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { name, source }))
				.transpose()
		};
		let mut builder = Self::builder();

		if let Some(value) = get(env::CLIENT_ID) {
			builder = builder.client_id(value);
		}
		if let Some(value) = get(env::CLIENT_SECRET) {
			builder = builder.client_secret(value);
		}
		if let Some(value) = get(env::REFRESH_TOKEN) {
			builder = builder.refresh_token(value);
		}
		if let Some(value) = get(env::AWS_ACCESS_KEY_ID) {
			builder = builder.aws_access_key_id(value);
		}
		if let Some(value) = get(env::AWS_SECRET_ACCESS_KEY) {
			builder = builder.aws_secret_access_key(value);
		}
		if let Some(value) = get(env::AWS_ROLE_ARN) {
			builder = builder.role_arn(value);
		}
		if let Some(value) = get(env::AWS_REGION) {
			builder = builder.region(value);
		}
		if let Some(value) = get(env::SELLER_ID) {
			builder = builder.seller_id(value);
		}
		if let Some(value) = get(env::MARKETPLACE_ID) {
			builder = builder.marketplace_id(value);
		}
		if let Some(value) = get(env::ROLE_SESSION_NAME) {
			builder = builder.role_session_name(value);
		}
		if let Some(value) = url(env::BASE_URL)? {
			builder = builder.base_url(value);
		}
		if let Some(value) = url(env::LWA_URL)? {
			builder = builder.lwa_endpoint(value);
		}
		if let Some(value) = url(env::STS_URL)? {
			builder = builder.sts_endpoint(value);
		}

		builder.build()
	}

	/// Selling Partner API region served by [`Self::region`], if it is a known one.
	pub fn selling_region(&self) -> Option<SellingRegion> {
		SellingRegion::from_aws_region(&self.region)
	}
}

/// Builder for [`SpApiConfig`] values.
#[derive(Clone, Debug, Default)]
pub struct SpApiConfigBuilder {
	client_id: Option<String>,
	client_secret: Option<Secret>,
	refresh_token: Option<Secret>,
	aws_access_key_id: Option<String>,
	aws_secret_access_key: Option<Secret>,
	role_arn: Option<String>,
	role_session_name: Option<String>,
	role_duration: Option<Duration>,
	region: Option<String>,
	seller_id: Option<String>,
	marketplace_id: Option<String>,
	base_url: Option<Url>,
	lwa_endpoint: Option<Url>,
	sts_endpoint: Option<Url>,
	user_agent: Option<String>,
	safety_margin: Option<Duration>,
	exchange_timeout: Option<Duration>,
	api_timeout: Option<Duration>,
	retry: Option<RetryPolicy>,
}
impl SpApiConfigBuilder {
	const DEFAULT_API_TIMEOUT: Duration = Duration::seconds(15);
	const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::seconds(10);
	const DEFAULT_ROLE_DURATION: Duration = Duration::hours(1);
	const DEFAULT_SAFETY_MARGIN: Duration = Duration::seconds(60);

	/// Sets the LWA client identifier.
	pub fn client_id(mut self, value: impl Into<String>) -> Self {
		self.client_id = Some(value.into());

		self
	}

	/// Sets the LWA client secret.
	pub fn client_secret(mut self, value: impl Into<Secret>) -> Self {
		self.client_secret = Some(value.into());

		self
	}

	/// Sets the LWA refresh token.
	pub fn refresh_token(mut self, value: impl Into<Secret>) -> Self {
		self.refresh_token = Some(value.into());

		self
	}

	/// Sets the account-level access key identifier.
	pub fn aws_access_key_id(mut self, value: impl Into<String>) -> Self {
		self.aws_access_key_id = Some(value.into());

		self
	}

	/// Sets the account-level secret access key.
	pub fn aws_secret_access_key(mut self, value: impl Into<Secret>) -> Self {
		self.aws_secret_access_key = Some(value.into());

		self
	}

	/// Sets the IAM role ARN to assume.
	pub fn role_arn(mut self, value: impl Into<String>) -> Self {
		self.role_arn = Some(value.into());

		self
	}

	/// Overrides the STS role session name.
	pub fn role_session_name(mut self, value: impl Into<String>) -> Self {
		self.role_session_name = Some(value.into());

		self
	}

	/// Overrides the requested role session lifetime (defaults to one hour).
	pub fn role_duration(mut self, value: Duration) -> Self {
		self.role_duration = Some(value);

		self
	}

	/// Overrides the AWS signing region (defaults to `us-east-1`).
	pub fn region(mut self, value: impl Into<String>) -> Self {
		self.region = Some(value.into());

		self
	}

	/// Sets the seller identifier.
	pub fn seller_id(mut self, value: impl Into<String>) -> Self {
		self.seller_id = Some(value.into());

		self
	}

	/// Overrides the marketplace identifier (defaults to amazon.com).
	pub fn marketplace_id(mut self, value: impl Into<String>) -> Self {
		self.marketplace_id = Some(value.into());

		self
	}

	/// Overrides the Selling Partner API root (defaults from the region).
	pub fn base_url(mut self, value: Url) -> Self {
		self.base_url = Some(value);

		self
	}

	/// Overrides the LWA token endpoint.
	pub fn lwa_endpoint(mut self, value: Url) -> Self {
		self.lwa_endpoint = Some(value);

		self
	}

	/// Overrides the STS endpoint (defaults to the regional STS host).
	pub fn sts_endpoint(mut self, value: Url) -> Self {
		self.sts_endpoint = Some(value);

		self
	}

	/// Overrides the user agent.
	pub fn user_agent(mut self, value: impl Into<String>) -> Self {
		self.user_agent = Some(value.into());

		self
	}

	/// Overrides the margin subtracted from credential expiries (defaults to 60 seconds).
	pub fn safety_margin(mut self, value: Duration) -> Self {
		self.safety_margin = Some(value);

		self
	}

	/// Overrides the LWA/STS exchange timeout (defaults to 10 seconds).
	pub fn exchange_timeout(mut self, value: Duration) -> Self {
		self.exchange_timeout = Some(value);

		self
	}

	/// Overrides the API call timeout (defaults to 15 seconds).
	pub fn api_timeout(mut self, value: Duration) -> Self {
		self.api_timeout = Some(value);

		self
	}

	/// Overrides the whole throttling retry policy.
	pub fn retry_policy(mut self, value: RetryPolicy) -> Self {
		self.retry = Some(value);

		self
	}

	/// Overrides only the throttling backoff, keeping the retry cap.
	pub fn backoff(mut self, value: Duration) -> Self {
		self.retry = Some(self.retry.unwrap_or_default().with_backoff(value));

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<SpApiConfig, ConfigError> {
		let client_id = required(self.client_id, env::CLIENT_ID)?;
		let client_secret = required_secret(self.client_secret, env::CLIENT_SECRET)?;
		let refresh_token = required_secret(self.refresh_token, env::REFRESH_TOKEN)?;
		let access_key_id = required(self.aws_access_key_id, env::AWS_ACCESS_KEY_ID)?;
		let secret_access_key =
			required_secret(self.aws_secret_access_key, env::AWS_SECRET_ACCESS_KEY)?;
		let role_arn = required(self.role_arn, env::AWS_ROLE_ARN)?;
		let seller_id = required(self.seller_id, env::SELLER_ID)?;
		let region = self.region.unwrap_or_else(|| DEFAULT_REGION.into());
		let base_url = match self.base_url {
			Some(url) => url,
			None => {
				let selling = SellingRegion::from_aws_region(&region)
					.ok_or_else(|| ConfigError::UnsupportedRegion { region: region.clone() })?;

				parse_default(selling.endpoint(), env::BASE_URL)?
			},
		};
		let lwa_endpoint = match self.lwa_endpoint {
			Some(url) => url,
			None => parse_default(DEFAULT_LWA_ENDPOINT, env::LWA_URL)?,
		};
		let sts_endpoint = match self.sts_endpoint {
			Some(url) => url,
			None => parse_default(&format!("https://sts.{region}.amazonaws.com/"), env::STS_URL)?,
		};

		validate_endpoint("Selling Partner API", &base_url)?;
		validate_endpoint("LWA token", &lwa_endpoint)?;
		validate_endpoint("STS", &sts_endpoint)?;

		let config = SpApiConfig {
			refresh: RefreshCredential { client_id, client_secret, refresh_token },
			account: AwsCredentials::new(access_key_id, secret_access_key),
			role_arn,
			role_session_name: self
				.role_session_name
				.unwrap_or_else(|| DEFAULT_ROLE_SESSION_NAME.into()),
			role_duration: positive(
				self.role_duration.unwrap_or(Self::DEFAULT_ROLE_DURATION),
				"role_duration",
			)?,
			region,
			seller_id,
			marketplace_id: self.marketplace_id.unwrap_or_else(|| DEFAULT_MARKETPLACE_ID.into()),
			base_url,
			lwa_endpoint,
			sts_endpoint,
			user_agent: self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.into()),
			safety_margin: self.safety_margin.unwrap_or(Self::DEFAULT_SAFETY_MARGIN),
			exchange_timeout: positive(
				self.exchange_timeout.unwrap_or(Self::DEFAULT_EXCHANGE_TIMEOUT),
				"exchange_timeout",
			)?,
			api_timeout: positive(
				self.api_timeout.unwrap_or(Self::DEFAULT_API_TIMEOUT),
				"api_timeout",
			)?,
			retry: self.retry.unwrap_or_default(),
		};

		Ok(config)
	}
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
	value.filter(|value| !value.trim().is_empty()).ok_or(ConfigError::MissingSetting { name })
}

fn required_secret(value: Option<Secret>, name: &'static str) -> Result<Secret, ConfigError> {
	value.filter(|value| !value.is_blank()).ok_or(ConfigError::MissingSetting { name })
}

fn parse_default(raw: &str, name: &'static str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { name, source })
}

fn positive(value: Duration, name: &'static str) -> Result<Duration, ConfigError> {
	if value.is_positive() { Ok(value) } else { Err(ConfigError::NonPositiveDuration { name }) }
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	let loopback = match url.host() {
		Some(Host::Ipv4(ip)) => ip.is_loopback(),
		Some(Host::Ipv6(ip)) => ip.is_loopback(),
		Some(Host::Domain(domain)) => domain == "localhost",
		None => false,
	};

	if url.host().is_none() || (url.scheme() != "https" && !loopback) {
		Err(ConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}
