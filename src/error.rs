//! Client-level error types shared across the exchange, signing, and call pipeline.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
///
/// Every failure of the authentication and call pipeline is returned as a value of this
/// type; callers inspect it and degrade (for example, by serving cached or synthetic data).
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem detected before any network call.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Login with Amazon refused or failed to mint a bearer token.
	#[error("Login with Amazon token exchange failed.")]
	Authentication(#[source] ExchangeError),
	/// STS refused or failed to issue temporary role credentials.
	#[error("AWS role assumption failed.")]
	Authorization(#[source] ExchangeError),
	/// A request could not be signed.
	#[error(transparent)]
	Signing(#[from] SigningError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Selling Partner API answered with a non-success status.
	#[error("Selling Partner API returned HTTP {status}.")]
	Http {
		/// HTTP status code.
		status: u16,
		/// Raw response body kept for diagnostics.
		body: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Selling Partner API returned a success status with a body that is not JSON.
	#[error("Selling Partner API returned malformed JSON.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// Returns the HTTP status attached to the error, when one is known.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Http { status, .. } => Some(*status),
			Self::Authentication(inner) | Self::Authorization(inner) => inner.status(),
			Self::Signing(SigningError::CredentialsUnavailable { source }) => source.status(),
			_ => None,
		}
	}

	/// Returns `true` when the terminal error is an exhausted HTTP 429 throttle.
	pub fn is_rate_limited(&self) -> bool {
		matches!(self, Self::Http { status: 429, .. })
	}
}

/// Configuration and validation failures raised while assembling a client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A required setting was not supplied.
	#[error("Required setting `{name}` is missing.")]
	MissingSetting {
		/// Setting (or environment variable) name.
		name: &'static str,
	},
	/// A setting holds a URL that cannot be parsed.
	#[error("Setting `{name}` is not a valid URL.")]
	InvalidUrl {
		/// Setting (or environment variable) name.
		name: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoint does not use HTTPS and is not a loopback address.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// No Selling Partner API host is known for the AWS region.
	#[error("No Selling Partner API endpoint is known for region `{region}`; set the base URL explicitly.")]
	UnsupportedRegion {
		/// AWS region that could not be mapped.
		region: String,
	},
	/// An endpoint path passed to a call already carries a query string.
	#[error("Endpoint `{endpoint}` must not carry a query; pass parameters separately.")]
	EndpointWithQuery {
		/// Endpoint path as supplied.
		endpoint: String,
	},
	/// A timestamp query parameter could not be rendered.
	#[error("Timestamp query parameter could not be formatted.")]
	TimestampFormat {
		/// Underlying formatting failure.
		#[source]
		source: time::error::Format,
	},
	/// A duration setting must be positive.
	#[error("Setting `{name}` must be a positive duration.")]
	NonPositiveDuration {
		/// Setting name.
		name: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Reasons a credential exchange (LWA token or STS role) did not produce credentials.
#[derive(Debug, ThisError)]
pub enum ExchangeError {
	/// Endpoint answered with a non-success status.
	#[error("Endpoint rejected the exchange with HTTP {status}: {message}.")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Provider-supplied error summary (or the raw body when none could be extracted).
		message: String,
		/// Raw response body.
		body: String,
	},
	/// Endpoint responded with JSON that does not match the expected shape.
	#[error("Endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code.
		status: u16,
	},
	/// Endpoint returned well-formed JSON with unusable values.
	#[error("Endpoint returned an unusable response: {reason}.")]
	InvalidResponse {
		/// What was wrong with the response.
		reason: String,
	},
	/// Request could not be built or signed.
	#[error("Exchange request could not be signed.")]
	Signing(#[source] Box<SigningError>),
	/// Transport failure while calling the endpoint.
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl ExchangeError {
	/// Returns the HTTP status attached to the failure, when one is known.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Rejected { status, .. } | Self::Parse { status, .. } => Some(*status),
			_ => None,
		}
	}
}
impl From<SigningError> for ExchangeError {
	fn from(e: SigningError) -> Self {
		Self::Signing(Box::new(e))
	}
}

/// Signature V4 failures.
#[derive(Debug, ThisError)]
pub enum SigningError {
	/// Signing cannot proceed because no live temporary credentials could be obtained.
	#[error("Temporary credentials are unavailable; the request was not signed.")]
	CredentialsUnavailable {
		/// Role assumption failure that left the signer without credentials.
		#[source]
		source: ExchangeError,
	},
	/// Request URL has no host to bind the signature to.
	#[error("Request URL `{url}` has no host.")]
	MissingHost {
		/// Offending URL.
		url: String,
	},
	/// HMAC key could not be initialised.
	#[error("HMAC key could not be initialised.")]
	InvalidKey,
	/// Signing timestamp could not be formatted.
	#[error("Signing timestamp could not be formatted.")]
	Timestamp(#[from] time::error::Format),
}

/// Transport-level failures (network, timeout, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {endpoint}.")]
	Network {
		/// Logical endpoint label.
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request exceeded its timeout.
	#[error("Request to {endpoint} timed out.")]
	Timeout {
		/// Logical endpoint label.
		endpoint: &'static str,
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Timeout { endpoint, source: Box::new(src) }
	}

	/// Returns `true` if the failure was a timeout.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout { .. })
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as _;
	// self
	use super::*;

	#[test]
	fn status_is_exposed_through_nested_failures() {
		let rejected = || ExchangeError::Rejected {
			status: 403,
			message: "AccessDenied".into(),
			body: "{}".into(),
		};

		assert_eq!(Error::Authorization(rejected()).status(), Some(403));
		assert_eq!(
			Error::Signing(SigningError::CredentialsUnavailable { source: rejected() }).status(),
			Some(403)
		);
		assert_eq!(Error::Config(ConfigError::MissingSetting { name: "SELLER_ID" }).status(), None);
	}

	#[test]
	fn only_http_429_counts_as_rate_limited() {
		let throttled = Error::Http { status: 429, body: String::new(), retry_after: None };
		let denied = Error::Http { status: 403, body: String::new(), retry_after: None };

		assert!(throttled.is_rate_limited());
		assert!(!denied.is_rate_limited());
	}

	#[test]
	fn signing_failure_keeps_role_error_as_source() {
		let err = Error::Signing(SigningError::CredentialsUnavailable {
			source: ExchangeError::InvalidResponse { reason: "missing credentials".into() },
		});
		let source = err.source().expect("Signing error should expose the exchange failure.");

		assert!(source.to_string().contains("missing credentials"));
	}
}
