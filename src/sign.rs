//! AWS Signature Version 4 signing.
//!
//! [`RequestSigner`] is a pure function of its inputs: given the same credentials, request,
//! and instant it produces byte-identical headers. The API client feeds it the current role
//! credentials; the role assumer feeds it the account-level keys for the STS call itself.

pub mod canonical;
pub mod key;

pub use canonical::*;
pub use key::*;

// crates.io
use time::{UtcOffset, macros::format_description};
// self
use crate::{
	_prelude::*,
	auth::AwsCredentials,
	error::SigningError,
	http::{Headers, HttpRequest},
};

/// Signature algorithm label.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
/// Terminator folded into the derived key and credential scope.
pub const SIGNING_SUFFIX: &str = "aws4_request";
/// Service name used by the Selling Partner API gateway.
pub const EXECUTE_API: &str = "execute-api";
/// Authorization header name.
pub const AUTHORIZATION_HEADER: &str = "authorization";
/// Timestamp header name.
pub const DATE_HEADER: &str = "x-amz-date";
/// Session token header name.
pub const SECURITY_TOKEN_HEADER: &str = "x-amz-security-token";
/// Host header name.
pub const HOST_HEADER: &str = "host";

/// Signer bound to one region and service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestSigner {
	region: String,
	service: String,
}
impl RequestSigner {
	/// Creates a signer for `service` in `region`.
	pub fn new(region: impl Into<String>, service: impl Into<String>) -> Self {
		Self { region: region.into(), service: service.into() }
	}

	/// Creates a signer for the Selling Partner API gateway (`execute-api`).
	pub fn execute_api(region: impl Into<String>) -> Self {
		Self::new(region, EXECUTE_API)
	}

	/// Region the signer scopes signatures to.
	pub fn region(&self) -> &str {
		&self.region
	}

	/// Service the signer scopes signatures to.
	pub fn service(&self) -> &str {
		&self.service
	}

	/// Returns `date_stamp/region/service/aws4_request`.
	pub fn credential_scope(&self, date_stamp: &str) -> String {
		format!("{date_stamp}/{}/{}/{SIGNING_SUFFIX}", self.region, self.service)
	}

	/// Signs `request` as of `now` and returns its headers plus the authorization, timestamp,
	/// and (for temporary credentials) session-token headers.
	///
	/// Header names come back lower-cased, with names that differ only in case merged. The
	/// timestamp and session token are placed in the header set before canonicalisation so
	/// the signature covers them. A missing `host` header is derived from the URL.
	pub fn sign_at(
		&self,
		credentials: &AwsCredentials,
		request: &HttpRequest,
		now: OffsetDateTime,
	) -> Result<Headers, SigningError> {
		let timestamp = amz_timestamp(now)?;
		let date_stamp = &timestamp[..8];
		let mut headers = normalize_headers(&request.headers);

		headers.retain(|name, _| {
			![AUTHORIZATION_HEADER, DATE_HEADER, SECURITY_TOKEN_HEADER].contains(&name.as_str())
		});

		if !headers.contains_key(HOST_HEADER) {
			headers.insert(HOST_HEADER.into(), authority(&request.url)?);
		}

		headers.insert(DATE_HEADER.into(), timestamp.clone());

		if let Some(token) = &credentials.session_token {
			headers.insert(SECURITY_TOKEN_HEADER.into(), token.expose().to_owned());
		}

		let canonical = CanonicalRequest::new(request.method, &request.url, &headers, &request.body);
		let scope = self.credential_scope(date_stamp);
		let string_to_sign = format!("{ALGORITHM}\n{timestamp}\n{scope}\n{}", canonical.digest());
		let signing_key = derive_signing_key(
			credentials.secret_access_key.expose(),
			date_stamp,
			&self.region,
			&self.service,
		)?;
		let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

		headers.insert(
			AUTHORIZATION_HEADER.into(),
			format!(
				"{ALGORITHM} Credential={}/{scope}, SignedHeaders={}, Signature={signature}",
				credentials.access_key_id, canonical.signed_headers
			),
		);

		Ok(headers)
	}
}

/// Formats `now` as `YYYYMMDD'T'HHMMSS'Z'` in UTC.
pub fn amz_timestamp(now: OffsetDateTime) -> Result<String, SigningError> {
	Ok(now
		.to_offset(UtcOffset::UTC)
		.format(format_description!("[year][month][day]T[hour][minute][second]Z"))?)
}

/// Returns `host[:port]` for `url`, omitting default ports.
pub fn authority(url: &Url) -> Result<String, SigningError> {
	let host = url.host_str().ok_or_else(|| SigningError::MissingHost { url: url.to_string() })?;

	Ok(match url.port() {
		Some(port) => format!("{host}:{port}"),
		None => host.to_owned(),
	})
}

/// Builds a canonical query string: keys sorted, keys and values RFC 3986 encoded.
pub fn canonical_query<'a, I>(params: I) -> String
where
	I: IntoIterator<Item = (&'a str, &'a str)>,
{
	let mut pairs = params
		.into_iter()
		.map(|(key, value)| {
			(urlencoding::encode(key).into_owned(), urlencoding::encode(value).into_owned())
		})
		.collect::<Vec<_>>();

	pairs.sort();

	pairs.into_iter().map(|(key, value)| format!("{key}={value}")).collect::<Vec<_>>().join("&")
}
