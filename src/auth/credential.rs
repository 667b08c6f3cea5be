//! Long-lived application/account credentials and short-lived role credentials.

// self
use crate::{_prelude::*, auth::Secret, cache::Expiring};

/// Login with Amazon client triple used only to mint bearer tokens.
#[derive(Clone, Serialize, Deserialize)]
pub struct RefreshCredential {
	/// LWA application client identifier.
	pub client_id: String,
	/// LWA application client secret.
	pub client_secret: Secret,
	/// Long-lived refresh token issued when the seller authorised the application.
	pub refresh_token: Secret,
}
impl Debug for RefreshCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshCredential")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.finish()
	}
}

/// AWS key material accepted by the Signature V4 signer.
///
/// Account-level keys carry no session token; role credentials always do.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsCredentials {
	/// Access key identifier (appears in the signature scope).
	pub access_key_id: String,
	/// Secret access key used to derive signing keys.
	pub secret_access_key: Secret,
	/// Session token for temporary credentials.
	pub session_token: Option<Secret>,
}
impl AwsCredentials {
	/// Creates long-lived credentials without a session token.
	pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<Secret>) -> Self {
		Self {
			access_key_id: access_key_id.into(),
			secret_access_key: secret_access_key.into(),
			session_token: None,
		}
	}

	/// Attaches a session token.
	pub fn with_session_token(mut self, token: impl Into<Secret>) -> Self {
		self.session_token = Some(token.into());

		self
	}
}
impl Debug for AwsCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AwsCredentials")
			.field("access_key_id", &self.access_key_id)
			.field("secret_access_key", &"<redacted>")
			.field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

/// Scoped credentials returned by STS role assumption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporaryCredential {
	/// Key material used for signing.
	pub credentials: AwsCredentials,
	/// Instant after which the credentials must not be reused (safety margin already applied).
	pub expires_at: OffsetDateTime,
}
impl TemporaryCredential {
	/// Builds credentials from the STS expiration instant, subtracting `safety_margin`.
	pub fn from_expiration(
		credentials: AwsCredentials,
		expiration: OffsetDateTime,
		safety_margin: Duration,
	) -> Self {
		Self { credentials, expires_at: expiration - safety_margin }
	}
}
impl Expiring for TemporaryCredential {
	fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}
}
