//! Short-lived Login with Amazon bearer tokens.

// self
use crate::{_prelude::*, auth::Secret, cache::Expiring};

/// Bearer token minted by Login with Amazon.
///
/// Records are immutable: a refresh replaces the whole value, so the token string and its
/// expiry always originate from the same exchange.
#[derive(Clone, Serialize, Deserialize)]
pub struct BearerToken {
	/// Access token value sent as `x-amz-access-token`.
	pub value: Secret,
	/// Instant the exchange completed.
	pub issued_at: OffsetDateTime,
	/// Instant after which the token must not be reused (safety margin already applied).
	pub expires_at: OffsetDateTime,
}
impl BearerToken {
	/// Builds a token from an `expires_in` lifetime, subtracting `safety_margin`.
	pub fn from_lifetime(
		value: impl Into<Secret>,
		issued_at: OffsetDateTime,
		expires_in: Duration,
		safety_margin: Duration,
	) -> Self {
		Self { value: value.into(), issued_at, expires_at: issued_at + expires_in - safety_margin }
	}
}
impl Expiring for BearerToken {
	fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}
}
impl Debug for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BearerToken")
			.field("value", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
