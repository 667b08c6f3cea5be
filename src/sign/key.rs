//! Layered HMAC-SHA256 signing-key derivation.

// crates.io
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::{error::SigningError, sign::SIGNING_SUFFIX};

type HmacSha256 = Hmac<Sha256>;

const KEY_PREFIX: &str = "AWS4";

/// Derived 32-byte signing key scoped to one date, region, and service.
pub type SigningKey = [u8; 32];

/// Derives the signing key for `date_stamp` (`YYYYMMDD`), `region`, and `service`.
///
/// The chain seeds HMAC with `AWS4` + secret and folds in the date, region, service, and the
/// `aws4_request` terminator; each stage's output keys the next.
pub fn derive_signing_key(
	secret_access_key: &str,
	date_stamp: &str,
	region: &str,
	service: &str,
) -> Result<SigningKey, SigningError> {
	let seed = format!("{KEY_PREFIX}{secret_access_key}");
	let k_date = hmac_sha256(seed.as_bytes(), date_stamp.as_bytes())?;
	let k_region = hmac_sha256(&k_date, region.as_bytes())?;
	let k_service = hmac_sha256(&k_region, service.as_bytes())?;

	hmac_sha256(&k_service, SIGNING_SUFFIX.as_bytes())
}

/// Computes HMAC-SHA256 of `data` under `key`.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<[u8; 32], SigningError> {
	let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SigningError::InvalidKey)?;

	mac.update(data);

	let mut out = [0; 32];

	out.copy_from_slice(&mac.finalize().into_bytes());

	Ok(out)
}
