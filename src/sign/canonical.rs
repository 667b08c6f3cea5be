//! Canonical request construction.

// crates.io
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	http::{Headers, Method},
};

/// Deterministic normalised form of a request used as signing input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalRequest {
	/// Newline-terminated `name:value` block, sorted by lower-cased name.
	pub canonical_headers: String,
	/// Lower-cased header names joined by `;` in canonical order.
	pub signed_headers: String,
	/// Hex SHA-256 of the payload.
	pub payload_hash: String,
	/// Full canonical request text.
	pub text: String,
}
impl CanonicalRequest {
	/// Canonicalises `method`, `url`, `headers`, and `payload`.
	///
	/// The path defaults to `/` and the query is taken verbatim from the URL, so callers must
	/// build URLs whose query is already sorted and encoded.
	pub fn new(method: Method, url: &Url, headers: &Headers, payload: &[u8]) -> Self {
		let path = match url.path() {
			"" => "/",
			path => path,
		};
		let query = url.query().unwrap_or_default();
		let normalized = normalize_headers(headers);
		let mut canonical_headers = String::new();

		for (name, value) in &normalized {
			canonical_headers.push_str(name);
			canonical_headers.push(':');
			canonical_headers.push_str(value);
			canonical_headers.push('\n');
		}

		let signed_headers = normalized.keys().map(String::as_str).collect::<Vec<_>>().join(";");
		let payload_hash = hex::encode(Sha256::digest(payload));
		let text = format!(
			"{method}\n{path}\n{query}\n{canonical_headers}\n{signed_headers}\n{payload_hash}"
		);

		Self { canonical_headers, signed_headers, payload_hash, text }
	}

	/// Returns hex SHA-256 of the canonical request text.
	pub fn digest(&self) -> String {
		hex::encode(Sha256::digest(self.text.as_bytes()))
	}
}

/// Lower-cases header names and trims values. Names that differ only in case collapse into
/// one entry; distinct values are joined with `,` in map order.
pub fn normalize_headers(headers: &Headers) -> Headers {
	let mut normalized = Headers::new();

	for (name, value) in headers {
		let value = value.trim();

		normalized
			.entry(name.to_ascii_lowercase())
			.and_modify(|merged: &mut String| {
				if !merged.split(',').any(|seen| seen == value) {
					merged.push(',');
					merged.push_str(value);
				}
			})
			.or_insert_with(|| value.to_owned());
	}

	normalized
}
