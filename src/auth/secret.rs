//! Credential strings that never print.

// self
use crate::_prelude::*;

/// Credential material such as refresh tokens and AWS keys.
///
/// `Debug` and `Display` both print `<redacted>`; only [`Secret::expose`] yields the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret(String);
impl Secret {
	/// Wraps `value`.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Plain value, for building request bodies and signatures.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// `true` for an empty or all-whitespace value, which configuration treats as missing.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}
}
impl AsRef<str> for Secret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl From<&str> for Secret {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<String> for Secret {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Secret").field(&"<redacted>").finish()
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn formatting_never_reveals_the_value() {
		let secret = Secret::from("wJalrXUtnFEMI");

		assert_eq!(format!("{secret:?}"), "Secret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(secret.expose(), "wJalrXUtnFEMI");
		assert_eq!(Secret::from(String::from("wJalrXUtnFEMI")), secret);
	}

	#[test]
	fn blank_detection_ignores_whitespace() {
		assert!(Secret::new("  ").is_blank());
		assert!(!Secret::new("x").is_blank());
	}
}
