//! Redacting wrapper for secret ids, issued tokens, and raw login bodies.

// self
use crate::_prelude::*;

/// Redacted string wrapper keeping sensitive material out of logs.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sensitive(String);
impl Sensitive {
	/// Wraps a new sensitive string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` if the wrapped value is empty or whitespace only.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}
}
impl AsRef<str> for Sensitive {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl From<String> for Sensitive {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl From<&str> for Sensitive {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl Debug for Sensitive {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Sensitive").field(&"<redacted>").finish()
	}
}
impl Display for Sensitive {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn sensitive_formatters_redact() {
		let secret = Sensitive::new("super-secret");

		assert_eq!(format!("{secret:?}"), "Sensitive(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(secret.expose(), "super-secret");
	}

	#[test]
	fn blank_detection_ignores_padding() {
		assert!(Sensitive::new("  ").is_blank());
		assert!(Sensitive::default().is_blank());
		assert!(!Sensitive::new(" s1 ").is_blank());
	}
}
