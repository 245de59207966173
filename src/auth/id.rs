//! Strongly typed identifiers for authentication mounts and service-assigned request ids.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal, $extra:path) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;
				$extra($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;
				$extra($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (backend, request).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (backend, request).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (backend, request).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
	/// The identifier starts or ends with a path separator.
	#[error("{kind} identifier cannot start or end with `/`.")]
	DanglingSeparator {
		/// Kind of identifier (backend, request).
		kind: &'static str,
	},
}

def_id! { BackendPath, "Authentication mount the login is routed to (`/v1/auth/<mount>/login`).", "Backend", validate_mount }
def_id! { RequestId, "Request identifier assigned by the secret-management service.", "Request", validate_nothing }

impl BackendPath {
	/// Mount used when the caller does not choose one.
	pub const DEFAULT: &'static str = "ptfe";
}
impl Default for BackendPath {
	fn default() -> Self {
		Self(Self::DEFAULT.to_owned())
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

fn validate_mount(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.starts_with('/') || view.ends_with('/') {
		return Err(IdentifierError::DanglingSeparator { kind });
	}

	Ok(())
}

fn validate_nothing(_kind: &'static str, _view: &str) -> Result<(), IdentifierError> {
	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn backends_validate_and_default() {
		assert_eq!(BackendPath::default().as_ref(), "ptfe");
		assert!(BackendPath::new("approle").is_ok());
		assert!(BackendPath::new("team/approle").is_ok(), "Nested mounts are allowed.");
		assert!(matches!(
			BackendPath::new("/approle"),
			Err(IdentifierError::DanglingSeparator { kind: "Backend" })
		));
		assert!(BackendPath::new("approle/").is_err());
		assert!(BackendPath::new("").is_err());
		assert!(BackendPath::new("app role").is_err());
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let request: RequestId = serde_json::from_str("\"abc123\"")
			.expect("Request identifier should deserialize successfully.");

		assert_eq!(request.as_ref(), "abc123");
		assert!(serde_json::from_str::<RequestId>("\"\"").is_err());
		assert!(serde_json::from_str::<BackendPath>("\"/ptfe\"").is_err());
	}

	#[test]
	fn length_limits_apply() {
		let exact = "a".repeat(IDENTIFIER_MAX_LEN);

		RequestId::new(&exact).expect("Exact length should succeed.");

		let too_long = "a".repeat(IDENTIFIER_MAX_LEN + 1);

		assert!(matches!(
			RequestId::new(&too_long),
			Err(IdentifierError::TooLong { kind: "Request", max: IDENTIFIER_MAX_LEN })
		));
	}
}
