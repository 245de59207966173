//! Content-addressed identities for data sources whose remote system supplies no identifier.
//!
//! Inputs are joined with `,` in the order given and hashed with SHA-256; the hex digest is
//! the identity. No case or whitespace normalization happens, and the join is order
//! sensitive, so callers that want identity stability independent of source ordering must
//! present their inputs in a canonical order first.

// crates.io
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::RequestId};

/// Separator placed between inputs before hashing.
pub const SEPARATOR: &str = ",";

/// Stable identity of a data-source read.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StableIdentity(String);
impl StableIdentity {
	/// Hashes the ordered inputs into a 64-character lowercase hex digest.
	pub fn from_parts<I, S>(parts: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut hasher = Sha256::new();

		for (idx, part) in parts.into_iter().enumerate() {
			if idx > 0 {
				hasher.update(SEPARATOR.as_bytes());
			}

			hasher.update(part.as_ref().as_bytes());
		}

		Self(hex::encode(hasher.finalize()))
	}

	/// Reuses the identifier the service assigned to a login verbatim.
	pub fn from_request_id(request_id: &RequestId) -> Self {
		Self(request_id.to_string())
	}

	/// Returns the identity as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for StableIdentity {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<StableIdentity> for String {
	fn from(value: StableIdentity) -> Self {
		value.0
	}
}
impl Debug for StableIdentity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "StableIdentity({})", self.0)
	}
}
impl Display for StableIdentity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Hex SHA-256 digest of the `,`-joined inputs.
pub fn hash<I, S>(parts: I) -> String
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	StableIdentity::from_parts(parts).into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identical_inputs_hash_identically() {
		assert_eq!(hash(["a", "b"]), hash(["a", "b"]));
		assert_eq!(hash(["a", "b"]), "1eb7c54d52831bbfe8942af0b1c56b7409523a59ed6ca99c1174fef7eb32c1b5");
		assert_eq!(hash(["a", "b"]).len(), 64);
	}

	#[test]
	fn order_and_case_change_the_identity() {
		assert_ne!(hash(["a", "b"]), hash(["b", "a"]));
		assert_ne!(hash(["g1", "g2"]), hash(["G1", "g2"]));
		assert_ne!(hash(["g1"]), hash([" g1"]));
	}

	#[test]
	fn streaming_matches_joined_string() {
		assert_eq!(hash(["g1", "g2"]), hash(["g1,g2"]));
		assert_eq!(
			hash(Vec::<String>::new()),
			"e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
		);
	}

	#[test]
	fn request_ids_pass_through_verbatim() {
		let request_id = RequestId::new("abc123").expect("Request identifier should be valid.");

		assert_eq!(StableIdentity::from_request_id(&request_id).as_str(), "abc123");
	}
}
