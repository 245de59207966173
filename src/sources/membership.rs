//! Membership data sources: ordered inputs flattened into single-key entries.

// crates.io
use serde_json::{Value, json};
// self
use crate::{_prelude::*, identity::StableIdentity, obs::OperationKind};

/// Which membership list is being read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MembershipKind {
	/// Load-balancer backend instance groups.
	Backend,
	/// DNS forwarding target addresses.
	ForwardingConfig,
}
impl MembershipKind {
	/// Key of every single-entry mapping in the output list.
	pub const fn entry_key(self) -> &'static str {
		match self {
			Self::Backend => "group",
			Self::ForwardingConfig => "ipv4_address",
		}
	}

	/// Name of the input list attribute.
	pub const fn input_field(self) -> &'static str {
		match self {
			Self::Backend => "instance_groups",
			Self::ForwardingConfig => "ipv4_addresses",
		}
	}

	/// Name of the computed output list attribute.
	pub const fn output_field(self) -> &'static str {
		match self {
			Self::Backend => "backends",
			Self::ForwardingConfig => "target_name_servers",
		}
	}

	/// Observability label for reads of this kind.
	pub const fn operation(self) -> OperationKind {
		match self {
			Self::Backend => OperationKind::GoogleBackend,
			Self::ForwardingConfig => OperationKind::GoogleForwardingConfig,
		}
	}
}

/// Result of a membership read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRecord {
	/// Which list was read.
	pub kind: MembershipKind,
	/// SHA-256 of the `,`-joined inputs, in input order.
	pub id: StableIdentity,
	/// One `{entry_key: value}` mapping per input, in input order.
	pub entries: Vec<BTreeMap<String, String>>,
}
impl MembershipRecord {
	/// Values in input order.
	pub fn values(&self) -> impl Iterator<Item = &str> {
		let key = self.kind.entry_key();

		self.entries.iter().filter_map(move |entry| entry.get(key).map(String::as_str))
	}

	/// Renders `{"id": .., "<output_field>": [..]}` for the host's read model.
	pub fn to_host_json(&self) -> Value {
		json!({
			"id": self.id.as_str(),
			(self.kind.output_field()): &self.entries,
		})
	}
}

/// Flattens `items` into a [`MembershipRecord`]; never fails and accepts an empty list.
pub fn read_membership<S>(kind: MembershipKind, items: &[S]) -> MembershipRecord
where
	S: AsRef<str>,
{
	let key = kind.entry_key();
	let entries = items
		.iter()
		.map(|item| BTreeMap::from([(key.to_owned(), item.as_ref().to_owned())]))
		.collect();

	MembershipRecord { kind, id: StableIdentity::from_parts(items), entries }
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn backends_keep_input_order() {
		let record = read_membership(MembershipKind::Backend, &["g1", "g2"]);

		assert_eq!(
			record.id.as_str(),
			"2d5e0a32b4fa752f49698f6337bb25dd8a8afd769ec7ba177b09f6f97313c238"
		);
		assert_eq!(record.values().collect::<Vec<_>>(), ["g1", "g2"]);
		assert_eq!(
			record.to_host_json(),
			json!({
				"id": "2d5e0a32b4fa752f49698f6337bb25dd8a8afd769ec7ba177b09f6f97313c238",
				"backends": [{ "group": "g1" }, { "group": "g2" }],
			})
		);
	}

	#[test]
	fn forwarding_targets_use_address_key() {
		let record =
			read_membership(MembershipKind::ForwardingConfig, &["10.0.0.1", "10.0.0.2"]);

		assert_eq!(
			record.id.as_str(),
			"186e4ccebfa49a0fcb33ef6b180cba0b87793e6315fad20a431b59d6f14ad8f9"
		);
		assert_eq!(record.entries[1].get("ipv4_address").map(String::as_str), Some("10.0.0.2"));
		assert!(record.to_host_json().get("target_name_servers").is_some());
	}

	#[test]
	fn empty_lists_are_allowed() {
		let record = read_membership::<&str>(MembershipKind::Backend, &[]);

		assert!(record.entries.is_empty());
		assert_eq!(
			record.id.as_str(),
			"e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
		);
	}
}
