//! Role/secret login request built once per attempt.

// self
use crate::{
	_prelude::*,
	auth::{BackendPath, Sensitive},
	error::ConfigError,
};

#[derive(Serialize)]
struct LoginBody<'a> {
	role_id: &'a str,
	secret_id: &'a str,
}

/// Immutable AppRole login request.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginRequest {
	/// Role identifier of the AppRole.
	pub role_id: String,
	/// Secret identifier issued for the role; never logged.
	pub secret_id: Sensitive,
	/// Authentication mount that receives the login.
	pub backend: BackendPath,
}
impl LoginRequest {
	/// Creates a request against the default `ptfe` mount.
	pub fn new(role_id: impl Into<String>, secret_id: impl Into<Sensitive>) -> Self {
		Self { role_id: role_id.into(), secret_id: secret_id.into(), backend: BackendPath::default() }
	}

	/// Routes the login to a different authentication mount.
	pub fn with_backend(mut self, backend: BackendPath) -> Self {
		self.backend = backend;

		self
	}

	/// Serializes the `{role_id, secret_id}` JSON body.
	pub fn body(&self) -> Result<Vec<u8>> {
		let body = LoginBody { role_id: &self.role_id, secret_id: self.secret_id.expose() };

		serde_json::to_vec(&body).map_err(|e| ConfigError::from(e).into())
	}

	/// Resolves `<address>/v1/auth/<backend>/login`, keeping any path prefix on the address.
	pub fn endpoint(&self, address: &Url) -> Result<Url> {
		let raw = format!("{}/v1/auth/{}/login", address.as_str().trim_end_matches('/'), self.backend);

		Url::parse(&raw)
			.map_err(|source| ConfigError::InvalidAddress { address: address.to_string(), source })
			.map_err(Error::from)
	}
}
impl Debug for LoginRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginRequest")
			.field("role_id", &self.role_id)
			.field("secret_id", &"<redacted>")
			.field("backend", &self.backend)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse test address.")
	}

	#[test]
	fn body_carries_only_role_and_secret() {
		let request = LoginRequest::new("r1", "s1");
		let body = request.body().expect("Login body should serialize.");
		let value: serde_json::Value =
			serde_json::from_slice(&body).expect("Login body should be valid JSON.");

		assert_eq!(value, serde_json::json!({ "role_id": "r1", "secret_id": "s1" }));
	}

	#[test]
	fn endpoint_respects_backend_and_prefix() {
		let request = LoginRequest::new("r1", "s1");

		assert_eq!(
			request.endpoint(&url("https://vault.example.com:8200")).expect("Endpoint should build.").as_str(),
			"https://vault.example.com:8200/v1/auth/ptfe/login"
		);

		let request = request.with_backend(
			BackendPath::new("approle").expect("Backend fixture should be valid."),
		);

		assert_eq!(
			request.endpoint(&url("https://proxy.example.com/vault/")).expect("Endpoint should build.").as_str(),
			"https://proxy.example.com/vault/v1/auth/approle/login"
		);
	}

	#[test]
	fn debug_redacts_secret_id() {
		let rendered = format!("{:?}", LoginRequest::new("r1", "very-secret"));

		assert!(rendered.contains("r1"));
		assert!(!rendered.contains("very-secret"));
	}
}
