//! Token data source: validated login inputs and the record a successful login produces.

// self
use crate::{
	_prelude::*,
	auth::{BackendPath, Credential, LoginRequest, Sensitive},
	config::{self, EnvSource, ProviderConfig},
	error::ConfigError,
	http::TrustConfig,
	identity::StableIdentity,
	tls::TrustSource,
};

/// Declared inputs of the token data source.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultTokenInput {
	/// Service address; falls back to the provider address, then `VAULT_ADDR`.
	#[serde(default)]
	pub address: Option<String>,
	/// AppRole role identifier.
	pub role_id: String,
	/// AppRole secret identifier.
	pub secret_id: Sensitive,
	/// Authentication mount.
	#[serde(default)]
	pub backend: BackendPath,
	/// Logs the redacted login payload of every attempt.
	#[serde(default)]
	pub debug: bool,
	/// Extra trust material and verification toggle.
	#[serde(flatten)]
	pub trust: TrustSource,
}
impl VaultTokenInput {
	/// Creates inputs for the given role/secret pair with every optional field unset.
	pub fn new(role_id: impl Into<String>, secret_id: impl Into<Sensitive>) -> Self {
		Self {
			address: None,
			role_id: role_id.into(),
			secret_id: secret_id.into(),
			backend: BackendPath::default(),
			debug: false,
			trust: TrustSource::default(),
		}
	}

	/// Sets the service address.
	pub fn with_address(mut self, address: impl Into<String>) -> Self {
		self.address = Some(address.into());

		self
	}

	/// Routes the login to a different authentication mount.
	pub fn with_backend(mut self, backend: BackendPath) -> Self {
		self.backend = backend;

		self
	}

	/// Toggles payload logging.
	pub fn with_debug(mut self, debug: bool) -> Self {
		self.debug = debug;

		self
	}

	/// Replaces the trust settings.
	pub fn with_trust(mut self, trust: TrustSource) -> Self {
		self.trust = trust;

		self
	}

	/// Ensures the role and secret identifiers are present.
	pub fn validate(&self) -> Result<()> {
		if self.role_id.trim().is_empty() {
			return Err(ConfigError::MissingInput { field: "role_id" }.into());
		}
		if self.secret_id.is_blank() {
			return Err(ConfigError::MissingInput { field: "secret_id" }.into());
		}

		Ok(())
	}

	/// Validates the inputs and resolves address and trust material for one read.
	pub fn resolve(
		&self,
		provider: &ProviderConfig,
		env: &dyn EnvSource,
	) -> Result<ResolvedVaultToken> {
		self.validate()?;

		let address = match self.address.as_deref().filter(|address| !address.trim().is_empty()) {
			Some(raw) => config::parse_address(raw)?,
			None => match (&provider.address, config::non_blank(env, config::ENV_ADDR)) {
				(Some(address), _) => address.clone(),
				(None, Some(raw)) => config::parse_address(&raw)?,
				(None, None) => return Err(ConfigError::MissingInput { field: "address" }.into()),
			},
		};
		let trust = self.trust.clone().with_env_defaults(env)?.load()?;
		let request = LoginRequest::new(self.role_id.clone(), self.secret_id.clone())
			.with_backend(self.backend.clone());

		Ok(ResolvedVaultToken { request, address, trust, debug: self.debug })
	}
}
impl Debug for VaultTokenInput {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("VaultTokenInput")
			.field("address", &self.address)
			.field("role_id", &self.role_id)
			.field("secret_id", &self.secret_id)
			.field("backend", &self.backend)
			.field("debug", &self.debug)
			.field("trust", &self.trust)
			.finish()
	}
}

/// Everything one token read needs, resolved before the first attempt.
#[derive(Clone, Debug)]
pub struct ResolvedVaultToken {
	/// Login request reused by every attempt.
	pub request: LoginRequest,
	/// Service address.
	pub address: Url,
	/// Trust settings passed to the transport.
	pub trust: TrustConfig,
	/// Payload logging toggle.
	pub debug: bool,
}

/// Record produced by a successful token read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultTokenRecord {
	/// The service's `request_id`, verbatim.
	pub id: StableIdentity,
	/// Raw login response body.
	pub data_json: Sensitive,
	/// Issued client token.
	pub token: Sensitive,
	/// Lease window in seconds.
	pub lease_duration: i64,
	/// Whether the lease can be renewed.
	pub renewable: bool,
	/// Acquisition instant in RFC 3339.
	pub lease_start_time: String,
}
impl VaultTokenRecord {
	/// Copies every field out of a credential at once.
	pub fn from_credential(credential: &Credential) -> Self {
		Self {
			id: StableIdentity::from_request_id(&credential.request_id),
			data_json: credential.raw_json.clone(),
			token: credential.token.clone(),
			lease_duration: credential.lease_duration.whole_seconds(),
			renewable: credential.renewable,
			lease_start_time: credential.lease_start_time(),
		}
	}
}
impl From<Credential> for VaultTokenRecord {
	fn from(credential: Credential) -> Self {
		Self::from_credential(&credential)
	}
}
