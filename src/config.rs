//! Provider-level configuration and the environment lookups that feed it.

// self
use crate::{_prelude::*, error::ConfigError, retry::RetryPolicy};

/// Variable holding the default service address.
pub const ENV_ADDR: &str = "VAULT_ADDR";
/// Variable overriding the overall retry budget, in seconds.
pub const ENV_TIMEOUT_SECONDS: &str = "APPROLE_BROKER_TIMEOUT_SECONDS";
/// Variable naming a PEM file with extra root certificates.
pub const ENV_CACERT: &str = "VAULT_CACERT";
/// Variable naming a directory of PEM files with extra root certificates.
pub const ENV_CAPATH: &str = "VAULT_CAPATH";
/// Variable disabling certificate verification.
pub const ENV_SKIP_VERIFY: &str = "VAULT_SKIP_VERIFY";

/// Read-only view of environment variables.
pub trait EnvSource
where
	Self: Send + Sync,
{
	/// Returns the variable's value, or `None` when unset.
	fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;
impl EnvSource for ProcessEnv {
	fn var(&self, name: &str) -> Option<String> {
		std::env::var(name).ok()
	}
}

/// In-memory environment for tests and embedding hosts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapEnv(BTreeMap<String, String>);
impl MapEnv {
	/// Adds or replaces a variable.
	pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.0.insert(name.into(), value.into());

		self
	}
}
impl EnvSource for MapEnv {
	fn var(&self, name: &str) -> Option<String> {
		self.0.get(name).cloned()
	}
}

/// Provider-wide settings shared by every data-source read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
	/// Overall retry budget for one read, in seconds.
	pub timeout_seconds: u64,
	/// Address used when a read does not name one.
	pub address: Option<Url>,
}
impl ProviderConfig {
	/// Default retry budget.
	pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;
	/// Largest accepted retry budget (one week).
	pub const MAX_TIMEOUT_SECONDS: u64 = 7 * 24 * 60 * 60;

	/// Builds the configuration from `VAULT_ADDR` and `APPROLE_BROKER_TIMEOUT_SECONDS`.
	pub fn from_env(env: &dyn EnvSource) -> Result<Self> {
		let mut config = Self::default();

		if let Some(raw) = non_blank(env, ENV_TIMEOUT_SECONDS) {
			let seconds = raw
				.trim()
				.parse::<u64>()
				.map_err(|_| ConfigError::InvalidEnv { name: ENV_TIMEOUT_SECONDS, value: raw.clone() })?;

			config.timeout_seconds = seconds;
		}
		if let Some(raw) = non_blank(env, ENV_ADDR) {
			config.address = Some(parse_address(&raw)?);
		}

		config.validate()?;

		Ok(config)
	}

	/// Overrides the retry budget.
	pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
		self.timeout_seconds = seconds;

		self
	}

	/// Overrides the default address.
	pub fn with_address(mut self, address: Url) -> Self {
		self.address = Some(address);

		self
	}

	/// Rejects configurations that can never succeed.
	pub fn validate(&self) -> Result<()> {
		if self.timeout_seconds == 0 {
			return Err(ConfigError::NonPositiveTimeout.into());
		}
		if self.timeout_seconds > Self::MAX_TIMEOUT_SECONDS {
			return Err(ConfigError::TimeoutTooLarge { max: Self::MAX_TIMEOUT_SECONDS }.into());
		}
		if let Some(address) = &self.address {
			ensure_http_scheme(address)?;
		}

		Ok(())
	}

	/// Retry budget as a [`Duration`].
	pub fn timeout(&self) -> Duration {
		Duration::seconds(i64::try_from(self.timeout_seconds).unwrap_or(i64::MAX))
	}

	/// Retry policy derived from the configured budget.
	pub fn retry_policy(&self) -> RetryPolicy {
		RetryPolicy::with_timeout(self.timeout())
	}
}
impl Default for ProviderConfig {
	fn default() -> Self {
		Self { timeout_seconds: Self::DEFAULT_TIMEOUT_SECONDS, address: None }
	}
}

/// Parses a service address, accepting only HTTP(S).
pub fn parse_address(raw: &str) -> Result<Url> {
	let address = Url::parse(raw.trim())
		.map_err(|source| ConfigError::InvalidAddress { address: raw.to_owned(), source })?;

	ensure_http_scheme(&address)?;

	Ok(address)
}

/// Interprets boolean-ish environment values (`1`, `true`, `yes`, `on`, case-insensitive).
pub fn parse_bool(name: &'static str, raw: &str) -> Result<bool> {
	match raw.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "t" | "yes" | "on" => Ok(true),
		"" | "0" | "false" | "f" | "no" | "off" => Ok(false),
		_ => Err(ConfigError::InvalidEnv { name, value: raw.to_owned() }.into()),
	}
}

pub(crate) fn non_blank(env: &dyn EnvSource, name: &str) -> Option<String> {
	env.var(name).filter(|value| !value.trim().is_empty())
}

fn ensure_http_scheme(address: &Url) -> Result<()> {
	match address.scheme() {
		"http" | "https" => Ok(()),
		_ => Err(ConfigError::UnsupportedScheme { address: address.to_string() }.into()),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_apply_without_env() {
		let config =
			ProviderConfig::from_env(&MapEnv::default()).expect("Empty env should be valid.");

		assert_eq!(config, ProviderConfig::default());
		assert_eq!(config.timeout(), Duration::seconds(60));
		assert_eq!(config.retry_policy().initial_wait, Duration::seconds(1));
	}

	#[test]
	fn env_overrides_address_and_timeout() {
		let env = MapEnv::default()
			.with(ENV_ADDR, "https://vault.example.com:8200")
			.with(ENV_TIMEOUT_SECONDS, " 5 ");
		let config = ProviderConfig::from_env(&env).expect("Env values should parse.");

		assert_eq!(config.timeout_seconds, 5);
		assert_eq!(
			config.address.as_ref().map(Url::as_str),
			Some("https://vault.example.com:8200/")
		);
	}

	#[test]
	fn invalid_env_values_are_config_errors() {
		let bad_timeout = MapEnv::default().with(ENV_TIMEOUT_SECONDS, "soon");
		let zero_timeout = MapEnv::default().with(ENV_TIMEOUT_SECONDS, "0");
		let bad_scheme = MapEnv::default().with(ENV_ADDR, "ftp://vault");
		let huge_timeout = MapEnv::default().with(ENV_TIMEOUT_SECONDS, "1000000000000");

		assert!(matches!(
			ProviderConfig::from_env(&bad_timeout),
			Err(Error::Config(ConfigError::InvalidEnv { name: ENV_TIMEOUT_SECONDS, .. }))
		));
		assert!(matches!(
			ProviderConfig::from_env(&zero_timeout),
			Err(Error::Config(ConfigError::NonPositiveTimeout))
		));
		assert!(matches!(
			ProviderConfig::from_env(&bad_scheme),
			Err(Error::Config(ConfigError::UnsupportedScheme { .. }))
		));
		assert!(matches!(
			ProviderConfig::from_env(&huge_timeout),
			Err(Error::Config(ConfigError::TimeoutTooLarge { .. }))
		));
		assert!(
			ProviderConfig::default()
				.with_timeout_seconds(ProviderConfig::MAX_TIMEOUT_SECONDS)
				.validate()
				.is_ok()
		);
	}

	#[test]
	fn provider_block_deserializes_with_defaults() {
		let config: ProviderConfig = serde_json::from_str(r#"{"address":"http://127.0.0.1:8200"}"#)
			.expect("Provider block should deserialize.");

		assert_eq!(config.timeout_seconds, ProviderConfig::DEFAULT_TIMEOUT_SECONDS);
		assert!(config.address.is_some());
	}

	#[test]
	fn booleans_accept_common_spellings() {
		assert!(parse_bool(ENV_SKIP_VERIFY, "TRUE").expect("TRUE should parse."));
		assert!(!parse_bool(ENV_SKIP_VERIFY, "0").expect("0 should parse."));
		assert!(parse_bool(ENV_SKIP_VERIFY, "maybe").is_err());
	}
}
