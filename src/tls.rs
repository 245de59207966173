//! Trust material resolution: turns CA file/directory settings into a [`TrustConfig`].
//!
//! Loading happens once per read, before any login attempt, and the resulting value is passed
//! to the transport explicitly. Nothing here touches shared transport state.

// std
use std::{
	fs,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	config::{self, EnvSource},
	error::ConfigError,
	http::TrustConfig,
};

const PEM_MARKER: &[u8] = b"-----BEGIN CERTIFICATE-----";

/// Where to find extra root certificates and whether to verify at all.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustSource {
	/// PEM file; relative to `ca_cert_dir` when both are set.
	pub ca_cert_file: Option<PathBuf>,
	/// Directory whose regular files are all PEM bundles.
	pub ca_cert_dir: Option<PathBuf>,
	/// Disables certificate and hostname verification; unset defers to `VAULT_SKIP_VERIFY`.
	#[serde(alias = "skip_tls_verify")]
	pub skip_verify: Option<bool>,
}
impl TrustSource {
	/// Sets the CA file.
	pub fn with_ca_cert_file(mut self, path: impl Into<PathBuf>) -> Self {
		self.ca_cert_file = Some(path.into());

		self
	}

	/// Sets the CA directory.
	pub fn with_ca_cert_dir(mut self, path: impl Into<PathBuf>) -> Self {
		self.ca_cert_dir = Some(path.into());

		self
	}

	/// Overrides the skip-verification flag.
	pub fn with_skip_verify(mut self, skip_verify: bool) -> Self {
		self.skip_verify = Some(skip_verify);

		self
	}

	/// Fills unset fields from `VAULT_CACERT`, `VAULT_CAPATH`, and `VAULT_SKIP_VERIFY`.
	pub fn with_env_defaults(mut self, env: &dyn EnvSource) -> Result<Self> {
		if self.ca_cert_file.is_none() {
			self.ca_cert_file = config::non_blank(env, config::ENV_CACERT).map(PathBuf::from);
		}
		if self.ca_cert_dir.is_none() {
			self.ca_cert_dir = config::non_blank(env, config::ENV_CAPATH).map(PathBuf::from);
		}
		if let (None, Some(raw)) = (self.skip_verify, env.var(config::ENV_SKIP_VERIFY)) {
			self.skip_verify = Some(config::parse_bool(config::ENV_SKIP_VERIFY, &raw)?);
		}

		Ok(self)
	}

	/// Reads the configured PEM material and builds the per-call trust settings.
	pub fn load(&self) -> Result<TrustConfig> {
		let trust = TrustConfig::system().with_skip_verify(self.skip_verify.unwrap_or(false));
		let pem = match (&self.ca_cert_dir, &self.ca_cert_file) {
			(None, None) => return Ok(trust),
			(Some(dir), Some(file)) => read_file(&dir.join(file))?,
			(None, Some(file)) => read_file(file)?,
			(Some(dir), None) => read_dir(dir)?,
		};

		if !contains_marker(&pem) {
			return Err(ConfigError::InvalidTrustBundle {
				reason: "no PEM certificate blocks found".into(),
			}
			.into());
		}

		Ok(trust.with_root_ca_pem(pem))
	}
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
	fs::read(path).map_err(|source| trust_error(path, source))
}

fn read_dir(dir: &Path) -> Result<Vec<u8>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir).map_err(|source| trust_error(dir, source))? {
		let entry = entry.map_err(|source| trust_error(dir, source))?;
		let path = entry.path();

		if path.is_file() {
			files.push(path);
		}
	}

	files.sort();

	let mut bundle = Vec::new();

	for path in files {
		let mut pem = read_file(&path)?;

		if !pem.ends_with(b"\n") {
			pem.push(b'\n');
		}

		bundle.extend_from_slice(&pem);
	}

	Ok(bundle)
}

fn contains_marker(pem: &[u8]) -> bool {
	pem.windows(PEM_MARKER.len()).any(|window| window == PEM_MARKER)
}

fn trust_error(path: &Path, source: std::io::Error) -> Error {
	ConfigError::TrustMaterial { path: path.to_path_buf(), source }.into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::config::MapEnv;

	const CERT_A: &str = "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----";
	const CERT_B: &str = "-----BEGIN CERTIFICATE-----\nBBBB\n-----END CERTIFICATE-----\n";

	fn scratch_dir(name: &str) -> PathBuf {
		let dir = std::env::temp_dir()
			.join(format!("approle-broker-tls-{name}-{}", std::process::id()));
		let _ = fs::remove_dir_all(&dir);

		fs::create_dir_all(&dir).expect("Failed to create scratch directory.");

		dir
	}

	#[test]
	fn no_material_keeps_system_roots() {
		let trust = TrustSource::default().with_skip_verify(true).load().expect("Nothing to read.");

		assert_eq!(trust, TrustConfig::system().with_skip_verify(true));
	}

	#[test]
	fn directory_bundles_concatenate_in_sorted_order() {
		let dir = scratch_dir("dir");

		fs::write(dir.join("b.pem"), CERT_B).expect("Failed to write b.pem.");
		fs::write(dir.join("a.pem"), CERT_A).expect("Failed to write a.pem.");
		fs::create_dir(dir.join("nested")).expect("Failed to create nested dir.");

		let trust =
			TrustSource::default().with_ca_cert_dir(&dir).load().expect("Directory should load.");
		let pem = String::from_utf8(trust.root_ca_pem.expect("Bundle should be present."))
			.expect("Bundle should be UTF-8.");

		assert_eq!(pem, format!("{CERT_A}\n{CERT_B}"));

		let joined = TrustSource::default()
			.with_ca_cert_dir(&dir)
			.with_ca_cert_file("b.pem")
			.load()
			.expect("Directory-relative file should load.");

		assert_eq!(joined.root_ca_pem.as_deref(), Some(CERT_B.as_bytes()));

		let _ = fs::remove_dir_all(&dir);
	}

	#[test]
	fn unreadable_or_empty_material_is_a_config_error() {
		let missing = TrustSource::default()
			.with_ca_cert_file("/nonexistent/approle-broker/ca.pem")
			.load()
			.expect_err("Missing files must fail.");

		assert!(matches!(missing, Error::Config(ConfigError::TrustMaterial { .. })));

		let dir = scratch_dir("garbage");
		let file = dir.join("garbage.pem");

		fs::write(&file, "not a certificate").expect("Failed to write garbage.pem.");

		let garbage = TrustSource::default()
			.with_ca_cert_file(&file)
			.load()
			.expect_err("Files without PEM blocks must fail.");

		assert!(matches!(garbage, Error::Config(ConfigError::InvalidTrustBundle { .. })));

		let _ = fs::remove_dir_all(&dir);
	}

	#[test]
	fn env_fills_only_unset_fields() {
		let env = MapEnv::default()
			.with(config::ENV_CACERT, "/etc/vault/ca.pem")
			.with(config::ENV_CAPATH, "/etc/vault/certs")
			.with(config::ENV_SKIP_VERIFY, "true");
		let source = TrustSource::default()
			.with_ca_cert_file("/opt/ca.pem")
			.with_env_defaults(&env)
			.expect("Env values should parse.");

		assert_eq!(source.ca_cert_file, Some(PathBuf::from("/opt/ca.pem")));
		assert_eq!(source.ca_cert_dir, Some(PathBuf::from("/etc/vault/certs")));
		assert_eq!(source.skip_verify, Some(true));

		let bad = MapEnv::default().with(config::ENV_SKIP_VERIFY, "sometimes");

		assert!(TrustSource::default().with_env_defaults(&bad).is_err());
	}

	#[test]
	fn explicit_verification_wins_over_env() {
		let env = MapEnv::default().with(config::ENV_SKIP_VERIFY, "true");
		let source: TrustSource = serde_json::from_str(r#"{"skip_verify":false}"#)
			.expect("Trust block should deserialize.");
		let trust = source
			.with_env_defaults(&env)
			.expect("Env values should parse.")
			.load()
			.expect("Nothing to read.");

		assert!(!trust.skip_verify);

		let legacy: TrustSource = serde_json::from_str(r#"{"skip_tls_verify":true}"#)
			.expect("Legacy attribute name should deserialize.");

		assert_eq!(legacy.skip_verify, Some(true));
		assert!(!TrustSource::default().load().expect("Nothing to read.").skip_verify);
	}
}
