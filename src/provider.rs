//! Provider facade binding data-source reads to the login client and retry scheduler.
//!
//! A [`Provider`] owns the configuration and collaborators shared by every read: the transport,
//! the time/sleep/jitter sources, the rejection classifier, and the environment view. Each read
//! is a one-shot operation that runs on the caller's task; reads share no mutable state, so any
//! number of them may run concurrently against the same provider.

// self
use crate::{
	_prelude::*,
	config::{EnvSource, ProcessEnv, ProviderConfig},
	http::LoginTransport,
	login::{LoginClient, RejectionClassifier, SubstringClassifier},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	retry::{Clock, JitterSource, RetryReport, RetryScheduler, Sleeper},
	sources::{
		self, MembershipKind, MembershipRecord, VaultTokenInput, VaultTokenRecord,
	},
};
#[cfg(feature = "tokio")]
use crate::retry::{RandJitter, SystemClock, TokioSleeper};
#[cfg(all(feature = "reqwest", feature = "tokio"))]
use crate::http::ReqwestHttpClient;

/// Data sources registered by the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSourceKind {
	/// Leased AppRole token.
	VaultToken,
	/// Backend instance-group membership.
	GoogleBackend,
	/// DNS forwarding targets.
	GoogleForwardingConfig,
}
impl DataSourceKind {
	/// Every registered data source.
	pub const ALL: [Self; 3] = [Self::VaultToken, Self::GoogleBackend, Self::GoogleForwardingConfig];

	/// Name the host uses to address the data source.
	pub const fn name(self) -> &'static str {
		match self {
			Self::VaultToken => "customconfig_vault_token",
			Self::GoogleBackend => "customconfig_google_backend",
			Self::GoogleForwardingConfig => "customconfig_google_forwarding_config",
		}
	}

	/// Observability label for reads of this data source.
	pub const fn operation(self) -> OperationKind {
		match self {
			Self::VaultToken => OperationKind::VaultToken,
			Self::GoogleBackend => OperationKind::GoogleBackend,
			Self::GoogleForwardingConfig => OperationKind::GoogleForwardingConfig,
		}
	}
}
impl Display for DataSourceKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.name())
	}
}
impl FromStr for DataSourceKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|kind| kind.name() == s)
			.ok_or_else(|| format!("Unknown data source `{s}`."))
	}
}

/// Entry point for data-source reads.
pub struct Provider<T>
where
	T: ?Sized + LoginTransport,
{
	config: ProviderConfig,
	transport: Arc<T>,
	clock: Arc<dyn Clock>,
	sleeper: Arc<dyn Sleeper>,
	jitter: Arc<dyn JitterSource>,
	classifier: Arc<dyn RejectionClassifier>,
	env: Arc<dyn EnvSource>,
}
impl<T> Provider<T>
where
	T: LoginTransport,
{
	/// Creates a provider from explicit collaborators.
	pub fn with_parts(
		config: ProviderConfig,
		transport: T,
		clock: Arc<dyn Clock>,
		sleeper: Arc<dyn Sleeper>,
		jitter: Arc<dyn JitterSource>,
	) -> Self {
		Self {
			config,
			transport: Arc::new(transport),
			clock,
			sleeper,
			jitter,
			classifier: Arc::new(SubstringClassifier),
			env: Arc::new(ProcessEnv),
		}
	}

	/// Creates a provider using `transport` with the wall clock, tokio timer, and random jitter.
	#[cfg(feature = "tokio")]
	pub fn with_transport(config: ProviderConfig, transport: T) -> Self {
		Self::with_parts(
			config,
			transport,
			Arc::new(SystemClock),
			Arc::new(TokioSleeper),
			Arc::new(RandJitter),
		)
	}
}
#[cfg(all(feature = "reqwest", feature = "tokio"))]
impl Provider<ReqwestHttpClient> {
	/// Creates a reqwest-backed provider.
	pub fn new(config: ProviderConfig) -> Self {
		Self::with_transport(config, ReqwestHttpClient::default())
	}

	/// Creates a reqwest-backed provider configured from the process environment.
	pub fn from_env() -> Result<Self> {
		Ok(Self::new(ProviderConfig::from_env(&ProcessEnv)?))
	}
}
impl<T> Provider<T>
where
	T: ?Sized + LoginTransport,
{
	/// Replaces the environment view used for address and trust defaults.
	pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
		self.env = Arc::new(env);

		self
	}

	/// Replaces the rejection classifier.
	pub fn with_classifier(mut self, classifier: Arc<dyn RejectionClassifier>) -> Self {
		self.classifier = classifier;

		self
	}

	/// Provider-wide configuration.
	pub fn config(&self) -> &ProviderConfig {
		&self.config
	}

	/// Data sources this provider serves.
	pub fn data_sources(&self) -> &'static [DataSourceKind] {
		&DataSourceKind::ALL
	}

	/// Logs in with the AppRole inputs, retrying transient failures until the configured timeout.
	pub async fn read_vault_token(&self, input: &VaultTokenInput) -> Result<VaultTokenRecord> {
		self.read_vault_token_with_report(input).await.0
	}

	/// Same as [`Provider::read_vault_token`], also returning the retry report.
	///
	/// The report is empty when the configuration or inputs fail validation before any attempt.
	pub async fn read_vault_token_with_report(
		&self,
		input: &VaultTokenInput,
	) -> (Result<VaultTokenRecord>, RetryReport) {
		const KIND: OperationKind = OperationKind::VaultToken;

		let span = OperationSpan::new(KIND, "read_vault_token");

		obs::record_outcome(KIND, OperationOutcome::Attempt);

		let (result, report) = span
			.instrument(async move {
				if let Err(e) = self.config.validate() {
					return (Err(e), RetryReport::default());
				}

				let resolved = match input.resolve(&self.config, self.env.as_ref()) {
					Ok(resolved) => resolved,
					Err(e) => return (Err(e), RetryReport::default()),
				};
				let client = LoginClient::new(self.transport.clone())
					.with_classifier(self.classifier.clone())
					.with_clock(self.clock.clone())
					.with_debug(resolved.debug);
				let client = &client;
				let resolved = &resolved;
				let (result, report) = self
					.scheduler()
					.run_with_report(move || {
						client.login(&resolved.request, &resolved.address, &resolved.trust)
					})
					.await;

				(result.map(VaultTokenRecord::from), report)
			})
			.await;

		obs::record_outcome(KIND, OperationOutcome::of(&result));

		(result, report)
	}

	/// Flattens backend instance groups into `{"group": ..}` entries.
	pub fn read_google_backend<S>(&self, instance_groups: &[S]) -> MembershipRecord
	where
		S: AsRef<str>,
	{
		self.read_membership(MembershipKind::Backend, instance_groups)
	}

	/// Flattens forwarding target addresses into `{"ipv4_address": ..}` entries.
	pub fn read_google_forwarding_config<S>(&self, ipv4_addresses: &[S]) -> MembershipRecord
	where
		S: AsRef<str>,
	{
		self.read_membership(MembershipKind::ForwardingConfig, ipv4_addresses)
	}

	fn read_membership<S>(&self, kind: MembershipKind, items: &[S]) -> MembershipRecord
	where
		S: AsRef<str>,
	{
		let operation = kind.operation();
		let span = OperationSpan::new(operation, kind.input_field());

		obs::record_outcome(operation, OperationOutcome::Attempt);

		let record = span.in_scope(|| sources::read_membership(kind, items));

		obs::record_outcome(operation, OperationOutcome::Success);

		record
	}

	fn scheduler(&self) -> RetryScheduler {
		RetryScheduler::new(
			self.config.retry_policy(),
			self.clock.clone(),
			self.sleeper.clone(),
			self.jitter.clone(),
		)
	}
}
impl<T> Clone for Provider<T>
where
	T: ?Sized + LoginTransport,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			transport: self.transport.clone(),
			clock: self.clock.clone(),
			sleeper: self.sleeper.clone(),
			jitter: self.jitter.clone(),
			classifier: self.classifier.clone(),
			env: self.env.clone(),
		}
	}
}
impl<T> Debug for Provider<T>
where
	T: ?Sized + LoginTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Provider").field("config", &self.config).finish()
	}
}
