//! AppRole credential broker for infrastructure data sources.
//!
//! Role/secret pairs are exchanged for leased tokens under a deadline-bounded retry loop with
//! jittered exponential backoff. Failures are classified as retryable or fatal at the network
//! boundary, and membership reads get stable content-addressed identities.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod login;
pub mod obs;
pub mod provider;
pub mod retry;
pub mod sources;
pub mod tls;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::{MapEnv, ProviderConfig},
		http::ReqwestHttpClient,
		provider::Provider,
		retry::{FixedJitter, ManualClock},
		sources::VaultTokenInput,
		tls::TrustSource,
	};

	/// Provider type alias used by reqwest-backed tests.
	pub type ReqwestTestProvider = Provider<ReqwestHttpClient>;

	/// Builds a reqwest-backed provider whose clock, sleeper, and jitter are deterministic.
	///
	/// The returned [`ManualClock`] shares state with the provider so tests can inspect the
	/// backoff waits the retry scheduler recorded.
	pub fn build_reqwest_test_provider(
		address: &str,
		timeout_seconds: u64,
	) -> (ReqwestTestProvider, ManualClock) {
		let address = Url::parse(address).expect("Failed to parse test provider address.");
		let config =
			ProviderConfig::default().with_timeout_seconds(timeout_seconds).with_address(address);
		let clock = ManualClock::default();
		let provider = Provider::with_parts(
			config,
			ReqwestHttpClient::default(),
			Arc::new(clock.clone()),
			Arc::new(clock.clone()),
			Arc::new(FixedJitter::ZERO),
		)
		.with_env(MapEnv::default());

		(provider, clock)
	}

	/// Token inputs that accept the mock service's self-signed certificate.
	pub fn mock_vault_token_input(role_id: &str, secret_id: &str) -> VaultTokenInput {
		VaultTokenInput::new(role_id, secret_id)
			.with_trust(TrustSource::default().with_skip_verify(true))
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
