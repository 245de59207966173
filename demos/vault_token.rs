//! Demonstrates reading the token data source against a mock login endpoint with the default
//! reqwest transport, followed by a membership read.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use approle_broker::{
	config::ProviderConfig, provider::Provider, sources::VaultTokenInput, tls::TrustSource, url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let login_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/auth/ptfe/login");
			then.status(200).header("content-type", "application/json").body(
				r#"{"request_id":"demo-request","lease_duration":1800,"renewable":true,"auth":{"client_token":"demo-token"}}"#,
			);
		})
		.await;
	let config = ProviderConfig::default()
		.with_timeout_seconds(10)
		.with_address(Url::parse(&server.base_url())?);
	let provider = Provider::new(config);
	// The mock endpoint serves a self-signed certificate.
	let input = VaultTokenInput::new("demo-role", "demo-secret")
		.with_trust(TrustSource::default().with_skip_verify(true));
	let record = provider.read_vault_token(&input).await?;

	println!(
		"Token record {} leased for {}s (renewable: {}) starting {}.",
		record.id, record.lease_duration, record.renewable, record.lease_start_time
	);

	login_mock.assert_async().await;

	let backends = provider.read_google_backend(&["ig-us-east1-a", "ig-us-east1-b"]);

	println!("Backend set {} has {} groups.", backends.id, backends.entries.len());

	Ok(())
}
