//! Transport primitives for login exchanges.
//!
//! The module exposes [`LoginTransport`] alongside [`TrustConfig`] and [`HttpReply`] so
//! downstream crates can plug in their own HTTP stack. Trust settings travel with every call
//! instead of living in process-wide transport state: two reads with different CA bundles
//! never observe each other's configuration.

// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")]
use crate::error::{ConfigError, ReadError, TransportError};

/// Boxed future returned by [`LoginTransport::post_json`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpReply>> + 'a + Send>>;

/// Abstraction over HTTP transports able to POST a JSON login body.
///
/// Implementations must report failures with the broker taxonomy so the retry scheduler can
/// classify them:
///
/// - no response received (DNS, TCP, TLS handshake): [`crate::error::TransportError`]
/// - response received but the body could not be read: [`crate::error::ReadError`]
/// - the transport could not be configured from `trust`: [`crate::error::ConfigError`]
///
/// Non-2xx statuses are not failures at this layer; the reply body is returned as-is.
pub trait LoginTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `body` as `application/json` to `url`, honoring `trust` for this call only.
	fn post_json<'a>(
		&'a self,
		url: &'a Url,
		body: Vec<u8>,
		trust: &'a TrustConfig,
	) -> TransportFuture<'a>;
}

/// Status and body of a login response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
	/// HTTP status code.
	pub status: u16,
	/// Decoded response body.
	pub body: String,
}

/// TLS trust settings supplied per call.
///
/// The value is immutable once built; constructing it never touches the filesystem (see
/// [`crate::tls::TrustSource`] for loading PEM files).
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TrustConfig {
	/// PEM bundle of additional root certificates.
	pub root_ca_pem: Option<Vec<u8>>,
	/// Disables certificate and hostname verification.
	pub skip_verify: bool,
}
impl TrustConfig {
	/// Trusts the platform roots and verifies certificates.
	pub fn system() -> Self {
		Self::default()
	}

	/// Adds a PEM bundle of root certificates.
	pub fn with_root_ca_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
		self.root_ca_pem = Some(pem.into());

		self
	}

	/// Overrides the skip-verification flag.
	pub fn with_skip_verify(mut self, skip_verify: bool) -> Self {
		self.skip_verify = skip_verify;

		self
	}
}
impl Debug for TrustConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TrustConfig")
			.field("root_ca_pem_bytes", &self.root_ca_pem.as_ref().map(Vec::len))
			.field("skip_verify", &self.skip_verify)
			.finish()
	}
}

/// Reqwest-backed [`LoginTransport`].
///
/// A fresh [`ReqwestClient`] is built for each call from the supplied [`TrustConfig`], so no
/// TLS state is shared between reads. Redirects are never followed; the login endpoint answers
/// directly.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient {
	/// Per-request timeout applied to each call, if any.
	pub request_timeout: Option<std::time::Duration>,
}
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Applies a per-request timeout to every login call.
	pub fn with_request_timeout(mut self, timeout: std::time::Duration) -> Self {
		self.request_timeout = Some(timeout);

		self
	}

	/// Builds a reqwest client honoring `trust`.
	pub fn client_for(&self, trust: &TrustConfig) -> Result<ReqwestClient> {
		let mut builder = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.danger_accept_invalid_certs(trust.skip_verify)
			.danger_accept_invalid_hostnames(trust.skip_verify);

		if let Some(pem) = &trust.root_ca_pem {
			let certificates = reqwest::Certificate::from_pem_bundle(pem).map_err(|e| {
				ConfigError::InvalidTrustBundle { reason: e.to_string() }
			})?;

			for certificate in certificates {
				builder = builder.add_root_certificate(certificate);
			}
		}
		if let Some(timeout) = self.request_timeout {
			builder = builder.timeout(timeout);
		}

		builder.build().map_err(|e| ConfigError::from(e).into())
	}
}
#[cfg(feature = "reqwest")]
impl LoginTransport for ReqwestHttpClient {
	fn post_json<'a>(
		&'a self,
		url: &'a Url,
		body: Vec<u8>,
		trust: &'a TrustConfig,
	) -> TransportFuture<'a> {
		Box::pin(async move {
			let client = self.client_for(trust)?;
			let response = client
				.post(url.clone())
				.header(reqwest::header::CONTENT_TYPE, "application/json")
				.body(body)
				.send()
				.await
				.map_err(map_send_error)?;
			let status = response.status().as_u16();
			let body = response.text().await.map_err(ReadError::from)?;

			Ok(HttpReply { status, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn map_send_error(err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}

	TransportError::from(err).into()
}
