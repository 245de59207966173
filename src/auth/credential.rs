//! Leased credential produced by a successful login, plus its builder.

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	auth::{RequestId, Sensitive},
};

/// Lease status of a credential at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaseStatus {
	/// The instant precedes acquisition.
	Pending,
	/// Lease is still running.
	Active,
	/// Lease ran out.
	Expired,
	/// The service issued the token without a lease window.
	Unbounded,
}

/// Errors produced by [`CredentialBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CredentialBuilderError {
	/// Issued when no (or an empty) client token was provided.
	#[error("Client token is required.")]
	MissingToken,
	/// Issued when the lease duration is negative.
	#[error("Lease duration cannot be negative.")]
	NegativeLease,
}

/// Token and lease metadata returned by a successful login.
///
/// A credential only exists once the service answered without errors, so `token` is never
/// empty and `acquired_at` always marks the successful response. The broker hands it to the
/// caller and keeps no copy.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	/// Identifier the service assigned to the login request.
	pub request_id: RequestId,
	/// Bearer token; callers must avoid logging it.
	pub token: Sensitive,
	/// Lease window granted with the token.
	pub lease_duration: Duration,
	/// Whether the lease may be renewed.
	pub renewable: bool,
	/// Instant the successful response was parsed.
	pub acquired_at: OffsetDateTime,
	/// Raw login response body for passthrough; contains the token.
	pub raw_json: Sensitive,
}
impl Credential {
	/// Returns a builder seeded with the request identifier.
	pub fn builder(request_id: RequestId) -> CredentialBuilder {
		CredentialBuilder::new(request_id)
	}

	/// Lease expiry, or `None` when the token was issued without a lease window.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		if self.lease_duration.is_zero() { None } else { Some(self.acquired_at + self.lease_duration) }
	}

	/// Computes the lease status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> LeaseStatus {
		if instant < self.acquired_at {
			return LeaseStatus::Pending;
		}

		match self.expires_at() {
			None => LeaseStatus::Unbounded,
			Some(expiry) if instant >= expiry => LeaseStatus::Expired,
			Some(_) => LeaseStatus::Active,
		}
	}

	/// Lease start rendered as RFC 3339.
	pub fn lease_start_time(&self) -> String {
		// RFC 3339 formatting only fails for years outside 0..=9999.
		self.acquired_at.format(&Rfc3339).unwrap_or_else(|_| self.acquired_at.to_string())
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("request_id", &self.request_id)
			.field("token", &"<redacted>")
			.field("lease_duration", &self.lease_duration)
			.field("renewable", &self.renewable)
			.field("acquired_at", &self.acquired_at)
			.field("raw_json", &"<redacted>")
			.finish()
	}
}

/// Builder for [`Credential`].
#[derive(Clone, Debug)]
pub struct CredentialBuilder {
	request_id: RequestId,
	token: Option<Sensitive>,
	lease_duration: Duration,
	renewable: bool,
	acquired_at: Option<OffsetDateTime>,
	raw_json: Sensitive,
}
impl CredentialBuilder {
	fn new(request_id: RequestId) -> Self {
		Self {
			request_id,
			token: None,
			lease_duration: Duration::ZERO,
			renewable: false,
			acquired_at: None,
			raw_json: Sensitive::default(),
		}
	}

	/// Provides the client token value.
	pub fn token(mut self, token: impl Into<Sensitive>) -> Self {
		self.token = Some(token.into());

		self
	}

	/// Sets the lease window.
	pub fn lease_duration(mut self, duration: Duration) -> Self {
		self.lease_duration = duration;

		self
	}

	/// Sets the renewable flag.
	pub fn renewable(mut self, renewable: bool) -> Self {
		self.renewable = renewable;

		self
	}

	/// Sets the acquisition instant.
	pub fn acquired_at(mut self, instant: OffsetDateTime) -> Self {
		self.acquired_at = Some(instant);

		self
	}

	/// Attaches the raw response body.
	pub fn raw_json(mut self, raw: impl Into<Sensitive>) -> Self {
		self.raw_json = raw.into();

		self
	}

	/// Consumes the builder and produces a [`Credential`].
	pub fn build(self) -> Result<Credential, CredentialBuilderError> {
		let token = self
			.token
			.filter(|token| !token.is_blank())
			.ok_or(CredentialBuilderError::MissingToken)?;

		if self.lease_duration.is_negative() {
			return Err(CredentialBuilderError::NegativeLease);
		}

		Ok(Credential {
			request_id: self.request_id,
			token,
			lease_duration: self.lease_duration,
			renewable: self.renewable,
			acquired_at: self.acquired_at.unwrap_or_else(OffsetDateTime::now_utc),
			raw_json: self.raw_json,
		})
	}
}
