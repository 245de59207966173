//! Optional observability helpers for broker operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `approle_broker.operation` with the
//!   `operation` (data source) and `stage` (call site) fields, plus debug events for retry
//!   decisions and login responses.
//! - Enable `metrics` to increment the `approle_broker_operation_total` counter for every
//!   attempt/retry/success/failure/timeout, labeled by `operation` + `outcome`, and the
//!   `approle_broker_retry_total` counter labeled by transient `cause`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Data-source operations observed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// AppRole login for the token data source.
	VaultToken,
	/// Backend instance-group membership read.
	GoogleBackend,
	/// DNS forwarding target read.
	GoogleForwardingConfig,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::VaultToken => "vault_token",
			OperationKind::GoogleBackend => "google_backend",
			OperationKind::GoogleForwardingConfig => "google_forwarding_config",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to a broker operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Retry budget exhausted.
	Timeout,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
			OperationOutcome::Timeout => "timeout",
		}
	}

	/// Maps an operation result onto its terminal outcome label.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => OperationOutcome::Success,
			Err(err) if err.is_timeout() => OperationOutcome::Timeout,
			Err(_) => OperationOutcome::Failure,
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::TransportError;

	#[test]
	fn outcomes_follow_results() {
		let refused = || -> Error {
			TransportError::Io(std::io::Error::from(std::io::ErrorKind::ConnectionRefused)).into()
		};
		let timeout = Error::Timeout {
			timeout: Duration::seconds(2),
			attempts: 3,
			last: Box::new(refused()),
		};

		assert_eq!(OperationOutcome::of(&Ok::<_, Error>(())), OperationOutcome::Success);
		assert_eq!(OperationOutcome::of::<()>(&Err(refused())), OperationOutcome::Failure);
		assert_eq!(OperationOutcome::of::<()>(&Err(timeout)), OperationOutcome::Timeout);
		assert_eq!(OperationKind::GoogleForwardingConfig.to_string(), "google_forwarding_config");
	}
}
