//! Broker-level error types and the retryable/fatal classification shared by every layer.

// std
use std::path::PathBuf;
// self
use crate::{_prelude::*, auth::IdentifierError};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
///
/// Remote-facing variants keep the upstream message text verbatim so operators can match it
/// against the secret-management service's documentation.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// No response was received (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// A response arrived but its body could not be read.
	#[error(transparent)]
	Read(#[from] ReadError),

	/// The service answered with a well-formed `errors` payload.
	#[error("{message}")]
	RemoteRejection {
		/// Rendered rejection, including the serialized `errors` value.
		message: String,
		/// Transient cause derived from the rejection text, if any.
		cause: Option<TransientCause>,
	},
	/// A success-shaped response was missing required fields or was not JSON.
	#[error("{message}")]
	MalformedResponse {
		/// Description of what was missing or invalid.
		message: String,
	},
	/// A success-shaped response carried fields of the wrong type.
	#[error("Vault returned a malformed login response.")]
	ResponseParse {
		/// Structured parsing failure, including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The retry budget elapsed while the last failure was still retryable.
	#[error(
		"timed out after {}s waiting for a successful login ({attempts} attempts): {last}",
		.timeout.whole_seconds()
	)]
	Timeout {
		/// Configured overall timeout.
		timeout: Duration,
		/// Number of attempts made before giving up.
		attempts: u32,
		/// Last retryable error observed.
		#[source]
		last: Box<Error>,
	},
}
impl Error {
	/// Classifies the error as retryable or fatal.
	///
	/// The classification depends only on the error's category, never on how many attempts
	/// have been made.
	pub fn class(&self) -> ErrorClass {
		match self {
			Self::Transport(_) => ErrorClass::RetryableTransient(TransientCause::Transport),
			Self::Read(_) => ErrorClass::RetryableTransient(TransientCause::Read),
			Self::RemoteRejection { cause: Some(cause), .. } =>
				ErrorClass::RetryableTransient(*cause),
			Self::Config(_)
			| Self::RemoteRejection { cause: None, .. }
			| Self::MalformedResponse { .. }
			| Self::ResponseParse { .. }
			| Self::Timeout { .. } => ErrorClass::Fatal,
		}
	}

	/// Returns `true` when the error is the timeout outcome of the retry scheduler.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout { .. })
	}

	/// Returns the innermost error, unwrapping a timeout to the last attempt's failure.
	pub fn last_attempt_error(&self) -> &Error {
		match self {
			Self::Timeout { last, .. } => last.last_attempt_error(),
			other => other,
		}
	}
}

/// Retry classification attached to every failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
	/// Failure is temporary and should be retried within the timeout budget.
	RetryableTransient(TransientCause),
	/// Failure must be surfaced immediately.
	Fatal,
}
impl ErrorClass {
	/// Returns `true` for [`ErrorClass::RetryableTransient`].
	pub fn is_retryable(self) -> bool {
		matches!(self, Self::RetryableTransient(_))
	}
}

/// The three transient categories the scheduler retries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransientCause {
	/// The service reported an internal error.
	InternalError,
	/// The request never reached the service or no response came back.
	Transport,
	/// The response body could not be read, usually during eventual consistency windows.
	Read,
}
impl TransientCause {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::InternalError => "internal_error",
			Self::Transport => "transport",
			Self::Read => "read",
		}
	}

	/// Human-readable reason logged when a retry is scheduled.
	pub const fn retry_reason(self) -> &'static str {
		match self {
			Self::InternalError => "Retrying internal error response from API",
			Self::Transport => "Retrying service unavailable from API",
			Self::Read => "Retrying due to eventual consistency",
		}
	}
}
impl Display for TransientCause {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Login request body could not be serialized.
	#[error("error creating request body json: {0}")]
	RequestBody(#[from] serde_json::Error),
	/// Required input was missing or blank.
	#[error("The `{field}` input is required.")]
	MissingInput {
		/// Input field name.
		field: &'static str,
	},
	/// Service address cannot be parsed.
	#[error("Address `{address}` is not a valid URL.")]
	InvalidAddress {
		/// Address as supplied.
		address: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Service address uses a scheme other than HTTP(S).
	#[error("Address `{address}` must use http or https.")]
	UnsupportedScheme {
		/// Address as supplied.
		address: String,
	},
	/// Authentication mount name is invalid.
	#[error("Backend mount is invalid.")]
	InvalidBackend(#[from] IdentifierError),
	/// Trust material could not be read from disk.
	#[error("Unable to read trust material from `{}`.", .path.display())]
	TrustMaterial {
		/// File or directory that failed.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Trust material does not contain usable PEM certificates.
	#[error("Root CA bundle is invalid: {reason}.")]
	InvalidTrustBundle {
		/// Why the bundle was rejected.
		reason: String,
	},
	/// Environment variable carries an unusable value.
	#[error("Environment variable `{name}` has an invalid value `{value}`.")]
	InvalidEnv {
		/// Variable name.
		name: &'static str,
		/// Raw value.
		value: String,
	},
	/// The overall timeout must be at least one second.
	#[error("The timeout must be a positive number of seconds.")]
	NonPositiveTimeout,
	/// The overall timeout exceeds the supported ceiling.
	#[error("The timeout must not exceed {max} seconds.")]
	TimeoutTooLarge {
		/// Largest accepted timeout, in seconds.
		max: u64,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures; no response was received.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("error talking to Vault: {source}")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("error talking to Vault: {0}")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// A response arrived but its body could not be consumed.
#[derive(Debug, ThisError)]
pub enum ReadError {
	/// Body stream failed or could not be decoded.
	#[error("error reading from Vault: {source}")]
	Body {
		/// Transport-specific read error.
		#[source]
		source: BoxError,
	},
}
impl ReadError {
	/// Wraps a transport-specific body read error.
	pub fn body(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Body { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ReadError {
	fn from(e: ReqwestError) -> Self {
		Self::body(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn io(kind: std::io::ErrorKind) -> std::io::Error {
		std::io::Error::new(kind, "boom")
	}

	#[test]
	fn transport_and_read_failures_are_retryable() {
		let transport = Error::from(TransportError::Io(io(std::io::ErrorKind::ConnectionRefused)));
		let read = Error::from(ReadError::body(io(std::io::ErrorKind::UnexpectedEof)));

		assert_eq!(transport.class(), ErrorClass::RetryableTransient(TransientCause::Transport));
		assert_eq!(read.class(), ErrorClass::RetryableTransient(TransientCause::Read));
		assert!(transport.to_string().starts_with("error talking to Vault: "));
		assert!(read.to_string().starts_with("error reading from Vault: "));
	}

	#[test]
	fn rejections_follow_their_cause() {
		let retryable = Error::RemoteRejection {
			message: "Vault returned error(s): [\"internal error\"]".into(),
			cause: Some(TransientCause::InternalError),
		};
		let fatal = Error::RemoteRejection {
			message: "Vault returned error(s): [\"permission denied\"]".into(),
			cause: None,
		};

		assert!(retryable.class().is_retryable());
		assert_eq!(fatal.class(), ErrorClass::Fatal);
		assert_eq!(fatal.to_string(), "Vault returned error(s): [\"permission denied\"]");
	}

	#[test]
	fn timeout_wraps_last_error_and_is_fatal() {
		let last = Error::from(TransportError::Io(io(std::io::ErrorKind::ConnectionRefused)));
		let err = Error::Timeout { timeout: Duration::seconds(2), attempts: 3, last: Box::new(last) };

		assert!(err.is_timeout());
		assert_eq!(err.class(), ErrorClass::Fatal);
		assert!(matches!(err.last_attempt_error(), Error::Transport(_)));
		assert!(err.to_string().starts_with("timed out after 2s waiting for a successful login"));
		assert!(err.to_string().contains("(3 attempts): error talking to Vault: boom"));
	}
}
