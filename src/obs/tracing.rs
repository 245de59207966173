// self
use crate::{_prelude::*, error::TransientCause, obs::OperationKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span builder used by broker operations.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("approle_broker.operation", operation = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Runs a synchronous closure inside the span.
	pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
		#[cfg(feature = "tracing")]
		{
			self.span.in_scope(f)
		}
		#[cfg(not(feature = "tracing"))]
		{
			f()
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a retry decision before the scheduler sleeps.
pub fn retry_scheduled(cause: TransientCause, attempt: u32, sleep: Duration) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(
			cause = cause.as_str(),
			attempt,
			sleep_ms = sleep.whole_milliseconds() as u64,
			"{}",
			cause.retry_reason()
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (cause, attempt, sleep);
	}
}

/// Logs that the next wait would cross the deadline and one last attempt follows.
pub fn final_attempt(cause: TransientCause, attempts: u32) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(
			cause = cause.as_str(),
			attempts,
			"Retry deadline reached; making one final attempt"
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (cause, attempts);
	}
}

/// Logs receipt of a login response; the body is never logged because it carries the token.
pub fn login_response(url: &Url, status: u16, body_len: usize) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(%url, status, body_len, "Received login response from Vault");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (url, status, body_len);
	}
}

/// Logs a login payload whose token fields were already redacted by the caller.
pub fn login_payload(url: &Url, payload: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(%url, payload, "Vault login payload");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (url, payload);
	}
}

/// Warns about an `errors` payload that is neither a list nor a mapping of strings.
pub fn unexpected_errors_shape(shape: &'static str) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(shape, "Vault returned an `errors` field with an unexpected shape");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = shape;
	}
}
