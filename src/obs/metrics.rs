// self
use crate::{
	error::TransientCause,
	obs::{OperationKind, OperationOutcome},
};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_outcome(kind: OperationKind, outcome: OperationOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"approle_broker_operation_total",
			"operation" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a scheduled retry labeled by its transient cause (when enabled).
pub fn record_retry(cause: TransientCause) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("approle_broker_retry_total", "cause" => cause.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = cause;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_metrics() {
		record_outcome(OperationKind::VaultToken, OperationOutcome::Failure);
		record_retry(TransientCause::Read);
	}
}
