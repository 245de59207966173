//! Deadline-bounded retry scheduler with exponential backoff and jitter.
//!
//! The scheduler is an explicit state machine:
//!
//! - `Running` → `Succeeded` when the attempt returns `Ok`; no further sleep.
//! - `Running` → `FatalFailed` when the failure classifies as fatal; the error is returned
//!   unchanged.
//! - `Running` → `Running` when the failure is retryable and `now + wait` still fits before the
//!   deadline: sleep `wait + jitter` (never past the deadline), double `wait`, try again.
//! - `Running` → `TimedOut` when the failure is retryable but the next wait would cross the
//!   deadline. One more attempt runs immediately; if it also fails with a retryable error, that
//!   error is returned wrapped in [`Error::Timeout`].
//!
//! In-flight attempts are never interrupted; only the decision after an attempt consults the
//! deadline. Time, sleep, and jitter are injected so schedules are testable without delays.

mod clock;

pub use clock::*;

// crates.io
use time::PrimitiveDateTime;
// self
use crate::{_prelude::*, error::ErrorClass, obs};

/// Timing parameters for a retry loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Overall budget measured from the first attempt.
	pub timeout: Duration,
	/// First backoff wait; doubled after every retryable failure.
	pub initial_wait: Duration,
	/// Upper bound of the random delay added to each wait.
	pub max_jitter: Duration,
}
impl RetryPolicy {
	/// Default overall budget.
	pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(60);
	/// Default first wait.
	pub const DEFAULT_INITIAL_WAIT: Duration = Duration::seconds(1);
	/// Default jitter ceiling.
	pub const DEFAULT_MAX_JITTER: Duration = Duration::milliseconds(1_000);

	/// Creates a policy with the given overall budget and default backoff.
	pub fn with_timeout(timeout: Duration) -> Self {
		Self { timeout, ..Self::default() }
	}

	/// Overrides the first backoff wait.
	pub fn with_initial_wait(mut self, wait: Duration) -> Self {
		self.initial_wait = wait;

		self
	}

	/// Overrides the jitter ceiling.
	pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
		self.max_jitter = max_jitter;

		self
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			timeout: Self::DEFAULT_TIMEOUT,
			initial_wait: Self::DEFAULT_INITIAL_WAIT,
			max_jitter: Self::DEFAULT_MAX_JITTER,
		}
	}
}

/// Scheduler states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryState {
	/// Attempts are still being made.
	Running,
	/// An attempt succeeded.
	Succeeded,
	/// An attempt failed with a fatal error.
	FatalFailed,
	/// The deadline was reached while failures were still retryable.
	TimedOut,
}

/// Backoff bookkeeping for one retry loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffState {
	/// Retryable failures seen so far.
	pub attempt: u32,
	/// Wait applied after the next retryable failure (before jitter).
	pub wait: Duration,
	/// Instant after which no sleep may end.
	pub deadline: OffsetDateTime,
}
impl BackoffState {
	/// Starts the backoff at `start` using `policy`.
	pub fn start(start: OffsetDateTime, policy: &RetryPolicy) -> Self {
		let deadline = start
			.checked_add(policy.timeout)
			.unwrap_or_else(|| PrimitiveDateTime::MAX.assume_utc());

		Self { attempt: 0, wait: policy.initial_wait, deadline }
	}

	/// Returns the sleep to apply at `now`, or `None` when waiting would cross the deadline.
	///
	/// The returned sleep is `wait + jitter`, clamped so it never ends after the deadline.
	pub fn next_sleep(&self, now: OffsetDateTime, jitter: Duration) -> Option<Duration> {
		match now.checked_add(self.wait) {
			Some(end) if end <= self.deadline => {},
			_ => return None,
		}

		Some((self.wait + jitter).min(self.deadline - now))
	}

	/// Doubles the wait and counts the failure.
	pub fn advance(&mut self) {
		self.attempt += 1;
		self.wait = self.wait.saturating_mul(2);
	}
}

/// Diagnostic summary of a retry loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryReport {
	/// Final scheduler state.
	pub state: RetryState,
	/// Number of attempts invoked.
	pub attempts: u32,
	/// Sleeps applied between attempts, jitter included.
	pub sleeps: Vec<Duration>,
}
impl Default for RetryReport {
	fn default() -> Self {
		Self { state: RetryState::Running, attempts: 0, sleeps: Vec::new() }
	}
}

/// Runs attempts under a [`RetryPolicy`].
#[derive(Clone)]
pub struct RetryScheduler {
	/// Timing parameters.
	pub policy: RetryPolicy,
	clock: Arc<dyn Clock>,
	sleeper: Arc<dyn Sleeper>,
	jitter: Arc<dyn JitterSource>,
}
impl RetryScheduler {
	/// Creates a scheduler from explicit time, sleep, and jitter sources.
	pub fn new(
		policy: RetryPolicy,
		clock: Arc<dyn Clock>,
		sleeper: Arc<dyn Sleeper>,
		jitter: Arc<dyn JitterSource>,
	) -> Self {
		Self { policy, clock, sleeper, jitter }
	}

	/// Creates a scheduler using the wall clock, the tokio timer, and random jitter.
	#[cfg(feature = "tokio")]
	pub fn system(policy: RetryPolicy) -> Self {
		Self::new(policy, Arc::new(SystemClock), Arc::new(TokioSleeper), Arc::new(RandJitter))
	}

	/// Runs `attempt` until it succeeds, fails fatally, or the deadline passes.
	pub async fn run<T, F, Fut>(&self, attempt: F) -> Result<T>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		self.run_with_report(attempt).await.0
	}

	/// Same as [`RetryScheduler::run`], also returning a [`RetryReport`].
	pub async fn run_with_report<T, F, Fut>(&self, mut attempt: F) -> (Result<T>, RetryReport)
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		let mut backoff = BackoffState::start(self.clock.now(), &self.policy);
		let mut report = RetryReport::default();
		let mut final_attempt = false;

		loop {
			report.attempts += 1;

			let err = match attempt().await {
				Ok(value) => {
					report.state = RetryState::Succeeded;

					return (Ok(value), report);
				},
				Err(err) => err,
			};
			let cause = match err.class() {
				ErrorClass::RetryableTransient(cause) => cause,
				ErrorClass::Fatal => {
					report.state = RetryState::FatalFailed;

					return (Err(err), report);
				},
			};

			if final_attempt {
				report.state = RetryState::TimedOut;

				let timeout = Error::Timeout {
					timeout: self.policy.timeout,
					attempts: report.attempts,
					last: Box::new(err),
				};

				return (Err(timeout), report);
			}

			let now = self.clock.now();

			match backoff.next_sleep(now, self.jitter.jitter(self.policy.max_jitter)) {
				Some(sleep) => {
					obs::retry_scheduled(cause, report.attempts, sleep);
					obs::record_retry(cause);
					self.sleeper.sleep(sleep).await;
					report.sleeps.push(sleep);
					backoff.advance();
				},
				None => {
					obs::final_attempt(cause, report.attempts);

					final_attempt = true;
				},
			}
		}
	}
}
impl Debug for RetryScheduler {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RetryScheduler").field("policy", &self.policy).finish()
	}
}
