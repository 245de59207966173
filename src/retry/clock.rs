//! Time, sleep, and jitter sources injected into the retry scheduler.

// crates.io
use rand::Rng;
// self
use crate::_prelude::*;

/// Boxed future returned by [`Sleeper::sleep`].
pub type SleepFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Source of the current instant.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current instant.
	fn now(&self) -> OffsetDateTime;
}

/// Suspends the calling task for a duration.
pub trait Sleeper
where
	Self: Send + Sync,
{
	/// Returns a future that completes after `duration`.
	fn sleep(&self, duration: Duration) -> SleepFuture;
}

/// Produces the random delay added to every backoff wait.
pub trait JitterSource
where
	Self: Send + Sync,
{
	/// Returns a delay within `0..=max`.
	fn jitter(&self, max: Duration) -> Duration;
}

/// Wall clock in UTC.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Sleeper backed by the tokio timer.
#[cfg(feature = "tokio")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;
#[cfg(feature = "tokio")]
impl Sleeper for TokioSleeper {
	fn sleep(&self, duration: Duration) -> SleepFuture {
		let duration = std::time::Duration::try_from(duration).unwrap_or_default();

		Box::pin(tokio::time::sleep(duration))
	}
}

/// Uniform millisecond jitter drawn from the thread-local RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandJitter;
impl JitterSource for RandJitter {
	fn jitter(&self, max: Duration) -> Duration {
		let max_ms = u64::try_from(max.whole_milliseconds()).unwrap_or(0);

		if max_ms == 0 {
			return Duration::ZERO;
		}

		let ms = rand::rng().random_range(0..=max_ms);

		Duration::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX))
	}
}

/// Jitter source that always returns the same delay (capped at the requested maximum).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedJitter(pub Duration);
impl FixedJitter {
	/// No jitter at all.
	pub const ZERO: Self = Self(Duration::ZERO);
}
impl JitterSource for FixedJitter {
	fn jitter(&self, max: Duration) -> Duration {
		self.0.min(max).max(Duration::ZERO)
	}
}

/// Virtual clock whose sleeps complete immediately and advance the clock.
///
/// A single value serves as both [`Clock`] and [`Sleeper`], so retry schedules can be driven
/// deterministically without real delays. Every sleep is recorded in order.
#[derive(Clone, Debug)]
pub struct ManualClock {
	now: Arc<Mutex<OffsetDateTime>>,
	sleeps: Arc<Mutex<Vec<Duration>>>,
}
impl ManualClock {
	/// Starts the clock at `start`.
	pub fn starting_at(start: OffsetDateTime) -> Self {
		Self { now: Arc::new(Mutex::new(start)), sleeps: Default::default() }
	}

	/// Moves the clock forward without recording a sleep.
	pub fn advance(&self, by: Duration) {
		*self.now.lock() += by;
	}

	/// Returns every sleep requested so far.
	pub fn sleeps(&self) -> Vec<Duration> {
		self.sleeps.lock().clone()
	}

	/// Total time spent sleeping.
	pub fn slept(&self) -> Duration {
		self.sleeps.lock().iter().fold(Duration::ZERO, |acc, sleep| acc + *sleep)
	}
}
impl Default for ManualClock {
	fn default() -> Self {
		Self::starting_at(OffsetDateTime::UNIX_EPOCH)
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.now.lock()
	}
}
impl Sleeper for ManualClock {
	fn sleep(&self, duration: Duration) -> SleepFuture {
		self.sleeps.lock().push(duration);
		self.advance(duration);

		Box::pin(std::future::ready(()))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn rand_jitter_stays_within_bounds() {
		let max = Duration::milliseconds(1_000);

		for _ in 0..256 {
			let jitter = RandJitter.jitter(max);

			assert!(jitter >= Duration::ZERO && jitter <= max, "Jitter {jitter} escaped 0..=1s.");
		}

		assert_eq!(RandJitter.jitter(Duration::ZERO), Duration::ZERO);
	}

	#[test]
	fn fixed_jitter_is_capped() {
		assert_eq!(FixedJitter(Duration::seconds(5)).jitter(Duration::seconds(1)), Duration::seconds(1));
		assert_eq!(FixedJitter::ZERO.jitter(Duration::seconds(1)), Duration::ZERO);
	}

	#[tokio::test]
	async fn manual_clock_advances_on_sleep() {
		let clock = ManualClock::default();

		clock.sleep(Duration::seconds(2)).await;
		clock.advance(Duration::milliseconds(500));

		assert_eq!(clock.now(), OffsetDateTime::UNIX_EPOCH + Duration::milliseconds(2_500));
		assert_eq!(clock.sleeps(), vec![Duration::seconds(2)]);
		assert_eq!(clock.slept(), Duration::seconds(2));
	}
}
