// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicU32, Ordering},
	},
	time::Instant,
};
// crates.io
use time::Duration;
// self
use approle_broker::{
	error::{Error, ReadError, TransportError},
	retry::{
		FixedJitter, ManualClock, RandJitter, RetryPolicy, RetryScheduler, RetryState,
		SystemClock, TokioSleeper,
	},
};

fn refused() -> Error {
	TransportError::Io(std::io::Error::from(std::io::ErrorKind::ConnectionRefused)).into()
}

fn manual(clock: &ManualClock, policy: RetryPolicy, jitter: FixedJitter) -> RetryScheduler {
	RetryScheduler::new(policy, Arc::new(clock.clone()), Arc::new(clock.clone()), Arc::new(jitter))
}

#[tokio::test]
async fn waits_double_with_jitter_until_success() {
	let clock = ManualClock::default();
	let scheduler = manual(
		&clock,
		RetryPolicy::with_timeout(Duration::seconds(60)),
		FixedJitter(Duration::milliseconds(250)),
	);
	let calls = AtomicU32::new(0);
	let counter = &calls;
	let (result, report) = scheduler
		.run_with_report(move || async move {
			match counter.fetch_add(1, Ordering::SeqCst) {
				0 | 1 => Err(refused()),
				2 => {
					let eof = std::io::Error::from(std::io::ErrorKind::UnexpectedEof);

					Err(ReadError::body(eof).into())
				},
				_ => Ok("token"),
			}
		})
		.await;

	assert_eq!(result.expect("Fourth attempt should succeed."), "token");
	assert_eq!(calls.load(Ordering::SeqCst), 4);
	assert_eq!(report.state, RetryState::Succeeded);
	assert_eq!(
		report.sleeps,
		[1_250, 2_250, 4_250].map(Duration::milliseconds).to_vec(),
		"Each wait adds the jitter to a doubling base."
	);
	assert_eq!(clock.sleeps(), report.sleeps);
}

#[tokio::test]
async fn sleeps_are_clamped_to_the_deadline() {
	let clock = ManualClock::default();
	let scheduler = manual(
		&clock,
		RetryPolicy::with_timeout(Duration::seconds(4)),
		FixedJitter(Duration::milliseconds(900)),
	);
	let (result, report) = scheduler.run_with_report(|| async { Err::<(), _>(refused()) }).await;
	let err = result.expect_err("Persistent failures must time out.");

	// 1s wait + 0.9s jitter, then 2s + 0.9s clamped to the 2.1s left; the 4s wait no longer
	// fits, so one final attempt follows.
	assert_eq!(report.sleeps, vec![Duration::milliseconds(1_900), Duration::milliseconds(2_100)]);
	assert_eq!(report.attempts, 4);
	assert_eq!(report.state, RetryState::TimedOut);
	assert!(clock.slept() <= Duration::seconds(4));
	assert!(err.is_timeout());
	assert!(
		err.to_string().starts_with("timed out after 4s waiting for a successful login (4 attempts)")
	);
}

#[tokio::test]
async fn fatal_failure_is_returned_unchanged() {
	let clock = ManualClock::default();
	let scheduler = manual(&clock, RetryPolicy::default(), FixedJitter::ZERO);
	let calls = AtomicU32::new(0);
	let counter = &calls;
	let err = scheduler
		.run(move || async move {
			counter.fetch_add(1, Ordering::SeqCst);

			Err::<(), _>(Error::MalformedResponse {
				message: "Vault login response is missing `auth`.".into(),
			})
		})
		.await
		.expect_err("Fatal failures must surface.");

	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert_eq!(err.to_string(), "Vault login response is missing `auth`.");
	assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn real_timer_stops_within_the_budget() {
	let scheduler = RetryScheduler::new(
		RetryPolicy::with_timeout(Duration::seconds(2)),
		Arc::new(SystemClock),
		Arc::new(TokioSleeper),
		Arc::new(RandJitter),
	);
	let started = Instant::now();
	let err = scheduler
		.run(|| async { Err::<(), _>(refused()) })
		.await
		.expect_err("Persistent failures must time out.");
	let elapsed = started.elapsed();

	assert!(err.is_timeout());
	assert!(
		elapsed < std::time::Duration::from_millis(2_500),
		"Scheduler overran its budget: {elapsed:?}."
	);
}
