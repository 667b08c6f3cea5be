//! Bounded retry policy for throttled Selling Partner API calls.

// self
use crate::_prelude::*;

/// How a throttled (HTTP 429) call is retried.
///
/// The retry budget is a hard cap: once `max_retries` resends have been throttled, the last
/// 429 is returned to the caller as [`Error::Http`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Maximum number of resends after the first attempt.
	pub max_retries: u32,
	/// Fixed delay slept before each resend.
	pub backoff: Duration,
}
impl RetryPolicy {
	/// Default resend cap.
	pub const DEFAULT_MAX_RETRIES: u32 = 1;
	/// Default delay before a resend.
	pub const DEFAULT_BACKOFF: Duration = Duration::seconds(2);

	/// Creates a policy with an explicit cap and delay. Negative delays are clamped to zero.
	pub fn new(max_retries: u32, backoff: Duration) -> Self {
		Self { max_retries, backoff: clamp(backoff) }
	}

	/// Disables retries altogether.
	pub fn disabled() -> Self {
		Self::new(0, Duration::ZERO)
	}

	/// Overrides the delay.
	pub fn with_backoff(mut self, backoff: Duration) -> Self {
		self.backoff = clamp(backoff);

		self
	}

	/// Overrides the resend cap.
	pub fn with_max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = max_retries;

		self
	}

	/// Returns the delay to sleep before resend number `retries_so_far + 1`, or `None` once the
	/// budget is spent.
	pub fn next_delay(&self, retries_so_far: u32) -> Option<Duration> {
		(retries_so_far < self.max_retries).then_some(self.backoff)
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self::new(Self::DEFAULT_MAX_RETRIES, Self::DEFAULT_BACKOFF)
	}
}

fn clamp(backoff: Duration) -> Duration {
	if backoff.is_negative() { Duration::ZERO } else { backoff }
}
