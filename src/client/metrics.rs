// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for network activity issued by one client.
#[derive(Debug, Default)]
pub struct ClientMetrics {
	lwa_exchanges: AtomicU64,
	role_assumptions: AtomicU64,
	api_calls: AtomicU64,
	throttled: AtomicU64,
}
impl ClientMetrics {
	/// Returns the number of Login with Amazon token exchanges sent.
	pub fn lwa_exchanges(&self) -> u64 {
		self.lwa_exchanges.load(Ordering::Relaxed)
	}

	/// Returns the number of STS role assumptions sent.
	pub fn role_assumptions(&self) -> u64 {
		self.role_assumptions.load(Ordering::Relaxed)
	}

	/// Returns the number of Selling Partner API requests sent (retries included).
	pub fn api_calls(&self) -> u64 {
		self.api_calls.load(Ordering::Relaxed)
	}

	/// Returns the number of HTTP 429 responses received.
	pub fn throttled(&self) -> u64 {
		self.throttled.load(Ordering::Relaxed)
	}

	/// Returns the total number of network exchanges of any kind.
	pub fn network_calls(&self) -> u64 {
		self.lwa_exchanges() + self.role_assumptions() + self.api_calls()
	}

	pub(crate) fn record_lwa_exchange(&self) {
		self.lwa_exchanges.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_role_assumption(&self) {
		self.role_assumptions.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_api_call(&self) {
		self.api_calls.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_throttled(&self) {
		self.throttled.fetch_add(1, Ordering::Relaxed);
	}
}
