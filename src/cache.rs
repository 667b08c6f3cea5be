//! Single-flight cache for expiring credentials.
//!
//! [`TokenCache`] owns at most one live value. Readers take a cheap snapshot under a read
//! lock; when the snapshot is missing or stale, callers queue on an async guard so exactly
//! one of them performs the refresh while the rest re-check the cache and reuse the result.
//! Failed refreshes never touch the cached slot.

// self
use crate::_prelude::*;

/// Values with an absolute expiry instant.
pub trait Expiring {
	/// Instant after which the value must not be used.
	fn expires_at(&self) -> OffsetDateTime;

	/// Returns `true` while `now` is strictly before the expiry instant.
	fn is_fresh_at(&self, now: OffsetDateTime) -> bool {
		now < self.expires_at()
	}
}

/// Owned, lazily refreshed slot for one expiring value.
#[derive(Debug)]
pub struct TokenCache<T> {
	current: RwLock<Option<T>>,
	refresh_guard: AsyncMutex<()>,
}
impl<T> Default for TokenCache<T> {
	fn default() -> Self {
		Self { current: RwLock::new(None), refresh_guard: AsyncMutex::new(()) }
	}
}
impl<T> TokenCache<T>
where
	T: Clone + Expiring,
{
	/// Returns the cached value when it is still fresh at `now`.
	pub fn peek_at(&self, now: OffsetDateTime) -> Option<T> {
		self.current.read().as_ref().filter(|value| value.is_fresh_at(now)).cloned()
	}

	/// Returns the cached value, stale or not.
	pub fn snapshot(&self) -> Option<T> {
		self.current.read().clone()
	}

	/// Drops the cached value so the next caller refreshes.
	pub fn invalidate(&self) {
		self.current.write().take();
	}

	/// Returns the fresh cached value or runs `refresh` under the single-flight guard.
	///
	/// Concurrent callers that find the cache stale wait for the in-flight refresh and reuse
	/// its result. On error the previous value (if any) stays in place untouched.
	pub async fn get_or_refresh<F, Fut, E>(&self, refresh: F) -> Result<T, E>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<T, E>>,
	{
		if let Some(value) = self.peek_at(OffsetDateTime::now_utc()) {
			return Ok(value);
		}

		let _singleflight = self.refresh_guard.lock().await;

		if let Some(value) = self.peek_at(OffsetDateTime::now_utc()) {
			return Ok(value);
		}

		let fresh = refresh().await?;

		*self.current.write() = Some(fresh.clone());

		Ok(fresh)
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;

	#[derive(Clone, Debug, PartialEq)]
	struct Stamp {
		id: usize,
		expires_at: OffsetDateTime,
	}
	impl Expiring for Stamp {
		fn expires_at(&self) -> OffsetDateTime {
			self.expires_at
		}
	}

	fn stamp(id: usize, ttl: Duration) -> Stamp {
		Stamp { id, expires_at: OffsetDateTime::now_utc() + ttl }
	}

	#[tokio::test]
	async fn fresh_value_is_reused_without_refresh() {
		let cache = TokenCache::default();
		let calls = AtomicUsize::new(0);
		let refresh = || async {
			calls.fetch_add(1, Ordering::SeqCst);

			Ok::<_, ()>(stamp(1, Duration::minutes(5)))
		};
		let first = cache.get_or_refresh(refresh).await.expect("First refresh should succeed.");
		let second = cache
			.get_or_refresh(|| async { Ok::<_, ()>(stamp(2, Duration::minutes(5))) })
			.await
			.expect("Cached value should be returned.");

		assert_eq!(first, second);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn stale_value_triggers_refresh() {
		let cache = TokenCache::default();

		cache
			.get_or_refresh(|| async { Ok::<_, ()>(stamp(1, Duration::ZERO)) })
			.await
			.expect("Seeding refresh should succeed.");

		let refreshed = cache
			.get_or_refresh(|| async { Ok::<_, ()>(stamp(2, Duration::minutes(5))) })
			.await
			.expect("Stale value should be replaced.");

		assert_eq!(refreshed.id, 2);
	}

	#[tokio::test]
	async fn failed_refresh_leaves_previous_value() {
		let cache = TokenCache::default();

		cache
			.get_or_refresh(|| async { Ok::<_, &str>(stamp(1, Duration::ZERO)) })
			.await
			.expect("Seeding refresh should succeed.");

		let err = cache
			.get_or_refresh(|| async { Err::<Stamp, _>("denied") })
			.await
			.expect_err("Refresh failure should surface.");

		assert_eq!(err, "denied");
		assert_eq!(cache.snapshot().map(|value| value.id), Some(1));
		assert!(cache.peek_at(OffsetDateTime::now_utc()).is_none());
	}

	#[tokio::test]
	async fn concurrent_callers_share_one_refresh() {
		let cache = Arc::new(TokenCache::default());
		let calls = Arc::new(AtomicUsize::new(0));
		let task = |cache: Arc<TokenCache<Stamp>>, calls: Arc<AtomicUsize>| async move {
			cache
				.get_or_refresh(|| async {
					let id = calls.fetch_add(1, Ordering::SeqCst);

					tokio::time::sleep(std::time::Duration::from_millis(20)).await;

					Ok::<_, ()>(stamp(id, Duration::minutes(5)))
				})
				.await
		};
		let (a, b) = tokio::join!(
			task(cache.clone(), calls.clone()),
			task(cache.clone(), calls.clone())
		);

		assert_eq!(a, b);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn invalidate_clears_slot() {
		let cache = TokenCache::default();

		*cache.current.write() = Some(stamp(7, Duration::minutes(1)));

		assert!(cache.peek_at(OffsetDateTime::now_utc()).is_some());

		cache.invalidate();

		assert!(cache.snapshot().is_none());
	}
}
