//! Round-robin API key rotation on quota exhaustion.
//!
//! A [`KeyPool`] is an ordered list of interchangeable keys for one provider and
//! a [`KeyCursor`] remembers which key is believed to still have quota. Work is
//! run through [`with_rotation`], which starts at the cursor, moves on only when
//! the provider reports [`ErrorKind::QuotaExhausted`](crate::error::ErrorKind),
//! and leaves the cursor on the key that last succeeded.

use crate::error::{Error, Provider, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPool {
    provider: Provider,
    keys: Vec<String>,
}

impl KeyPool {
    pub fn new(provider: Provider, keys: Vec<String>) -> Self {
        let keys = keys
            .into_iter()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .collect();
        Self { provider, keys }
    }

    pub fn empty(provider: Provider) -> Self {
        Self {
            provider,
            keys: Vec::new(),
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Swap in a freshly loaded key list. Returns `true` when the list changed.
    pub fn replace(&mut self, keys: Vec<String>) -> bool {
        let fresh = Self::new(self.provider, keys);
        let changed = fresh.keys != self.keys;
        self.keys = fresh.keys;
        changed
    }
}

/// Shared "current key" index. Clones observe the same cell.
#[derive(Debug, Clone, Default)]
pub struct KeyCursor(Arc<AtomicUsize>);

impl KeyCursor {
    pub fn new(index: usize) -> Self {
        Self(Arc::new(AtomicUsize::new(index)))
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self, index: usize) {
        self.0.store(index, Ordering::Release);
    }

    /// Move from `from` to `to` unless another task already moved the cursor.
    fn advance(&self, from: usize, to: usize) -> bool {
        self.0
            .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Indices in the order they are tried: the pool rotated so `start` comes first.
pub fn trial_order(start: usize, len: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    (0..len).map(|offset| (start + offset) % len).collect()
}

/// Run `work` with one key at a time until it succeeds, fails with something
/// other than quota exhaustion, or every key has been tried.
///
/// The cursor is moved to each candidate before the work runs so callers can
/// display the key in use. Advancement is a compare-and-swap from the key that
/// just failed, so concurrent callers never drag the cursor back onto a key
/// another caller already found exhausted.
pub async fn with_rotation<T, F, Fut>(pool: &KeyPool, cursor: &KeyCursor, mut work: F) -> Result<T>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let provider = pool.provider();
    if pool.is_empty() {
        return Err(Error::EmptyPool { provider });
    }

    let snapshot = cursor.get();
    let mut expected = snapshot;
    let order = trial_order(snapshot % pool.len(), pool.len());
    let tried = order.len();

    for index in order {
        if !cursor.advance(expected, index) {
            debug!(%provider, index, "key cursor moved by a concurrent task");
        }
        expected = index;

        match work(pool.keys[index].clone()).await {
            Ok(value) => {
                if index != snapshot {
                    info!(%provider, index, "switched to API key #{}", index + 1);
                }
                return Ok(value);
            }
            Err(err) if err.is_quota() => {
                warn!(%provider, index, "API key #{} exhausted, trying next key", index + 1);
            }
            Err(err) => return Err(err),
        }
    }

    warn!(%provider, tried, "every API key is out of quota");
    Err(Error::AllCredentialsExhausted { provider, tried })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use futures::future::ready;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    fn pool(n: usize) -> KeyPool {
        KeyPool::new(
            Provider::YouTube,
            (0..n).map(|i| format!("key-{i}")).collect(),
        )
    }

    fn quota() -> Error {
        Error::api(ErrorKind::QuotaExhausted, "quotaExceeded")
    }

    #[test]
    fn trial_order_wraps_around() {
        assert_eq!(trial_order(2, 4), vec![2, 3, 0, 1]);
        assert_eq!(trial_order(0, 1), vec![0]);
        assert!(trial_order(0, 0).is_empty());
    }

    #[test]
    fn pool_drops_blank_keys() {
        let pool = KeyPool::new(Provider::Ai, vec![" a ".into(), "".into(), "  ".into()]);
        assert_eq!(pool.keys(), &["a".to_string()]);
    }

    #[test]
    fn replace_reports_changes() {
        let mut pool = pool(2);
        assert!(!pool.replace(vec!["key-0".into(), "key-1".into()]));
        assert!(pool.replace(vec!["other".into()]));
        assert_eq!(pool.len(), 1);
    }

    #[tokio::test]
    async fn tries_every_key_once_then_reports_exhaustion() {
        let pool = pool(4);
        let cursor = KeyCursor::new(2);
        let tried = RefCell::new(Vec::new());

        let result: Result<()> = with_rotation(&pool, &cursor, |key| {
            tried.borrow_mut().push(key);
            ready(Err(quota()))
        })
        .await;

        assert!(matches!(
            result,
            Err(Error::AllCredentialsExhausted {
                provider: Provider::YouTube,
                tried: 4
            })
        ));
        assert_eq!(
            tried.into_inner(),
            vec!["key-2", "key-3", "key-0", "key-1"]
        );
    }

    #[tokio::test]
    async fn success_after_quota_failures_sticks_to_the_working_key() {
        let pool = pool(5);
        let cursor = KeyCursor::new(3);
        let calls = RefCell::new(0);

        let result = with_rotation(&pool, &cursor, |key| {
            *calls.borrow_mut() += 1;
            if *calls.borrow() <= 2 {
                ready(Err(quota()))
            } else {
                ready(Ok(key))
            }
        })
        .await;

        assert_eq!(result.ok(), Some("key-0".to_string()));
        assert_eq!(cursor.get(), 0);
        assert_eq!(*calls.borrow(), 3);
    }

    #[tokio::test]
    async fn immediate_success_keeps_the_cursor() {
        let pool = pool(3);
        let cursor = KeyCursor::new(1);

        let result = with_rotation(&pool, &cursor, |key| ready(Ok(key))).await;

        assert_eq!(result.ok(), Some("key-1".to_string()));
        assert_eq!(cursor.get(), 1);
    }

    #[tokio::test]
    async fn non_quota_failure_stops_immediately() {
        let pool = pool(3);
        let cursor = KeyCursor::new(0);
        let calls = RefCell::new(0);

        let result: Result<()> = with_rotation(&pool, &cursor, |_| {
            *calls.borrow_mut() += 1;
            ready(Err(Error::api(ErrorKind::Transient, "connection reset")))
        })
        .await;

        assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::Transient));
        assert_eq!(*calls.borrow(), 1);
        assert_eq!(cursor.get(), 0);
    }

    #[tokio::test]
    async fn empty_pool_never_runs_the_work() {
        let pool = KeyPool::empty(Provider::Ai);
        let cursor = KeyCursor::default();
        let calls = RefCell::new(0);

        let result: Result<()> = with_rotation(&pool, &cursor, |_| {
            *calls.borrow_mut() += 1;
            ready(Ok(()))
        })
        .await;

        assert!(matches!(
            result,
            Err(Error::EmptyPool {
                provider: Provider::Ai
            })
        ));
        assert_eq!(*calls.borrow(), 0);
    }

    #[tokio::test]
    async fn out_of_range_cursor_wraps_into_the_pool() {
        let pool = pool(3);
        let cursor = KeyCursor::new(7);

        let result = with_rotation(&pool, &cursor, |key| ready(Ok(key))).await;

        assert_eq!(result.ok(), Some("key-1".to_string()));
        assert_eq!(cursor.get(), 1);
    }

    #[tokio::test]
    async fn does_not_overwrite_a_cursor_moved_by_another_task() {
        let pool = pool(3);
        let cursor = KeyCursor::new(0);
        let calls = RefCell::new(0);

        let result = with_rotation(&pool, &cursor, |key| {
            *calls.borrow_mut() += 1;
            if *calls.borrow() == 1 {
                // Another task found key 0 exhausted and already moved on to key 2.
                cursor.set(2);
                ready(Err(quota()))
            } else {
                ready(Ok(key))
            }
        })
        .await;

        assert_eq!(result.ok(), Some("key-1".to_string()));
        assert_eq!(cursor.get(), 2);
    }
}
