//! Settles a set of possibly-asynchronous scope values.
//!
//! Every key of the input is present in the output. Deferred values run as
//! independent tasks and are all awaited, whether they succeed or fail; a
//! failure never cuts the others short.

use crate::controller::HandlerError;
use crate::error::RequestError;
use crate::scope::ScopeToken;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tokio::task::JoinHandle;

pub type DeferredValue = Pin<Box<dyn Future<Output = Result<Value, HandlerError>> + Send>>;

/// A single entry of a [`PendingResultSet`].
pub enum Pending {
    Ready(Value),
    /// Already settled as a failure.
    Failed(String),
    Deferred(DeferredValue),
}

impl fmt::Debug for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pending::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Pending::Failed(reason) => f.debug_tuple("Failed").field(reason).finish(),
            Pending::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// What a controller handler hands back: named values, some of which may
/// still be computing.
///
/// ```
/// use dirmvc::PendingResultSet;
/// use serde_json::json;
///
/// let set = PendingResultSet::new()
///     .value("title", "Users")
///     .deferred("users", async { Ok(json!(["ada", "grace"])) });
/// assert_eq!(set.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct PendingResultSet {
    entries: BTreeMap<String, Pending>,
}

impl PendingResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), Pending::Ready(value.into()));
        self
    }

    pub fn deferred<F>(mut self, key: impl Into<String>, future: F) -> Self
    where
        F: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        self.entries
            .insert(key.into(), Pending::Deferred(Box::pin(future)));
        self
    }

    pub fn failed(mut self, key: impl Into<String>, reason: impl Into<String>) -> Self {
        self.entries
            .insert(key.into(), Pending::Failed(reason.into()));
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, pending: Pending) {
        self.entries.insert(key.into(), pending);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl From<Map<String, Value>> for PendingResultSet {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            entries: map
                .into_iter()
                .map(|(key, value)| (key, Pending::Ready(value)))
                .collect(),
        }
    }
}

/// Outcome of one settled entry. `Rejected` is the failure marker and is
/// never confused with a real value.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Fulfilled(Value),
    Rejected(String),
}

impl Settlement {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Settlement::Fulfilled(_))
    }
}

/// A fully settled scope, bound to the request it was resolved for.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedScope {
    owner: ScopeToken,
    entries: BTreeMap<String, Settlement>,
}

impl ResolvedScope {
    pub fn owner(&self) -> ScopeToken {
        self.owner
    }

    pub fn get(&self, key: &str) -> Option<&Settlement> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rejected(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|(key, settlement)| match settlement {
            Settlement::Rejected(reason) => Some((key.as_str(), reason.as_str())),
            Settlement::Fulfilled(_) => None,
        })
    }

    /// Collapse into plain values. Any rejected key fails the whole scope,
    /// and the error names every rejected key.
    pub fn into_fulfilled(self) -> Result<Map<String, Value>, RequestError> {
        let rejected: Vec<(String, String)> = self
            .rejected()
            .map(|(key, reason)| (key.to_string(), reason.to_string()))
            .collect();
        if !rejected.is_empty() {
            return Err(RequestError::ScopeRejected { rejected });
        }

        Ok(self
            .entries
            .into_iter()
            .filter_map(|(key, settlement)| match settlement {
                Settlement::Fulfilled(value) => Some((key, value)),
                Settlement::Rejected(_) => None,
            })
            .collect())
    }
}

impl From<ResolvedScope> for PendingResultSet {
    fn from(resolved: ResolvedScope) -> Self {
        Self {
            entries: resolved
                .entries
                .into_iter()
                .map(|(key, settlement)| {
                    let pending = match settlement {
                        Settlement::Fulfilled(value) => Pending::Ready(value),
                        Settlement::Rejected(reason) => Pending::Failed(reason),
                    };
                    (key, pending)
                })
                .collect(),
        }
    }
}

/// Aborts every task still running when dropped, so a request that goes away
/// mid-resolution leaves nothing behind.
struct InFlight {
    tasks: Vec<(String, JoinHandle<Result<Value, HandlerError>>)>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        for (_, task) in &self.tasks {
            task.abort();
        }
    }
}

/// Settle every entry of `set` for the request identified by `owner`.
///
/// Must be called from within a tokio runtime.
pub async fn resolve(owner: ScopeToken, set: PendingResultSet) -> ResolvedScope {
    let mut entries = BTreeMap::new();
    let mut in_flight = InFlight { tasks: Vec::new() };

    for (key, pending) in set.entries {
        match pending {
            Pending::Ready(value) => {
                entries.insert(key, Settlement::Fulfilled(value));
            }
            Pending::Failed(reason) => {
                entries.insert(key, Settlement::Rejected(reason));
            }
            Pending::Deferred(future) => {
                in_flight.tasks.push((key, tokio::spawn(future)));
            }
        }
    }

    for (key, task) in in_flight.tasks.iter_mut() {
        let settlement = match task.await {
            Ok(Ok(value)) => Settlement::Fulfilled(value),
            Ok(Err(err)) => Settlement::Rejected(err.to_string()),
            Err(join_err) if join_err.is_panic() => {
                Settlement::Rejected("task panicked".to_string())
            }
            Err(join_err) => Settlement::Rejected(join_err.to_string()),
        };
        if let Settlement::Rejected(reason) = &settlement {
            tracing::warn!(scope = %owner, key = %key, reason = %reason, "scope value rejected");
        }
        entries.insert(std::mem::take(key), settlement);
    }

    ResolvedScope { owner, entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn boom() -> HandlerError {
        "boom".into()
    }

    #[tokio::test]
    async fn test_keeps_every_key_including_failures() {
        let token = ScopeToken::new();
        let set = PendingResultSet::new()
            .value("title", "Home")
            .deferred("users", async { Ok(json!(["ada"])) })
            .deferred("stats", async { Err(boom()) })
            .failed("legacy", "gone");

        let resolved = resolve(token, set).await;

        let keys: Vec<_> = resolved.keys().collect();
        assert_eq!(keys, vec!["legacy", "stats", "title", "users"]);
        assert_eq!(
            resolved.get("title"),
            Some(&Settlement::Fulfilled(json!("Home")))
        );
        assert_eq!(
            resolved.get("users"),
            Some(&Settlement::Fulfilled(json!(["ada"])))
        );
        assert_eq!(
            resolved.get("stats"),
            Some(&Settlement::Rejected("boom".to_string()))
        );
        assert_eq!(resolved.owner(), token);
    }

    #[tokio::test]
    async fn test_waits_for_slow_values_after_a_failure() {
        let set = PendingResultSet::new()
            .deferred("fast_fail", async { Err(boom()) })
            .deferred("slow", async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(json!(42))
            });

        let resolved = resolve(ScopeToken::new(), set).await;
        assert_eq!(resolved.get("slow"), Some(&Settlement::Fulfilled(json!(42))));
        assert!(!resolved.get("fast_fail").unwrap().is_fulfilled());
    }

    #[tokio::test]
    async fn test_panicking_value_is_rejected() {
        let set = PendingResultSet::new().deferred("bad", async {
            if true {
                panic!("exploded");
            }
            Ok(Value::Null)
        });
        let resolved = resolve(ScopeToken::new(), set).await;
        assert_eq!(
            resolved.get("bad"),
            Some(&Settlement::Rejected("task panicked".to_string()))
        );
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let token = ScopeToken::new();
        let set = PendingResultSet::new()
            .value("a", json!({"x": 1}))
            .deferred("b", async { Ok(json!("later")) })
            .deferred("c", async { Err(boom()) });

        let once = resolve(token, set).await;
        let twice = resolve(token, once.clone().into()).await;
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_into_fulfilled_reports_all_rejections() {
        let set = PendingResultSet::new()
            .value("ok", 1)
            .failed("one", "first")
            .failed("two", "second");
        let err = resolve(ScopeToken::new(), set)
            .await
            .into_fulfilled()
            .unwrap_err();
        match err {
            RequestError::ScopeRejected { rejected } => {
                assert_eq!(
                    rejected,
                    vec![
                        ("one".to_string(), "first".to_string()),
                        ("two".to_string(), "second".to_string()),
                    ]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_set() {
        let resolved = resolve(ScopeToken::new(), PendingResultSet::new()).await;
        assert!(resolved.is_empty());
        assert!(resolved.into_fulfilled().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_resolution_aborts_deferred_values() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let set = PendingResultSet::new().deferred("slow", async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(json!("late"))
        });

        let outcome =
            tokio::time::timeout(Duration::from_millis(10), resolve(ScopeToken::new(), set)).await;
        assert!(outcome.is_err());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }
}
