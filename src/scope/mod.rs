//! Per-request rendering scope.
//!
//! Controller handlers return a [`PendingResultSet`]; the [`resolver`]
//! settles it into a [`ResolvedScope`], which is then deep-merged into the
//! request's [`RequestScope`]. The view renders whatever the scope holds at
//! the end of the pipeline.

pub mod merge;
pub mod resolver;

pub use merge::deep_merge;
pub use resolver::{Pending, PendingResultSet, ResolvedScope, Settlement, resolve};

use crate::error::RequestError;
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Identifies the request a scope belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeToken(Uuid);

impl ScopeToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScopeToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScopeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Accumulated values for one request.
#[derive(Debug)]
pub struct RequestScope {
    token: ScopeToken,
    values: Map<String, Value>,
}

impl RequestScope {
    pub fn new(token: ScopeToken) -> Self {
        Self {
            token,
            values: Map::new(),
        }
    }

    pub fn token(&self) -> ScopeToken {
        self.token
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Merge a settled scope into this one.
    ///
    /// A scope resolved for another request is refused and leaves this scope
    /// untouched. Returns `Ok(false)` in that case.
    pub fn absorb(&mut self, resolved: ResolvedScope) -> Result<bool, RequestError> {
        if resolved.owner() != self.token {
            tracing::warn!(
                scope = %self.token,
                foreign = %resolved.owner(),
                "refusing to merge a scope resolved for another request"
            );
            return Ok(false);
        }
        merge::merge_maps(&mut self.values, resolved.into_fulfilled()?);
        Ok(true)
    }

    pub fn into_values(self) -> Map<String, Value> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_successive_handlers_merge_deeply() {
        let token = ScopeToken::new();
        let mut scope = RequestScope::new(token);

        let first = resolve(token, PendingResultSet::new().value("a", json!({"x": 1}))).await;
        let second = resolve(token, PendingResultSet::new().value("a", json!({"y": 2}))).await;
        assert!(scope.absorb(first).unwrap());
        assert!(scope.absorb(second).unwrap());

        assert_eq!(Value::Object(scope.into_values()), json!({"a": {"x": 1, "y": 2}}));
    }

    #[tokio::test]
    async fn test_foreign_scope_is_refused() {
        let mut scope = RequestScope::new(ScopeToken::new());
        let foreign = resolve(ScopeToken::new(), PendingResultSet::new().value("k", 1)).await;

        assert!(!scope.absorb(foreign).unwrap());
        assert!(scope.values().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_values_leave_scope_untouched() {
        let token = ScopeToken::new();
        let mut scope = RequestScope::new(token);
        let resolved = resolve(
            token,
            PendingResultSet::new().value("ok", 1).failed("bad", "nope"),
        )
        .await;

        assert!(scope.absorb(resolved).is_err());
        assert!(scope.values().is_empty());
    }
}
