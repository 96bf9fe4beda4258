//! Controllers: per-directory bindings from HTTP method to handler.
//!
//! A controller never produces the response itself. Its handlers contribute
//! values to the request scope, and the directory's view renders the result.
//!
//! ```
//! use dirmvc::{Controller, PendingResultSet, RequestContext};
//!
//! let home = Controller::new().get(|_ctx: RequestContext| async move {
//!     Ok(Some(PendingResultSet::new().value("title", "Home")))
//! });
//! assert_eq!(home.len(), 1);
//! ```

mod registry;

pub use registry::ControllerRegistry;

use crate::context::RequestContext;
use crate::scope::PendingResultSet;
use async_trait::async_trait;
use axum::routing::MethodFilter;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use strum_macros::{Display, EnumIter, IntoStaticStr};

/// A type-erased error for controller handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// What a handler produces. `None` counts as an empty scope.
pub type HandlerResult = Result<Option<PendingResultSet>, HandlerError>;

/// Methods a controller can bind, in wiring order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Method {
    /// Runs for every HTTP method, before the method-specific handler.
    All,
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    /// The axum filter for this method. `All` has none: it is wired as the
    /// method router's fallback.
    pub fn filter(self) -> Option<MethodFilter> {
        match self {
            Method::All => None,
            Method::Get => Some(MethodFilter::GET),
            Method::Put => Some(MethodFilter::PUT),
            Method::Post => Some(MethodFilter::POST),
            Method::Delete => Some(MethodFilter::DELETE),
        }
    }

    /// Methods that can render a view.
    pub fn renders(self) -> bool {
        self != Method::All
    }
}

/// A controller handler.
///
/// Closures are accepted directly by the [`Controller`] shorthands; implement
/// this trait for handlers that carry their own state.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn call(&self, ctx: RequestContext) -> HandlerResult;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn call(&self, ctx: RequestContext) -> HandlerResult {
        (self.0)(ctx).await
    }
}

/// A handler plus the optional name of the view it renders instead of the
/// directory default.
#[derive(Clone)]
pub struct Action {
    handler: Arc<dyn Handler>,
    view: Option<String>,
}

impl Action {
    pub fn new(handler: impl Handler) -> Self {
        Self {
            handler: Arc::new(handler),
            view: None,
        }
    }

    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::new(FnHandler(f))
    }

    /// Render `view` (relative to the directory) instead of the default view.
    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    pub fn view(&self) -> Option<&str> {
        self.view.as_deref()
    }

    pub(crate) fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("view", &self.view)
            .finish_non_exhaustive()
    }
}

/// Method bindings for one directory. Each method holds at most one action;
/// binding a method again replaces the earlier action.
#[derive(Debug, Clone, Default)]
pub struct Controller {
    actions: BTreeMap<Method, Action>,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, method: Method, action: Action) -> Self {
        if self.actions.insert(method, action).is_some() {
            tracing::debug!(%method, "controller action replaced");
        }
        self
    }

    pub fn all<F, Fut>(self, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(Method::All, Action::from_fn(f))
    }

    pub fn get<F, Fut>(self, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(Method::Get, Action::from_fn(f))
    }

    pub fn put<F, Fut>(self, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(Method::Put, Action::from_fn(f))
    }

    pub fn post<F, Fut>(self, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(Method::Post, Action::from_fn(f))
    }

    pub fn delete<F, Fut>(self, f: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(Method::Delete, Action::from_fn(f))
    }

    pub fn action(&self, method: Method) -> Option<&Action> {
        self.actions.get(&method)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    async fn noop(_ctx: RequestContext) -> HandlerResult {
        Ok(None)
    }

    #[test]
    fn test_wiring_order() {
        let order: Vec<&'static str> = Method::iter().map(Into::into).collect();
        assert_eq!(order, vec!["all", "get", "put", "post", "delete"]);
        assert_eq!(Method::Delete.to_string(), "delete");
    }

    #[test]
    fn test_all_bound_once() {
        let controller = Controller::new().all(noop).all(noop).get(noop);
        assert_eq!(controller.len(), 2);
        assert!(controller.action(Method::All).is_some());
    }

    #[test]
    fn test_view_attribute() {
        let controller =
            Controller::new().on(Method::Post, Action::from_fn(noop).with_view("created.html"));
        assert_eq!(
            controller.action(Method::Post).and_then(Action::view),
            Some("created.html")
        );
        assert_eq!(controller.action(Method::Get).and_then(Action::view), None);
    }

    #[test]
    fn test_filters() {
        assert!(Method::All.filter().is_none());
        assert!(!Method::All.renders());
        assert_eq!(Method::Post.filter(), Some(MethodFilter::POST));
    }
}
