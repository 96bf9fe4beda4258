use crate::context::{MvcParams, RequestContext, ResponseHead};
use crate::controller::{Action, Method};
use crate::di::Injector;
use crate::error::RequestError;
use crate::exception::ExceptionFilter;
use crate::scope::{self, RequestScope, ScopeToken, deep_merge};
use crate::view::ViewEngine;
use crate::worker::WorkerPool;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Instrument;

/// Collaborators shared by every pipeline of one built tree.
pub(crate) struct Runtime {
    pub(crate) injector: Arc<Injector>,
    pub(crate) engine: Arc<dyn ViewEngine>,
    pub(crate) pool: WorkerPool,
    pub(crate) filter: Arc<dyn ExceptionFilter>,
    pub(crate) body_limit: usize,
}

/// Everything one `(directory, method)` pair does for a request: run the
/// controller actions in order, merging each settled result into the scope,
/// then render the view if there is one.
pub(crate) struct Pipeline {
    runtime: Arc<Runtime>,
    directory: Arc<str>,
    method: Method,
    steps: Vec<(Method, Action)>,
    view: Option<PathBuf>,
}

impl Pipeline {
    pub(crate) fn new(
        runtime: Arc<Runtime>,
        directory: Arc<str>,
        method: Method,
        steps: Vec<(Method, Action)>,
        view: Option<PathBuf>,
    ) -> Self {
        Self {
            runtime,
            directory,
            method,
            steps,
            view,
        }
    }

    pub(crate) async fn run(self: Arc<Self>, request: Request) -> Response {
        let token = ScopeToken::new();
        let span = tracing::info_span!(
            "mvc.request",
            scope = %token,
            method = %self.method,
            directory = %self.directory,
        );

        async move {
            match self.execute(token, request).await {
                Ok(response) => response,
                Err(error) => self.runtime.filter.catch(error),
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, token: ScopeToken, request: Request) -> Result<Response, RequestError> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, self.runtime.body_limit)
            .await
            .map_err(RequestError::Body)?;
        let params = parts
            .extensions
            .get::<MvcParams>()
            .cloned()
            .unwrap_or_default();
        let parts = Arc::new(parts);
        let head = ResponseHead::new();
        let mut scope = RequestScope::new(token);

        for (method, action) in &self.steps {
            tracing::debug!(step = %method, "invoking controller handler");
            let ctx = RequestContext::new(
                Arc::clone(&parts),
                body.clone(),
                params.clone(),
                Arc::new(scope.values().clone()),
                Arc::clone(&self.runtime.injector),
                head.clone(),
                token,
            );
            let pending = action
                .handler()
                .call(ctx)
                .await
                .map_err(|source| RequestError::Handler {
                    method: *method,
                    source,
                })?
                .unwrap_or_default();

            let resolved = scope::resolve(token, pending).await;
            scope.absorb(resolved)?;
        }

        let Some(view) = &self.view else {
            tracing::debug!("no view wired for this method");
            return Ok(head.apply(StatusCode::NOT_FOUND.into_response()));
        };

        let mut context = json!({ "params": params.to_value() });
        deep_merge(&mut context, Value::Object(scope.into_values()));

        let engine = Arc::clone(&self.runtime.engine);
        let view = view.clone();
        let html = self
            .runtime
            .pool
            .execute(move || engine.render(&view, &context))
            .await??;

        Ok(head.apply(Html(html).into_response()))
    }
}
