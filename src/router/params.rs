use crate::context::MvcParams;
use axum::extract::{RawPathParams, Request};
use axum::middleware::Next;
use axum::response::Response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

type BindFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Name of the route capture for a parameter segment `depth` segments below
/// the mount root.
///
/// Captures are named by position rather than by directory so that
/// parameterized siblings can share one segment, and a name repeated along a
/// path (`-id/-id`) still yields one capture per segment.
pub(crate) fn capture_name(depth: usize) -> String {
    format!("seg{depth}")
}

/// Middleware for a parameter directory: copies the segment captured as
/// `capture` into the request's [`MvcParams`] under `param` before the
/// nested router runs.
///
/// Binders run outermost first, so when a name repeats along a path the
/// innermost directory's value wins. Any value is accepted.
pub(crate) fn binder(
    capture: Arc<str>,
    param: Arc<str>,
) -> impl Fn(RawPathParams, Request, Next) -> BindFuture + Clone + Send + Sync + 'static {
    move |raw: RawPathParams, mut request: Request, next: Next| {
        let capture = Arc::clone(&capture);
        let param = Arc::clone(&param);
        Box::pin(async move {
            let value = raw
                .iter()
                .filter(|(name, _)| *name == &*capture)
                .last()
                .map(|(_, value)| value.to_string());

            match value {
                Some(value) => {
                    tracing::trace!(param = %param, value = %value, "bound path parameter");
                    let extensions = request.extensions_mut();
                    match extensions.get_mut::<MvcParams>() {
                        Some(params) => params.insert(param.as_ref(), value),
                        None => {
                            let mut params = MvcParams::new();
                            params.insert(param.as_ref(), value);
                            extensions.insert(params);
                        }
                    }
                }
                None => tracing::warn!(param = %param, "parameter missing from matched path"),
            }

            next.run(request).await
        })
    }
}
