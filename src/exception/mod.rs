use crate::error::RequestError;
use axum::response::Response;

pub mod http;

pub use http::HttpExceptionFilter;

/// Turns a failed request pipeline into a response.
///
/// Handler failures, rejected scope values and render errors all end up
/// here; nothing is rendered for the failed request otherwise.
pub trait ExceptionFilter: Send + Sync + 'static {
    fn catch(&self, error: RequestError) -> Response;
}
