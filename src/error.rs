use axum::http::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

use crate::controller::{HandlerError, Method};
use crate::view::ViewError;

pub type Result<T> = std::result::Result<T, MvcError>;

/// Errors raised while building or mounting the route tree.
///
/// Every variant is startup-fatal: router topology is fixed once the tree is
/// built, so a partially mounted tree is never served.
#[derive(Debug, Error)]
pub enum MvcError {
    #[error("Failed to read directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error(
        "Parameter directories '{first}' and '{second}' in {} both serve the route '{route}'",
        .dir.display()
    )]
    ConflictingParameters {
        dir: PathBuf,
        first: String,
        second: String,
        route: String,
    },

    #[error("Invalid route segment '{name}' in {}: {reason}", .dir.display())]
    InvalidSegment {
        dir: PathBuf,
        name: String,
        reason: &'static str,
    },

    #[error("Invalid base route '{route}' for mount '{mount}': must start with '/'")]
    InvalidBaseRoute { mount: String, route: String },

    #[error("Mounts '{first}' and '{second}' share the base route '{route}'")]
    DuplicateBaseRoute {
        route: String,
        first: String,
        second: String,
    },

    #[error("Mount '{mount}' failed: {source}")]
    MountFailed {
        mount: String,
        #[source]
        source: Box<MvcError>,
    },

    #[error("Dependency not found: {type_name}")]
    DependencyNotFound { type_name: String },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Errors raised while serving a single request.
///
/// These never escape the router: the configured
/// [`ExceptionFilter`](crate::exception::ExceptionFilter) turns them into a
/// response.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Failed to read request body: {0}")]
    Body(#[source] axum::Error),

    #[error("Controller handler for {method} failed: {source}")]
    Handler {
        method: Method,
        #[source]
        source: HandlerError,
    },

    #[error("Scope values failed to settle: {}", describe_rejections(.rejected))]
    ScopeRejected { rejected: Vec<(String, String)> },

    #[error("Failed to render view: {0}")]
    Render(#[from] ViewError),

    #[error("Render worker dropped before completing")]
    WorkerGone,
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::Body(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn describe_rejections(rejected: &[(String, String)]) -> String {
    rejected
        .iter()
        .map(|(key, reason)| format!("{key} ({reason})"))
        .collect::<Vec<_>>()
        .join(", ")
}
