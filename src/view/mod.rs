//! Rendering boundary.
//!
//! The router only decides *which* file to render and with what context;
//! the template language belongs to the [`ViewEngine`].

mod jinja;

pub use jinja::MiniJinjaEngine;

use serde_json::Value;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Template {view} failed: {source}")]
    Template {
        view: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("Template {0} not found")]
    NotFound(String),
}

/// Renders a view file with a scope.
pub trait ViewEngine: Send + Sync + 'static {
    /// Render the view at `view` (an absolute path that existed when the
    /// router was built) with `context`.
    fn render(&self, view: &Path, context: &Value) -> Result<String, ViewError>;
}
