//! # dirmvc
//!
//! Directory-driven MVC routing for axum.
//!
//! A directory tree is the route table. Every directory is a path segment,
//! a directory whose name starts with `-` captures a path parameter, and a
//! `view.html` file makes the directory render. Controllers registered by
//! directory key fill a per-request scope, possibly with values that settle
//! later, and the view renders the merged scope.
//!
//! ```text
//! mvc/
//! ├── view.html            GET /
//! └── users/
//!     ├── view.html        GET /users
//!     └── -id/
//!         └── view.html    GET /users/{id}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dirmvc::{Controller, ControllerRegistry, MvcApplication, MvcConfig, MountSpec, PendingResultSet};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let controllers = ControllerRegistry::new().register(
//!     "users/-id",
//!     Controller::new().get(|ctx| async move {
//!         let id = ctx.param("id").unwrap_or_default().to_string();
//!         Ok(Some(
//!             PendingResultSet::new()
//!                 .value("title", format!("User {id}"))
//!                 .deferred("posts", async move { Ok(serde_json::json!([])) }),
//!         ))
//!     }),
//! );
//!
//! let config = MvcConfig::new().mount("site", MountSpec::default());
//! let app = MvcApplication::builder()
//!     .controllers("site", controllers)
//!     .build(&config, &std::env::current_dir()?)?;
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod config;
pub mod context;
pub mod controller;
pub mod di;
pub mod error;
pub mod exception;
pub mod router;
pub mod scope;
pub mod shutdown;
pub mod view;
pub mod worker;

pub use application::{MvcApplication, MvcApplicationBuilder};
pub use config::{ConfigService, Conventions, MountSpec, MvcConfig};
pub use context::{MvcParams, RequestContext, ResponseHead};
pub use controller::{
    Action, Controller, ControllerRegistry, Handler, HandlerError, HandlerResult, Method,
};
pub use di::{Injector, InjectorBuilder};
pub use error::{MvcError, RequestError, Result};
pub use exception::{ExceptionFilter, HttpExceptionFilter};
pub use router::{RouteNode, RouteTreeBuilder};
pub use scope::{Pending, PendingResultSet, ScopeToken, Settlement};
pub use shutdown::shutdown_signal;
pub use view::{MiniJinjaEngine, ViewEngine, ViewError};
pub use worker::WorkerPool;

pub use async_trait::async_trait;
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use dirmvc::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Action, Controller, ControllerRegistry, Handler, HandlerError, HandlerResult, Injector,
        InjectorBuilder, Method, MvcApplication, MvcConfig, MountSpec, PendingResultSet,
        RequestContext,
    };
    pub use async_trait::async_trait;
    pub use serde_json::json;
    pub use std::sync::Arc;
}
