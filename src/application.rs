//! Application bootstrap
//!
//! Mounts one directory tree per configured entry under a single host
//! router. Any failing mount aborts the whole bootstrap: a server never
//! starts with part of its route tree missing.

use crate::config::{Conventions, MvcConfig, normalize_base_route};
use crate::controller::ControllerRegistry;
use crate::di::Injector;
use crate::error::{MvcError, Result};
use crate::exception::{ExceptionFilter, HttpExceptionFilter};
use crate::router::RouteTreeBuilder;
use crate::view::MiniJinjaEngine;
use crate::worker::WorkerPool;
use axum::Router;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// Builder for the host router.
///
/// # Example
///
/// ```rust,ignore
/// use dirmvc::{ConfigService, MvcApplication};
///
/// let config = ConfigService::from_env().mvc_config()?;
/// let router = MvcApplication::builder()
///     .injector(injector)
///     .controllers("default", controllers)
///     .build(&config, &std::env::current_dir()?)?;
/// ```
pub struct MvcApplication;

impl MvcApplication {
    pub fn builder() -> MvcApplicationBuilder {
        MvcApplicationBuilder::new()
    }
}

pub struct MvcApplicationBuilder {
    injector: Option<Injector>,
    controllers: HashMap<String, ControllerRegistry>,
    conventions: Conventions,
    filter: Arc<dyn ExceptionFilter>,
    pool: Option<WorkerPool>,
}

impl Default for MvcApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MvcApplicationBuilder {
    pub fn new() -> Self {
        Self {
            injector: None,
            controllers: HashMap::new(),
            conventions: Conventions::default(),
            filter: Arc::new(HttpExceptionFilter),
            pool: None,
        }
    }

    /// Set the injector shared by every mount. Defaults to an empty one.
    pub fn injector(mut self, injector: Injector) -> Self {
        self.injector = Some(injector);
        self
    }

    /// Controllers for the mount called `mount`.
    pub fn controllers(mut self, mount: impl Into<String>, registry: ControllerRegistry) -> Self {
        self.controllers.insert(mount.into(), registry);
        self
    }

    pub fn conventions(mut self, conventions: Conventions) -> Self {
        self.conventions = conventions;
        self
    }

    pub fn exception_filter(mut self, filter: impl ExceptionFilter) -> Self {
        self.filter = Arc::new(filter);
        self
    }

    pub fn worker_pool(mut self, pool: WorkerPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Build every mount of `config`, resolving relative mount paths
    /// against `cwd`.
    ///
    /// # Errors
    ///
    /// Returns the first mount that fails, wrapped in
    /// [`MvcError::MountFailed`], or a base route problem.
    pub fn build(mut self, config: &MvcConfig, cwd: &Path) -> Result<Router> {
        let injector = Arc::new(self.injector.take().unwrap_or_default());
        let pool = self.pool.take().unwrap_or_default();

        let mut base_routes: BTreeMap<String, &str> = BTreeMap::new();
        for (name, spec) in &config.mounts {
            let route = normalize_base_route(name, &spec.base_route)?;
            if let Some(first) = base_routes.insert(route.clone(), name) {
                return Err(MvcError::DuplicateBaseRoute {
                    route,
                    first: first.to_string(),
                    second: name.clone(),
                });
            }
        }

        for name in self.controllers.keys() {
            if !config.mounts.contains_key(name) {
                tracing::warn!(mount = %name, "controllers registered for an unknown mount");
            }
        }

        let mut app = Router::new();
        for (route, name) in base_routes {
            let spec = &config.mounts[name];
            let directory = cwd.join(&spec.path);
            let controllers = self.controllers.remove(name).unwrap_or_default();

            let mount = RouteTreeBuilder::new(Arc::clone(&injector))
                .controllers(controllers)
                .view_engine(MiniJinjaEngine::new(&directory))
                .worker_pool(pool.clone())
                .shared_exception_filter(Arc::clone(&self.filter))
                .conventions(self.conventions.clone())
                .build(&directory)
                .map_err(|source| MvcError::MountFailed {
                    mount: name.to_string(),
                    source: Box::new(source),
                })?;

            tracing::info!(
                mount = %name,
                directory = %directory.display(),
                base_route = %route,
                "mounted directory"
            );
            app = if route == "/" {
                app.merge(mount)
            } else {
                app.nest(&route, mount)
            };
        }

        Ok(app)
    }
}
