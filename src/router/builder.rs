use crate::config::Conventions;
use crate::controller::{Action, Controller, ControllerRegistry, Method};
use crate::di::Injector;
use crate::error::{MvcError, Result};
use crate::exception::{ExceptionFilter, HttpExceptionFilter};
use crate::router::node::{ChildNode, Endpoint, RouteNode};
use crate::router::pipeline::Runtime;
use crate::router::scan;
use crate::view::{MiniJinjaEngine, ViewEngine};
use crate::worker::WorkerPool;
use axum::Router;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use strum::IntoEnumIterator;

/// Builds a router from a directory tree.
///
/// Every directory becomes a route segment. Its controller (looked up in the
/// [`ControllerRegistry`] by the directory's path relative to the root)
/// contributes handlers, and its view file renders the merged scope.
///
/// ```no_run
/// use dirmvc::{Controller, ControllerRegistry, Injector, PendingResultSet, RequestContext, RouteTreeBuilder};
/// use std::sync::Arc;
///
/// let controllers = ControllerRegistry::new().register(
///     "",
///     Controller::new().get(|_ctx: RequestContext| async move {
///         Ok(Some(PendingResultSet::new().value("title", "Home")))
///     }),
/// );
/// let router = RouteTreeBuilder::new(Arc::new(Injector::new()))
///     .controllers(controllers)
///     .build("./mvc".as_ref())
///     .expect("mvc tree");
/// ```
pub struct RouteTreeBuilder {
    injector: Arc<Injector>,
    controllers: ControllerRegistry,
    engine: Option<Arc<dyn ViewEngine>>,
    pool: Option<WorkerPool>,
    filter: Arc<dyn ExceptionFilter>,
    conventions: Conventions,
}

impl RouteTreeBuilder {
    pub fn new(injector: Arc<Injector>) -> Self {
        Self {
            injector,
            controllers: ControllerRegistry::new(),
            engine: None,
            pool: None,
            filter: Arc::new(HttpExceptionFilter),
            conventions: Conventions::default(),
        }
    }

    pub fn controllers(mut self, controllers: ControllerRegistry) -> Self {
        self.controllers = controllers;
        self
    }

    /// Use `engine` for views. Defaults to a [`MiniJinjaEngine`] rooted at
    /// the directory being built.
    pub fn view_engine(self, engine: impl ViewEngine) -> Self {
        self.shared_view_engine(Arc::new(engine))
    }

    pub fn shared_view_engine(mut self, engine: Arc<dyn ViewEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn worker_pool(mut self, pool: WorkerPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn exception_filter(self, filter: impl ExceptionFilter) -> Self {
        self.shared_exception_filter(Arc::new(filter))
    }

    pub fn shared_exception_filter(mut self, filter: Arc<dyn ExceptionFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn conventions(mut self, conventions: Conventions) -> Self {
        self.conventions = conventions;
        self
    }

    /// Scan `directory` recursively and plan its routes without wiring them.
    pub fn plan(&self, directory: &Path) -> Result<RouteNode> {
        let mut claimed = BTreeSet::new();
        let node = self.plan_directory(directory, String::new(), &mut claimed)?;

        for key in self.controllers.unclaimed(&claimed) {
            tracing::warn!(
                root = %directory.display(),
                directory = %key,
                "controller registered for a directory that does not exist"
            );
        }
        Ok(node)
    }

    /// Plan `directory` and wire the result into an axum router.
    pub fn build(&self, directory: &Path) -> Result<Router> {
        let node = self.plan(directory)?;
        for route in node.routes() {
            tracing::debug!(root = %directory.display(), %route, "planned route");
        }

        let runtime = Arc::new(Runtime {
            injector: Arc::clone(&self.injector),
            engine: self
                .engine
                .clone()
                .unwrap_or_else(|| Arc::new(MiniJinjaEngine::new(directory))),
            pool: self.pool.clone().unwrap_or_default(),
            filter: Arc::clone(&self.filter),
            body_limit: self.conventions.body_limit,
        });
        Ok(node.into_router(&runtime))
    }

    fn plan_directory(
        &self,
        directory: &Path,
        key: String,
        claimed: &mut BTreeSet<String>,
    ) -> Result<RouteNode> {
        let resources = scan::scan(directory, &self.conventions)?;

        let controller: Arc<Controller> = match self.controllers.get(&key) {
            Some(controller) => {
                claimed.insert(key.clone());
                controller
            }
            None => Arc::default(),
        };

        let fallback = controller.action(Method::All).cloned();
        let mut endpoints = Vec::new();
        for method in Method::iter().filter(|m| m.renders()) {
            let own = controller.action(method);
            let view_name = own
                .and_then(Action::view)
                .unwrap_or(&self.conventions.view_file_name);
            let view_path = directory.join(view_name);
            let view = view_path.is_file().then_some(view_path);

            if own.is_none() && view.is_none() {
                continue;
            }

            let mut steps = Vec::with_capacity(2);
            if let Some(all) = &fallback {
                steps.push((Method::All, all.clone()));
            }
            if let Some(own) = own {
                steps.push((method, own.clone()));
            }
            endpoints.push(Endpoint {
                method,
                steps,
                view,
            });
        }

        let mut children = Vec::with_capacity(resources.len());
        for resource in resources {
            let child_key = if key.is_empty() {
                resource.dir_name().to_string()
            } else {
                format!("{key}/{}", resource.dir_name())
            };
            let node =
                self.plan_directory(&directory.join(resource.dir_name()), child_key, claimed)?;
            children.push(ChildNode { resource, node });
        }

        check_parameter_siblings(directory, &children)?;

        Ok(RouteNode {
            directory: directory.to_path_buf(),
            key,
            endpoints,
            fallback,
            children,
        })
    }
}

/// Parameterized siblings are merged under one captured segment, which only
/// works while no two of them serve the same path.
fn check_parameter_siblings(directory: &Path, children: &[ChildNode]) -> Result<()> {
    let mut served: Vec<(&str, BTreeSet<String>)> = Vec::new();
    for child in children {
        if child.resource.param().is_none() || child.node.is_empty() {
            continue;
        }
        let paths = child.node.wired_paths();
        for (first, taken) in &served {
            if let Some(route) = taken.intersection(&paths).next() {
                return Err(MvcError::ConflictingParameters {
                    dir: directory.to_path_buf(),
                    first: first.to_string(),
                    second: child.resource.dir_name().to_string(),
                    route: route.clone(),
                });
            }
        }
        served.push((child.resource.dir_name(), paths));
    }
    Ok(())
}
