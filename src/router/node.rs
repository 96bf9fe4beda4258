use crate::controller::{Action, Method};
use crate::router::params;
use crate::router::pipeline::{Pipeline, Runtime};
use crate::router::scan::SubResource;
use axum::Router;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{MethodRouter, any};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What a method does at a directory's `/` route.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub(crate) method: Method,
    pub(crate) steps: Vec<(Method, Action)>,
    pub(crate) view: Option<PathBuf>,
}

impl Endpoint {
    pub fn method(&self) -> Method {
        self.method
    }

    /// Controller methods invoked, in order.
    pub fn handlers(&self) -> Vec<Method> {
        self.steps.iter().map(|(method, _)| *method).collect()
    }

    pub fn view(&self) -> Option<&Path> {
        self.view.as_deref()
    }
}

/// A nested sub-resource and its planned subtree.
#[derive(Debug, Clone)]
pub struct ChildNode {
    pub resource: SubResource,
    pub node: RouteNode,
}

/// The planned router for one directory, before it is wired into axum.
#[derive(Debug, Clone)]
pub struct RouteNode {
    pub(crate) directory: PathBuf,
    pub(crate) key: String,
    pub(crate) endpoints: Vec<Endpoint>,
    pub(crate) fallback: Option<Action>,
    pub(crate) children: Vec<ChildNode>,
}

impl RouteNode {
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The directory's controller registry key.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn endpoint(&self, method: Method) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.method == method)
    }

    /// Methods with something registered at `/`, in wiring order.
    pub fn methods(&self) -> Vec<Method> {
        self.fallback
            .as_ref()
            .map(|_| Method::All)
            .into_iter()
            .chain(self.endpoints.iter().map(|e| e.method))
            .collect()
    }

    pub fn children(&self) -> &[ChildNode] {
        &self.children
    }

    pub fn child(&self, dir_name: &str) -> Option<&RouteNode> {
        self.children
            .iter()
            .find(|c| c.resource.dir_name() == dir_name)
            .map(|c| &c.node)
    }

    /// True if neither this directory nor anything below it serves a route.
    pub fn is_empty(&self) -> bool {
        self.fallback.is_none()
            && self.endpoints.is_empty()
            && self.children.iter().all(|c| c.node.is_empty())
    }

    /// Every route of the subtree as `"METHOD /path"`, parents first.
    pub fn routes(&self) -> Vec<String> {
        let mut routes = Vec::new();
        self.collect_routes("", &mut routes);
        routes
    }

    fn collect_routes(&self, prefix: &str, routes: &mut Vec<String>) {
        let path = if prefix.is_empty() { "/" } else { prefix };
        for method in self.methods() {
            routes.push(format!("{} {path}", method.to_string().to_uppercase()));
        }
        for child in &self.children {
            let child_prefix = format!("{prefix}{}", child.resource.route_path());
            child.node.collect_routes(&child_prefix, routes);
        }
    }

    /// True if at least one parameterized child serves something, so
    /// requests for empty static siblings must be kept away from it.
    fn has_param_group(&self) -> bool {
        self.children
            .iter()
            .any(|c| c.resource.param().is_some() && !c.node.is_empty())
    }

    /// Paths the wired router answers, relative to this directory, with every
    /// parameter segment written as `{}`. Two routers can be merged only if
    /// these sets are disjoint.
    pub(crate) fn wired_paths(&self) -> BTreeSet<String> {
        let mut paths = BTreeSet::new();
        self.collect_wired("", &mut paths);
        paths
    }

    fn collect_wired(&self, prefix: &str, paths: &mut BTreeSet<String>) {
        if !self.methods().is_empty() {
            paths.insert(if prefix.is_empty() { "/".to_string() } else { prefix.to_string() });
        }
        let guard_statics = self.has_param_group();
        for child in &self.children {
            let path = match &child.resource {
                SubResource::Static { name } => format!("{prefix}/{name}"),
                SubResource::Parameterized { .. } => format!("{prefix}/{{}}"),
            };
            if !child.node.is_empty() {
                child.node.collect_wired(&path, paths);
            } else if guard_statics && child.resource.param().is_none() {
                paths.insert(path);
            }
        }
    }

    pub(crate) fn into_router(self, runtime: &Arc<Runtime>) -> Router {
        self.wire(runtime, 0)
    }

    fn wire(self, runtime: &Arc<Runtime>, depth: usize) -> Router {
        let directory: Arc<str> = Arc::from(self.key.as_str());
        let guard_statics = self.has_param_group();
        let mut router = Router::new();

        if self.fallback.is_some() || !self.endpoints.is_empty() {
            let mut methods = MethodRouter::new();
            for endpoint in self.endpoints {
                let Some(filter) = endpoint.method.filter() else {
                    continue;
                };
                let pipeline = Arc::new(Pipeline::new(
                    Arc::clone(runtime),
                    Arc::clone(&directory),
                    endpoint.method,
                    endpoint.steps,
                    endpoint.view,
                ));
                methods = methods.on(filter, move |request: Request| {
                    Arc::clone(&pipeline).run(request)
                });
            }
            if let Some(all) = self.fallback {
                // Methods without their own endpoint still run `all`.
                let pipeline = Arc::new(Pipeline::new(
                    Arc::clone(runtime),
                    Arc::clone(&directory),
                    Method::All,
                    vec![(Method::All, all)],
                    None,
                ));
                methods = methods.fallback(move |request: Request| {
                    Arc::clone(&pipeline).run(request)
                });
            }
            router = router.route("/", methods);
        }

        let capture: Arc<str> = Arc::from(params::capture_name(depth));
        let mut param_group: Option<Router> = None;
        for child in self.children {
            if child.node.is_empty() {
                if guard_statics && child.resource.param().is_none() {
                    // Keeps the parameter sibling from capturing this name.
                    router = router.route(
                        &child.resource.route_path(),
                        any(|| async { StatusCode::NOT_FOUND }),
                    );
                } else {
                    tracing::debug!(directory = %child.node.directory.display(), "skipping empty subtree");
                }
                continue;
            }

            let child_router = child.node.wire(runtime, depth + 1);
            match child.resource.param() {
                None => router = router.nest(&child.resource.route_path(), child_router),
                Some(param) => {
                    let bound = child_router.layer(middleware::from_fn(params::binder(
                        Arc::clone(&capture),
                        Arc::from(param),
                    )));
                    param_group = Some(match param_group {
                        Some(group) => group.merge(bound),
                        None => bound,
                    });
                }
            }
        }

        if let Some(group) = param_group {
            router = router.nest(&format!("/{{{capture}}}"), group);
        }

        router
    }
}
