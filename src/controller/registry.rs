use crate::controller::Controller;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Explicit mapping from a directory to its controller.
///
/// Keys are the directory's path relative to the mount root, `/`-separated,
/// using the raw directory names: `""` is the root, `"users"` a static
/// child, `"users/-id"` a parameter directory below it.
///
/// ```
/// use dirmvc::{Controller, ControllerRegistry};
///
/// let registry = ControllerRegistry::new()
///     .register("", Controller::new())
///     .register("/users/-id/", Controller::new());
/// assert!(registry.get("users/-id").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ControllerRegistry {
    controllers: BTreeMap<String, Arc<Controller>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `controller` for the directory at `key`. Leading and trailing
    /// slashes are ignored. A later registration for the same key wins.
    pub fn register(mut self, key: impl AsRef<str>, controller: Controller) -> Self {
        let key = normalize_key(key.as_ref());
        if self
            .controllers
            .insert(key.clone(), Arc::new(controller))
            .is_some()
        {
            tracing::warn!(directory = %key, "controller registered twice, keeping the last");
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<Arc<Controller>> {
        self.controllers.get(&normalize_key(key)).cloned()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.controllers.keys().map(String::as_str)
    }

    /// Keys that do not appear in `claimed`.
    pub fn unclaimed<'a>(&'a self, claimed: &BTreeSet<String>) -> Vec<&'a str> {
        self.keys().filter(|key| !claimed.contains(*key)).collect()
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

pub(crate) fn normalize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
