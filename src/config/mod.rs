use crate::error::{MvcError, Result};
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

/// Naming rules for the directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conventions {
    /// Default view file, looked up in every directory.
    pub view_file_name: String,
    /// Marks a directory as a path parameter; the rest of the name is the
    /// parameter name.
    pub param_prefix: char,
    /// Entries starting with this are skipped.
    pub hidden_prefix: char,
    /// Largest request body handed to controller handlers.
    pub body_limit: usize,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            view_file_name: "view.html".to_string(),
            param_prefix: '-',
            hidden_prefix: '.',
            body_limit: 2 * 1024 * 1024,
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("./mvc")
}

fn default_base_route() -> String {
    "/".to_string()
}

/// Where a directory tree lives and where it is mounted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MountSpec {
    #[serde(default = "default_path")]
    pub path: PathBuf,
    #[serde(default = "default_base_route", rename = "baseRoute", alias = "base_route")]
    pub base_route: String,
}

impl Default for MountSpec {
    fn default() -> Self {
        Self {
            path: default_path(),
            base_route: default_base_route(),
        }
    }
}

/// Named mounts, as found in the host's `mvc` configuration section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct MvcConfig {
    pub mounts: BTreeMap<String, MountSpec>,
}

impl MvcConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(mut self, name: impl Into<String>, spec: MountSpec) -> Self {
        self.mounts.insert(name.into(), spec);
        self
    }

    /// Read the mounts from an already-parsed configuration section.
    ///
    /// ```
    /// use dirmvc::MvcConfig;
    /// use serde_json::json;
    ///
    /// let config = MvcConfig::from_section(json!({
    ///     "site": {"path": "./pages"},
    ///     "api": {"baseRoute": "/api"}
    /// }))
    /// .unwrap();
    /// assert_eq!(config.mounts["site"].base_route, "/");
    /// assert_eq!(config.mounts["api"].path.to_str(), Some("./mvc"));
    /// ```
    pub fn from_section(section: Value) -> Result<Self> {
        Ok(serde_json::from_value(section)?)
    }
}

/// Normalize a base route: leading slash required, trailing slash dropped.
pub fn normalize_base_route(mount: &str, route: &str) -> Result<String> {
    if !route.starts_with('/') {
        return Err(MvcError::InvalidBaseRoute {
            mount: mount.to_string(),
            route: route.to_string(),
        });
    }
    let trimmed = route.trim_end_matches('/');
    Ok(if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    })
}

/// Snapshot of process configuration values, keyed by name.
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let service = Self::default();
        for (key, value) in vars {
            service.config.insert(key.into(), value.into());
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    /// Mounts from `MVC_MOUNTS` (a JSON mount section) or, failing that, a
    /// single `default` mount from `MVC_PATH` and `MVC_BASE_ROUTE`.
    pub fn mvc_config(&self) -> Result<MvcConfig> {
        if let Some(raw) = self.get("MVC_MOUNTS") {
            let section: Value = serde_json::from_str(&raw)?;
            return MvcConfig::from_section(section);
        }

        let defaults = MountSpec::default();
        let spec = MountSpec {
            path: self.get("MVC_PATH").map(PathBuf::from).unwrap_or(defaults.path),
            base_route: self.get("MVC_BASE_ROUTE").unwrap_or(defaults.base_route),
        };
        Ok(MvcConfig::new().mount("default", spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mount_defaults_apply() {
        let config = MvcConfig::from_section(json!({"main": {}})).unwrap();
        assert_eq!(config.mounts["main"], MountSpec::default());
    }

    #[test]
    fn test_base_route_accepts_both_spellings() {
        let config = MvcConfig::from_section(json!({
            "a": {"baseRoute": "/a"},
            "b": {"base_route": "/b"}
        }))
        .unwrap();
        assert_eq!(config.mounts["a"].base_route, "/a");
        assert_eq!(config.mounts["b"].base_route, "/b");
    }

    #[test]
    fn test_base_routes_are_normalized() {
        assert_eq!(normalize_base_route("m", "/").unwrap(), "/");
        assert_eq!(normalize_base_route("m", "/app/").unwrap(), "/app");
        assert_eq!(normalize_base_route("m", "//").unwrap(), "/");
        assert!(matches!(
            normalize_base_route("m", "app"),
            Err(MvcError::InvalidBaseRoute { .. })
        ));
    }

    #[test]
    fn test_env_single_mount() {
        let service = ConfigService::from_vars([("MVC_PATH", "./site"), ("MVC_BASE_ROUTE", "/docs")]);
        let config = service.mvc_config().unwrap();
        assert_eq!(config.mounts["default"].path, PathBuf::from("./site"));
        assert_eq!(config.mounts["default"].base_route, "/docs");
    }

    #[test]
    fn test_env_mount_section() {
        let service = ConfigService::from_vars([(
            "MVC_MOUNTS",
            r#"{"api": {"path": "./api", "baseRoute": "/api"}, "site": {}}"#,
        )]);
        let config = service.mvc_config().unwrap();
        assert_eq!(config.mounts.len(), 2);
        assert_eq!(config.mounts["api"].path, PathBuf::from("./api"));
        assert_eq!(config.mounts["site"].base_route, "/");
    }

    #[test]
    fn test_invalid_mount_section() {
        let service = ConfigService::from_vars([("MVC_MOUNTS", "[1, 2]")]);
        assert!(matches!(service.mvc_config(), Err(MvcError::Config(_))));
    }

    #[test]
    fn test_get_or_falls_back() {
        let service = ConfigService::new();
        service.set("PORT", "8080");
        assert_eq!(service.get_or("PORT", "3000"), "8080");
        assert_eq!(service.get_or("HOST", "0.0.0.0"), "0.0.0.0");
    }
}
