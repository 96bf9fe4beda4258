use crate::config::Conventions;
use crate::error::{MvcError, Result};
use std::path::Path;
use walkdir::WalkDir;

/// A child directory, classified by its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubResource {
    /// Literal path segment named after the directory.
    Static { name: String },
    /// Path parameter; `param` is the directory name without the prefix.
    Parameterized { name: String, param: String },
}

impl SubResource {
    pub fn classify(name: &str, conventions: &Conventions) -> Self {
        match name.strip_prefix(conventions.param_prefix) {
            Some(param) => SubResource::Parameterized {
                name: name.to_string(),
                param: param.to_string(),
            },
            None => SubResource::Static {
                name: name.to_string(),
            },
        }
    }

    /// The directory name on disk.
    pub fn dir_name(&self) -> &str {
        match self {
            SubResource::Static { name } | SubResource::Parameterized { name, .. } => name,
        }
    }

    pub fn param(&self) -> Option<&str> {
        match self {
            SubResource::Parameterized { param, .. } => Some(param),
            SubResource::Static { .. } => None,
        }
    }

    /// Path the child router is nested at.
    pub fn route_path(&self) -> String {
        match self {
            SubResource::Static { name } => format!("/{name}"),
            SubResource::Parameterized { param, .. } => format!("/{{{param}}}"),
        }
    }
}

/// List the sub-resources of `dir`: every static child, then every
/// parameterized child, each group in file-name order.
///
/// Static segments must come first at every level, otherwise a parameter
/// segment would capture requests meant for a static sibling. Several
/// parameterized siblings share one captured segment when wired.
pub fn scan(dir: &Path, conventions: &Conventions) -> Result<Vec<SubResource>> {
    let mut statics = Vec::new();
    let mut params = Vec::new();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|source| MvcError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let Some(name) = entry.file_name().to_str() else {
            return Err(MvcError::InvalidSegment {
                dir: dir.to_path_buf(),
                name: entry.file_name().to_string_lossy().into_owned(),
                reason: "directory name is not valid UTF-8",
            });
        };

        if name.starts_with(conventions.hidden_prefix) {
            tracing::trace!(dir = %dir.display(), entry = name, "skipping hidden entry");
            continue;
        }
        if !entry.file_type().is_dir() {
            continue;
        }

        let resource = SubResource::classify(name, conventions);
        validate(dir, &resource)?;
        match resource {
            SubResource::Static { .. } => statics.push(resource),
            SubResource::Parameterized { .. } => params.push(resource),
        }
    }

    tracing::debug!(
        dir = %dir.display(),
        statics = statics.len(),
        params = params.len(),
        "scanned directory"
    );

    statics.append(&mut params);
    Ok(statics)
}

fn validate(dir: &Path, resource: &SubResource) -> Result<()> {
    let invalid = |reason| MvcError::InvalidSegment {
        dir: dir.to_path_buf(),
        name: resource.dir_name().to_string(),
        reason,
    };

    match resource {
        SubResource::Static { name } => {
            if name.contains(['{', '}']) {
                return Err(invalid("braces are reserved for route parameters"));
            }
        }
        SubResource::Parameterized { param, .. } => {
            if param.is_empty() {
                return Err(invalid("parameter name is empty"));
            }
            if param.contains(['{', '}']) || param.starts_with('*') {
                return Err(invalid("parameter name contains reserved characters"));
            }
        }
    }
    Ok(())
}
