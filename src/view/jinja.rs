use crate::view::{ViewEngine, ViewError};
use minijinja::{AutoEscape, Environment, ErrorKind};
use serde_json::Value;
use std::io;
use std::path::{Component, Path, PathBuf};

/// [`ViewEngine`] backed by minijinja.
///
/// Views are loaded by absolute path on first use and cached for the life of
/// the engine. Names used by `{% include %}` / `{% extends %}` that are not
/// absolute resolve against `root`, usually the mount directory. Output is
/// HTML-escaped.
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.set_loader(move |name| load(&root, name));
        Self { env }
    }

    /// The underlying environment, for registering filters and globals.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }
}

fn load(root: &Path, name: &str) -> Result<Option<String>, minijinja::Error> {
    let requested = Path::new(name);
    let path = if requested.is_absolute() {
        requested.to_path_buf()
    } else {
        if requested
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Ok(None);
        }
        root.join(requested)
    };

    match std::fs::read_to_string(&path) {
        Ok(source) => Ok(Some(source)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("could not read template {}", path.display()),
        )
        .with_source(err)),
    }
}

impl ViewEngine for MiniJinjaEngine {
    fn render(&self, view: &Path, context: &Value) -> Result<String, ViewError> {
        let name = view.to_string_lossy();
        let template = self.env.get_template(&name).map_err(|source| {
            if source.kind() == ErrorKind::TemplateNotFound {
                ViewError::NotFound(name.to_string())
            } else {
                ViewError::Template {
                    view: name.to_string(),
                    source,
                }
            }
        })?;
        template.render(context).map_err(|source| ViewError::Template {
            view: name.to_string(),
            source,
        })
    }
}
