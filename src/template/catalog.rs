use super::FlowTemplate;
use crate::config::Properties;
use crate::error::TemplateError;
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;

const FS_SCHEME: &str = "FS://";

/// Resolves template URIs to templates.
pub trait TemplateCatalog: Send + Sync {
    fn get_template(&self, uri: &str) -> Result<Arc<FlowTemplate>, TemplateError>;
}

/// A catalog held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryTemplateCatalog {
    templates: DashMap<String, Arc<FlowTemplate>>,
}

impl InMemoryTemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(self, template: FlowTemplate) -> Self {
        self.add_template(template);
        self
    }

    pub fn add_template(&self, template: FlowTemplate) {
        self.templates.insert(template.uri.clone(), Arc::new(template));
    }

    pub fn remove_template(&self, uri: &str) -> bool {
        self.templates.remove(uri).is_some()
    }
}

impl TemplateCatalog for InMemoryTemplateCatalog {
    fn get_template(&self, uri: &str) -> Result<Arc<FlowTemplate>, TemplateError> {
        self.templates
            .get(uri)
            .map(|t| Arc::clone(t.value()))
            .ok_or_else(|| TemplateError::NotFound(uri.to_string()))
    }
}

/// A catalog backed by template files below a root directory.
///
/// `FS:///copy/flow.conf` resolves to `<root>/copy/flow.conf`. Templates are read
/// on every lookup so edits show up without a restart.
#[derive(Debug, Clone)]
pub struct FsTemplateCatalog {
    root: PathBuf,
}

impl FsTemplateCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, uri: &str) -> Result<PathBuf, TemplateError> {
        let relative = uri
            .strip_prefix(FS_SCHEME)
            .ok_or_else(|| TemplateError::UnsupportedUri(uri.to_string()))?
            .trim_start_matches('/');
        if relative.is_empty() || relative.split('/').any(|part| part == "..") {
            return Err(TemplateError::UnsupportedUri(uri.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl TemplateCatalog for FsTemplateCatalog {
    fn get_template(&self, uri: &str) -> Result<Arc<FlowTemplate>, TemplateError> {
        let path = self.resolve(uri)?;
        let text = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TemplateError::NotFound(uri.to_string()),
            _ => TemplateError::Invalid {
                uri: uri.to_string(),
                message: e.to_string(),
            },
        })?;
        let props = Properties::parse(&text, &path).map_err(|e| TemplateError::Invalid {
            uri: uri.to_string(),
            message: e.to_string(),
        })?;
        Ok(Arc::new(FlowTemplate::from_properties(uri, &props)))
    }
}
