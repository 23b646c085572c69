use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a compiler or monitor. These are fatal at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Required setting '{0}' is missing")]
    MissingSetting(String),

    #[error("Setting '{key}' has an invalid value '{value}': {message}")]
    InvalidSetting {
        key: String,
        value: String,
        message: String,
    },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Failed to register compiler metrics: {0}")]
    Metrics(String),
}

/// Errors raised by a node or edge factory while turning properties into a typed element.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FactoryError {
    #[error("Required property '{0}' is missing")]
    MissingProperty(String),

    #[error("No factory is registered for class '{0}'")]
    UnknownClass(String),

    #[error("Property '{key}' has an invalid value '{value}'")]
    InvalidProperty { key: String, value: String },

    #[error("Template check failed: {0}")]
    Template(#[from] TemplateError),
}

/// Errors raised while reading a node, edge or template file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Could not read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed line {line} in '{path}': {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error(transparent)]
    Factory(#[from] FactoryError),
}

/// Errors raised by a template catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Template '{0}' was not found in the catalog")]
    NotFound(String),

    #[error("Template URI '{0}' is not supported by this catalog")]
    UnsupportedUri(String),

    #[error("Template '{uri}' could not be loaded: {message}")]
    Invalid { uri: String, message: String },
}

/// Errors raised by a diff source when the repository cannot be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Repository at '{0}' is unavailable")]
    Unavailable(String),

    #[error("Failed to read repository changes: {0}")]
    Read(String),
}

/// Errors raised by the path finder. These are reported, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathFinderError {
    #[error("Data node '{0}' is not present in the flow graph")]
    UnknownEndpoint(String),

    #[error("No feasible path from '{source_id}' to '{destination_id}'")]
    NoPath {
        source_id: String,
        destination_id: String,
    },

    #[error("Template lookup failed: {0}")]
    Template(TemplateError),
}

/// The failure signal handed back to callers of `MultiHopCompiler::compile`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Compiler only accepts flow specs, received a {0} spec")]
    UnsupportedSpec(String),

    #[error("Unknown endpoint '{0}'")]
    UnknownEndpoint(String),

    #[error("No path from '{source_id}' to '{destination_id}'")]
    NoPath {
        source_id: String,
        destination_id: String,
    },

    #[error("Internal compiler error: {0}")]
    Internal(String),
}

impl From<PathFinderError> for CompileError {
    fn from(err: PathFinderError) -> Self {
        match err {
            PathFinderError::UnknownEndpoint(id) => CompileError::UnknownEndpoint(id),
            PathFinderError::NoPath {
                source_id,
                destination_id,
            } => CompileError::NoPath {
                source_id,
                destination_id,
            },
            PathFinderError::Template(e) => CompileError::Internal(e.to_string()),
        }
    }
}

/// Errors raised while persisting or loading a compiled plan.
#[derive(Error, Debug, Clone)]
pub enum PlanError {
    #[error("Plan error: {0}")]
    Generic(String),
}
