//! Reusable job templates and the catalog that resolves them.

mod catalog;

pub use catalog::{FsTemplateCatalog, InMemoryTemplateCatalog, TemplateCatalog};

use crate::config::Properties;
use crate::config::keys::{
    ANY, TEMPLATE_DESCRIPTION_KEY, TEMPLATE_INPUT_FORMAT_KEY, TEMPLATE_INPUT_PLATFORM_KEY,
    TEMPLATE_OUTPUT_FORMAT_KEY, TEMPLATE_OUTPUT_PLATFORM_KEY,
};
use serde::{Deserialize, Serialize};

/// Describes a dataset by the platform storing it and its format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    pub platform: String,
    pub format: String,
}

impl DatasetDescriptor {
    pub fn new(platform: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            format: format.into(),
        }
    }

    pub fn any() -> Self {
        Self::new(ANY, ANY)
    }

    /// A descriptor on `platform` that accepts any format.
    pub fn on_platform(platform: impl Into<String>) -> Self {
        Self::new(platform, ANY)
    }

    /// Two descriptors are compatible when platform and format each match or either side is `*`.
    pub fn is_compatible_with(&self, other: &DatasetDescriptor) -> bool {
        let matches = |a: &str, b: &str| a == ANY || b == ANY || a == b;
        matches(&self.platform, &other.platform) && matches(&self.format, &other.format)
    }
}

/// A reusable job template an edge is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowTemplate {
    pub uri: String,
    pub description: String,
    /// What the template can read.
    pub input: DatasetDescriptor,
    /// What the template writes.
    pub output: DatasetDescriptor,
    /// Job defaults copied into every job spec built from this template.
    pub config: Properties,
}

impl FlowTemplate {
    /// A template that accepts any input and output.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            description: String::new(),
            input: DatasetDescriptor::any(),
            output: DatasetDescriptor::any(),
            config: Properties::new(),
        }
    }

    pub fn with_input(mut self, input: DatasetDescriptor) -> Self {
        self.input = input;
        self
    }

    pub fn with_output(mut self, output: DatasetDescriptor) -> Self {
        self.output = output;
        self
    }

    pub fn with_config(mut self, config: Properties) -> Self {
        self.config = config;
        self
    }

    /// Builds a template from a template file. `template.*` keys describe the
    /// template, all remaining keys become job defaults.
    pub fn from_properties(uri: impl Into<String>, props: &Properties) -> Self {
        let input = DatasetDescriptor::new(
            props.get_or(TEMPLATE_INPUT_PLATFORM_KEY, ANY),
            props.get_or(TEMPLATE_INPUT_FORMAT_KEY, ANY),
        );
        let output = DatasetDescriptor::new(
            props.get_or(TEMPLATE_OUTPUT_PLATFORM_KEY, ANY),
            props.get_or(TEMPLATE_OUTPUT_FORMAT_KEY, ANY),
        );
        let config = props
            .iter()
            .filter(|(k, _)| !k.starts_with("template."))
            .collect();
        Self {
            uri: uri.into(),
            description: props.get_or(TEMPLATE_DESCRIPTION_KEY, "").to_string(),
            input,
            output,
            config,
        }
    }

    /// True if the template can read from `source` and write to `destination`.
    pub fn supports_hop(&self, source: &DatasetDescriptor, destination: &DatasetDescriptor) -> bool {
        self.input.is_compatible_with(source) && self.output.is_compatible_with(destination)
    }
}
