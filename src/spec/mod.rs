//! Requests handed to the compiler and the per-hop job specs it produces.

use crate::config::Properties;
use crate::config::keys::{
    ANY, FLOW_DESTINATION_IDENTIFIER_KEY, FLOW_GROUP_KEY, FLOW_INPUT_FORMAT_KEY, FLOW_NAME_KEY,
    FLOW_OUTPUT_FORMAT_KEY, FLOW_SOURCE_IDENTIFIER_KEY,
};
use crate::error::FactoryError;
use serde::{Deserialize, Serialize};

/// Anything a caller may submit for compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Spec {
    Flow(FlowSpec),
    Job(JobSpec),
}

impl Spec {
    pub fn kind(&self) -> &'static str {
        match self {
            Spec::Flow(_) => "flow",
            Spec::Job(_) => "job",
        }
    }
}

impl From<FlowSpec> for Spec {
    fn from(spec: FlowSpec) -> Self {
        Spec::Flow(spec)
    }
}

impl From<JobSpec> for Spec {
    fn from(spec: JobSpec) -> Self {
        Spec::Job(spec)
    }
}

/// A logical request to move data from one node to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSpec {
    pub group: String,
    pub name: String,
    pub source: String,
    pub destination: String,
    /// Format the data is read in at the source. `*` accepts any.
    pub input_format: String,
    /// Format the data must have at the destination. `*` accepts any.
    pub output_format: String,
    /// Overrides applied on top of every hop's template config.
    pub config: Properties,
}

impl FlowSpec {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            source: source.into(),
            destination: destination.into(),
            input_format: ANY.to_string(),
            output_format: ANY.to_string(),
            config: Properties::new(),
        }
    }

    pub fn with_input_format(mut self, format: impl Into<String>) -> Self {
        self.input_format = format.into();
        self
    }

    pub fn with_output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = format.into();
        self
    }

    pub fn with_config(mut self, config: Properties) -> Self {
        self.config = config;
        self
    }

    /// Reads a flow spec from `flow.*` properties. The whole set is kept as flow config.
    pub fn from_properties(props: &Properties) -> Result<Self, FactoryError> {
        Ok(Self {
            group: props.require(FLOW_GROUP_KEY)?.to_string(),
            name: props.require(FLOW_NAME_KEY)?.to_string(),
            source: props.require(FLOW_SOURCE_IDENTIFIER_KEY)?.to_string(),
            destination: props.require(FLOW_DESTINATION_IDENTIFIER_KEY)?.to_string(),
            input_format: props.get_or(FLOW_INPUT_FORMAT_KEY, ANY).to_string(),
            output_format: props.get_or(FLOW_OUTPUT_FORMAT_KEY, ANY).to_string(),
            config: props.clone(),
        })
    }
}

/// A single executable job: one hop of a compiled flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    /// `<group>/<name>/<edge id>`
    pub uri: String,
    pub template_uri: String,
    pub description: String,
    pub config: Properties,
}

impl JobSpec {
    pub fn new(uri: impl Into<String>, template_uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            template_uri: template_uri.into(),
            description: String::new(),
            config: Properties::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_config(mut self, config: Properties) -> Self {
        self.config = config;
        self
    }
}
