use super::executor::{Capability, SpecExecutor};
use crate::config::Properties;
use serde::{Deserialize, Serialize};

/// A directed, named transfer path between two data nodes.
///
/// `source` and `destination` are plain ids; they are resolved against the graph
/// only when a path is searched, so an edge may be added before its endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub id: String,
    pub source: String,
    pub destination: String,
    pub name: String,
    pub class: String,
    pub template_uri: String,
    /// Candidate executors in order of preference.
    pub executors: Vec<SpecExecutor>,
    pub active: bool,
    pub properties: Properties,
}

impl FlowEdge {
    /// The identity of the edge `source -> destination` called `name`.
    pub fn edge_id(source: &str, destination: &str, name: &str) -> String {
        format!("{}_{}_{}", source, destination, name)
    }

    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        name: impl Into<String>,
        template_uri: impl Into<String>,
        executors: Vec<SpecExecutor>,
    ) -> Self {
        let (source, destination, name) = (source.into(), destination.into(), name.into());
        Self {
            id: Self::edge_id(&source, &destination, &name),
            source,
            destination,
            name,
            class: "base".to_string(),
            template_uri: template_uri.into(),
            executors,
            active: true,
            properties: Properties::new(),
        }
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// First executor, in declared order, able to serve `required`.
    pub fn first_capable_executor(&self, required: &Capability) -> Option<&SpecExecutor> {
        self.executors.iter().find(|e| e.supports(required))
    }
}
