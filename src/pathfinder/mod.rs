//! Searches a graph snapshot for a feasible sequence of hops between two nodes.

use crate::config::keys::{
    ANY, JOB_DESTINATION_NODE_KEY, JOB_EDGE_ID_KEY, JOB_HOP_INDEX_KEY, JOB_NAME_KEY,
    JOB_SOURCE_NODE_KEY,
};
use crate::error::{PathFinderError, TemplateError};
use crate::graph::{Capability, FlowEdge, GraphSnapshot, SpecExecutor};
use crate::plan::{Dag, JobSpecWithExecutor, PhysicalPlan};
use crate::spec::{FlowSpec, JobSpec};
use crate::template::{DatasetDescriptor, FlowTemplate, TemplateCatalog};
use ahash::AHashSet;
use std::sync::Arc;

/// An edge that passed every feasibility check, with what was resolved for it.
#[derive(Debug, Clone)]
struct Hop {
    edge: Arc<FlowEdge>,
    template: Arc<FlowTemplate>,
    executor: SpecExecutor,
    /// Format of the data after this hop ran.
    output_format: String,
}

/// Finds a path for one flow spec over one snapshot.
///
/// The search prefers a direct edge from source to destination. Failing that it
/// runs a depth-first search in neighbor order and returns the first feasible
/// path, not the shortest one. A path never visits a node twice and its length
/// is bounded by the number of nodes in the snapshot.
pub struct FlowGraphPathFinder<'a> {
    graph: &'a GraphSnapshot,
    catalog: &'a dyn TemplateCatalog,
    flow_spec: &'a FlowSpec,
}

impl<'a> FlowGraphPathFinder<'a> {
    pub fn new(
        graph: &'a GraphSnapshot,
        catalog: &'a dyn TemplateCatalog,
        flow_spec: &'a FlowSpec,
    ) -> Self {
        Self {
            graph,
            catalog,
            flow_spec,
        }
    }

    pub fn find_path(&self) -> Result<PhysicalPlan, PathFinderError> {
        let source = &self.flow_spec.source;
        let destination = &self.flow_spec.destination;
        for endpoint in [source, destination] {
            if self.graph.node(endpoint).is_none() {
                return Err(PathFinderError::UnknownEndpoint(endpoint.clone()));
            }
        }
        if source == destination {
            return Err(self.no_path());
        }

        if let Some(hop) = self.direct_hop()? {
            tracing::debug!(edge_id = %hop.edge.id, "Using direct edge");
            return Ok(self.build_plan(vec![hop]));
        }

        let mut visited = AHashSet::new();
        visited.insert(source.clone());
        let mut path = Vec::new();
        if self.search(source, &self.flow_spec.input_format, &mut visited, &mut path)? {
            tracing::debug!(
                hops = path.len(),
                source = %source,
                destination = %destination,
                "Found multi-hop path"
            );
            return Ok(self.build_plan(path));
        }
        Err(self.no_path())
    }

    fn no_path(&self) -> PathFinderError {
        PathFinderError::NoPath {
            source_id: self.flow_spec.source.clone(),
            destination_id: self.flow_spec.destination.clone(),
        }
    }

    fn direct_hop(&self) -> Result<Option<Hop>, PathFinderError> {
        let source = &self.flow_spec.source;
        for edge in self.graph.neighbors(source) {
            if edge.destination != self.flow_spec.destination {
                continue;
            }
            if let Some(hop) = self.feasible_hop(edge, &self.flow_spec.input_format)? {
                return Ok(Some(hop));
            }
        }
        Ok(None)
    }

    fn search(
        &self,
        node_id: &str,
        format: &str,
        visited: &mut AHashSet<String>,
        path: &mut Vec<Hop>,
    ) -> Result<bool, PathFinderError> {
        if path.len() >= self.graph.node_count() {
            return Ok(false);
        }
        for edge in self.graph.neighbors(node_id) {
            if visited.contains(&edge.destination) {
                continue;
            }
            let Some(hop) = self.feasible_hop(edge, format)? else {
                continue;
            };
            let next_format = hop.output_format.clone();
            path.push(hop);
            if edge.destination == self.flow_spec.destination {
                return Ok(true);
            }
            visited.insert(edge.destination.clone());
            if self.search(&edge.destination, &next_format, visited, path)? {
                return Ok(true);
            }
            // A node that dead-ends on this branch may still be reachable with another format.
            visited.remove(&edge.destination);
            path.pop();
        }
        Ok(false)
    }

    /// Checks one edge given the format of the data arriving at its source.
    fn feasible_hop(
        &self,
        edge: &Arc<FlowEdge>,
        format: &str,
    ) -> Result<Option<Hop>, PathFinderError> {
        if !edge.active {
            tracing::trace!(edge_id = %edge.id, "Skipping inactive edge");
            return Ok(None);
        }
        let (Some(src), Some(dst)) = (
            self.graph.node(&edge.source),
            self.graph.node(&edge.destination),
        ) else {
            tracing::trace!(edge_id = %edge.id, "Skipping edge with a missing endpoint");
            return Ok(None);
        };
        if !src.active || !dst.active {
            tracing::trace!(edge_id = %edge.id, "Skipping edge with an inactive endpoint");
            return Ok(None);
        }

        let template = match self.catalog.get_template(&edge.template_uri) {
            Ok(t) => t,
            Err(TemplateError::NotFound(uri)) => {
                tracing::debug!(edge_id = %edge.id, template = %uri, "Edge template no longer exists");
                return Ok(None);
            }
            Err(e) => return Err(PathFinderError::Template(e)),
        };

        let at_source = DatasetDescriptor::new(src.platform.as_str(), format);
        let wanted_format = if dst.id == self.flow_spec.destination {
            self.flow_spec.output_format.as_str()
        } else {
            ANY
        };
        let at_destination = DatasetDescriptor::new(dst.platform.as_str(), wanted_format);
        if !template.supports_hop(&at_source, &at_destination) {
            tracing::trace!(edge_id = %edge.id, template = %template.uri, "Template does not support hop");
            return Ok(None);
        }

        let required = Capability::new(src.platform.as_str(), dst.platform.as_str());
        let Some(executor) = edge.first_capable_executor(&required) else {
            tracing::trace!(edge_id = %edge.id, capability = %required, "No capable executor");
            return Ok(None);
        };

        let output_format = if template.output.format == ANY {
            format.to_string()
        } else {
            template.output.format.clone()
        };
        Ok(Some(Hop {
            edge: Arc::clone(edge),
            executor: executor.clone(),
            template,
            output_format,
        }))
    }

    fn build_plan(&self, hops: Vec<Hop>) -> PhysicalPlan {
        Dag::chain(
            hops.into_iter()
                .enumerate()
                .map(|(index, hop)| self.job_for_hop(index, hop)),
        )
    }

    fn job_for_hop(&self, index: usize, hop: Hop) -> JobSpecWithExecutor {
        let spec = self.flow_spec;
        let edge = &hop.edge;
        let job_name = format!("{}_{}_{}", spec.group, spec.name, edge.id);

        let mut config = hop.template.config.clone();
        config.merge(&spec.config);
        config.insert(JOB_NAME_KEY, job_name);
        config.insert(JOB_EDGE_ID_KEY, edge.id.as_str());
        config.insert(JOB_HOP_INDEX_KEY, index.to_string());
        config.insert(JOB_SOURCE_NODE_KEY, edge.source.as_str());
        config.insert(JOB_DESTINATION_NODE_KEY, edge.destination.as_str());

        let job_spec = JobSpec::new(
            format!("{}/{}/{}", spec.group, spec.name, edge.id),
            edge.template_uri.as_str(),
        )
        .with_description(hop.template.description.as_str())
        .with_config(config);

        JobSpecWithExecutor {
            job_spec,
            executor: hop.executor,
        }
    }
}
