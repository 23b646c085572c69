use super::edge::FlowEdge;
use super::node::DataNode;
use ahash::AHashMap;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::BTreeSet;
use std::sync::Arc;

/// The in-memory graph of data nodes and flow edges.
///
/// Nodes and edges live in two independent maps keyed by id, so edges may refer to
/// nodes that have not been added yet. Writes to one key are serialized by the map's
/// shard lock; reads of other keys proceed concurrently.
#[derive(Debug, Default)]
pub struct FlowGraph {
    nodes: DashMap<String, Arc<DataNode>>,
    edges: DashMap<String, Arc<FlowEdge>>,
    // Source node id -> ids of the edges leaving it, kept sorted for stable iteration.
    out_edges: DashMap<String, BTreeSet<String>>,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `node` unless a node with the same id exists. The first writer is kept.
    pub fn add_data_node(&self, node: DataNode) -> bool {
        match self.nodes.entry(node.id.clone()) {
            Entry::Occupied(_) => {
                tracing::warn!(node_id = %node.id, "Data node already present; keeping existing value");
                false
            }
            Entry::Vacant(slot) => {
                tracing::debug!(node_id = %node.id, platform = %node.platform, "Adding data node");
                slot.insert(Arc::new(node));
                true
            }
        }
    }

    /// Removes a node. Edges referring to it are left in place and become unreachable.
    pub fn remove_data_node(&self, node_id: &str) -> bool {
        if self.nodes.remove(node_id).is_none() {
            return false;
        }
        let dangling = self
            .edges
            .iter()
            .filter(|e| e.source == node_id || e.destination == node_id)
            .count();
        if dangling > 0 {
            tracing::warn!(
                node_id,
                dangling,
                "Removed data node that is still referenced by flow edges"
            );
        } else {
            tracing::debug!(node_id, "Removed data node");
        }
        true
    }

    /// Adds `edge` unless an edge with the same id exists.
    pub fn add_flow_edge(&self, edge: FlowEdge) -> bool {
        let (id, source) = (edge.id.clone(), edge.source.clone());
        match self.edges.entry(id.clone()) {
            Entry::Occupied(_) => {
                tracing::warn!(edge_id = %id, "Flow edge already present; keeping existing value");
                return false;
            }
            Entry::Vacant(slot) => {
                tracing::debug!(edge_id = %id, "Adding flow edge");
                slot.insert(Arc::new(edge));
            }
        }
        self.out_edges.entry(source).or_default().insert(id);
        true
    }

    /// Inserts `node`, replacing any node with the same id in a single map write.
    /// Returns true if a previous value was replaced.
    pub fn upsert_data_node(&self, node: DataNode) -> bool {
        let id = node.id.clone();
        let replaced = self.nodes.insert(id.clone(), Arc::new(node)).is_some();
        tracing::debug!(node_id = %id, replaced, "Upserted data node");
        replaced
    }

    /// Inserts `edge`, replacing any edge with the same id in a single map write.
    /// Returns true if a previous value was replaced.
    pub fn upsert_flow_edge(&self, edge: FlowEdge) -> bool {
        let (id, source) = (edge.id.clone(), edge.source.clone());
        self.out_edges
            .entry(source.clone())
            .or_default()
            .insert(id.clone());
        let previous = self.edges.insert(id.clone(), Arc::new(edge));
        if let Some(old) = &previous {
            if old.source != source {
                if let Some(mut ids) = self.out_edges.get_mut(&old.source) {
                    ids.remove(&id);
                }
                self.out_edges.remove_if(&old.source, |_, ids| ids.is_empty());
            }
        }
        tracing::debug!(edge_id = %id, replaced = previous.is_some(), "Upserted flow edge");
        previous.is_some()
    }

    pub fn remove_flow_edge(&self, edge_id: &str) -> bool {
        let Some((_, edge)) = self.edges.remove(edge_id) else {
            return false;
        };
        if let Some(mut ids) = self.out_edges.get_mut(&edge.source) {
            ids.remove(edge_id);
        }
        self.out_edges
            .remove_if(&edge.source, |_, ids| ids.is_empty());
        tracing::debug!(edge_id, "Removed flow edge");
        true
    }

    pub fn get_data_node(&self, node_id: &str) -> Option<Arc<DataNode>> {
        self.nodes.get(node_id).map(|n| Arc::clone(n.value()))
    }

    pub fn get_flow_edge(&self, edge_id: &str) -> Option<Arc<FlowEdge>> {
        self.edges.get(edge_id).map(|e| Arc::clone(e.value()))
    }

    pub fn contains_data_node(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    pub fn contains_flow_edge(&self, edge_id: &str) -> bool {
        self.edges.contains_key(edge_id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges leaving `node_id`, ordered by edge id.
    pub fn neighbors(&self, node_id: &str) -> Vec<Arc<FlowEdge>> {
        let ids: Vec<String> = self
            .out_edges
            .get(node_id)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default();
        ids.iter().filter_map(|id| self.get_flow_edge(id)).collect()
    }

    /// Copies the graph into an owned, immutable view for path finding.
    pub fn snapshot(&self) -> GraphSnapshot {
        let nodes: AHashMap<String, Arc<DataNode>> = self
            .nodes
            .iter()
            .map(|n| (n.key().clone(), Arc::clone(n.value())))
            .collect();

        let mut adjacency: AHashMap<String, Vec<Arc<FlowEdge>>> = AHashMap::new();
        for edge in self.edges.iter() {
            adjacency
                .entry(edge.source.clone())
                .or_default()
                .push(Arc::clone(edge.value()));
        }
        for edges in adjacency.values_mut() {
            edges.sort_by(|a, b| a.id.cmp(&b.id));
        }

        GraphSnapshot { nodes, adjacency }
    }
}

/// A point-in-time copy of a `FlowGraph`.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    nodes: AHashMap<String, Arc<DataNode>>,
    adjacency: AHashMap<String, Vec<Arc<FlowEdge>>>,
}

impl GraphSnapshot {
    pub fn node(&self, node_id: &str) -> Option<&Arc<DataNode>> {
        self.nodes.get(node_id)
    }

    pub fn neighbors(&self, node_id: &str) -> &[Arc<FlowEdge>] {
        self.adjacency
            .get(node_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }
}
