//! The flow graph: data nodes, the flow edges between them and the factories
//! that build both from property files.

mod edge;
mod executor;
mod factory;
mod flow_graph;
mod node;

pub use edge::FlowEdge;
pub use executor::{Capability, SpecExecutor};
pub use factory::{DataNodeFactory, FactoryRegistry, FlowEdgeFactory};
pub use flow_graph::{FlowGraph, GraphSnapshot};
pub use node::DataNode;
