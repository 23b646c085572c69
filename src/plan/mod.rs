//! The physical plan returned by the compiler.

use crate::error::PlanError;
use crate::graph::SpecExecutor;
use crate::spec::JobSpec;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

/// A job paired with the executor chosen to run it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpecWithExecutor {
    pub job_spec: JobSpec,
    pub executor: SpecExecutor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagNode<T> {
    pub value: T,
    /// Indices of the nodes that must complete before this one.
    pub parents: Vec<usize>,
    pub children: Vec<usize>,
}

/// A directed acyclic graph of values, stored in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dag<T> {
    nodes: Vec<DagNode<T>>,
}

/// One entry per traversed edge, in hop order.
pub type PhysicalPlan = Dag<JobSpecWithExecutor>;

impl<T> Default for Dag<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<T> Dag<T> {
    /// Links `values` into a single chain, each depending on the previous one.
    pub fn chain(values: impl IntoIterator<Item = T>) -> Self {
        let values: Vec<T> = values.into_iter().collect();
        let last = values.len().saturating_sub(1);
        let nodes = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| DagNode {
                value,
                parents: if i == 0 { Vec::new() } else { vec![i - 1] },
                children: if i < last { vec![i + 1] } else { Vec::new() },
            })
            .collect();
        Self { nodes }
    }

    pub fn nodes(&self) -> &[DagNode<T>] {
        &self.nodes
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.nodes.iter().map(|n| &n.value)
    }

    pub fn get(&self, index: usize) -> Option<&DagNode<T>> {
        self.nodes.get(index)
    }

    /// Nodes without parents.
    pub fn start_nodes(&self) -> Vec<&DagNode<T>> {
        self.nodes.iter().filter(|n| n.parents.is_empty()).collect()
    }

    /// Nodes without children.
    pub fn end_nodes(&self) -> Vec<&DagNode<T>> {
        self.nodes.iter().filter(|n| n.children.is_empty()).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<T: Serialize> Dag<T> {
    /// Saves the plan to a file using the bincode format.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PlanError> {
        let path = path.as_ref();
        let bytes = encode_to_vec(self, standard())
            .map_err(|e| PlanError::Generic(format!("Serialization failed: {}", e)))?;
        let mut file = fs::File::create(path).map_err(|e| {
            PlanError::Generic(format!("Could not create file '{}': {}", path.display(), e))
        })?;
        file.write_all(&bytes).map_err(|e| {
            PlanError::Generic(format!("Could not write to file '{}': {}", path.display(), e))
        })?;
        Ok(())
    }
}

impl<T: DeserializeOwned> Dag<T> {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let path = path.as_ref();
        let mut file = fs::File::open(path).map_err(|e| {
            PlanError::Generic(format!("Could not open file '{}': {}", path.display(), e))
        })?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| {
            PlanError::Generic(format!("Could not read from file '{}': {}", path.display(), e))
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PlanError> {
        decode_from_slice(bytes, standard())
            .map(|(dag, _)| dag)
            .map_err(|e| PlanError::Generic(format!("Deserialization failed: {}", e)))
    }
}
