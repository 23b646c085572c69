//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the flowroute
//! crate, so a caller can build a compiler and submit flows with a single import.
//!
//! # Example
//!
//! ```rust,no_run
//! use flowroute::prelude::*;
//! use std::sync::Arc;
//!
//! # fn run_example() -> Result<()> {
//! let config = MonitorConfig::new("file:///srv/topology", "/srv/topology");
//! let compiler = MultiHopCompiler::builder(config)
//!     .with_template_catalog(Arc::new(InMemoryTemplateCatalog::new()))
//!     .build()?;
//!
//! let spec = FlowSpec::new("group", "name", "nodeA", "nodeB");
//! match compiler.compile(&Spec::Flow(spec)) {
//!     Ok(plan) => println!("{} hop(s)", plan.len()),
//!     Err(CompileError::NoPath { .. }) => println!("no route yet"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

// Compilation
pub use crate::compiler::{CompilerBuilder, MultiHopCompiler};
pub use crate::pathfinder::FlowGraphPathFinder;
pub use crate::plan::{Dag, JobSpecWithExecutor, PhysicalPlan};
pub use crate::spec::{FlowSpec, JobSpec, Spec};

// Topology
pub use crate::graph::{Capability, DataNode, FlowEdge, FlowGraph, SpecExecutor};
pub use crate::monitor::{
    ChangeOutcome, DiffEntry, DiffSource, DirectoryDiffSource, GraphMonitor, InMemoryDiffSource,
    SyncReport,
};
pub use crate::template::{
    DatasetDescriptor, FlowTemplate, FsTemplateCatalog, InMemoryTemplateCatalog, TemplateCatalog,
};

// Configuration
pub use crate::config::{MonitorConfig, Properties};

// Error types
pub use crate::error::{CompileError, ConfigError, PathFinderError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
