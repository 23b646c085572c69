//! # flowroute - Multi-hop Flow Compilation over a Versioned Flow Graph
//!
//! **flowroute** keeps an in-memory graph of data nodes and flow edges in step with a
//! version-controlled topology directory, and compiles logical transfer requests into
//! physical plans: one job per hop, each bound to the executor chosen to run it.
//!
//! ## Core Workflow
//!
//! 1.  **Describe the Topology**: Lay out property files in the repository,
//!     `<flowgraph>/<node>/<node>.properties` for nodes and
//!     `<flowgraph>/<source>/<destination>/<edge>.properties` for edges.
//! 2.  **Build a Compiler**: Use `MultiHopCompiler::builder` with a `MonitorConfig` and a
//!     `TemplateCatalog`. The compiler owns the flow graph and the monitor that syncs it.
//! 3.  **Synchronize**: Call `set_active(true)` and `start()` to poll the repository on an
//!     interval, or drive single cycles through `monitor().poll_once()`.
//! 4.  **Compile**: Hand a `Spec::Flow` to `compile`. The result is a `PhysicalPlan`, or a
//!     `CompileError` telling an unknown endpoint apart from a missing path.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowroute::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<()> {
//! let config = MonitorConfig::new("git@example.com:topology.git", "/var/lib/flowroute/topology");
//! let catalog = Arc::new(FsTemplateCatalog::new("/var/lib/flowroute/templates"));
//!
//! let compiler = MultiHopCompiler::builder(config)
//!     .with_template_catalog(catalog)
//!     .build()?;
//!
//! // Apply the current state of the topology once, then keep it in sync.
//! compiler.monitor().poll_once().await;
//! compiler.set_active(true);
//! compiler.start();
//!
//! let spec = FlowSpec::new("ingest", "daily-events", "hdfs-prod", "adls-archive");
//! let plan = compiler.compile(&Spec::Flow(spec))?;
//! for hop in plan.values() {
//!     println!("{} via {}", hop.job_spec.uri, hop.executor.class);
//! }
//!
//! compiler.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod graph;
pub mod monitor;
pub mod pathfinder;
pub mod plan;
pub mod prelude;
pub mod spec;
pub mod template;
