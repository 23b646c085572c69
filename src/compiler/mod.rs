//! Compiles flow specs into physical plans over a continuously synchronized flow graph.

mod metrics;

pub use metrics::{
    COMPILATION_DURATION_SECONDS, COMPILATIONS_FAILED_TOTAL, COMPILATIONS_SUCCEEDED_TOTAL,
    CompilerMetrics,
};

use crate::config::{MonitorConfig, PropertyLoader, PullFileLoader};
use crate::error::{CompileError, ConfigError};
use crate::graph::{DataNodeFactory, FactoryRegistry, FlowEdgeFactory, FlowGraph};
use crate::monitor::{DiffSource, DirectoryDiffSource, GraphMonitor};
use crate::pathfinder::FlowGraphPathFinder;
use crate::plan::PhysicalPlan;
use crate::spec::Spec;
use crate::template::TemplateCatalog;
use prometheus::Registry;
use std::sync::Arc;
use std::time::Instant;

pub struct CompilerBuilder {
    config: MonitorConfig,
    catalog: Option<Arc<dyn TemplateCatalog>>,
    source: Option<Arc<dyn DiffSource>>,
    loader: Option<Arc<dyn PropertyLoader>>,
    factories: FactoryRegistry,
    registry: Option<Registry>,
}

impl CompilerBuilder {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            catalog: None,
            source: None,
            loader: None,
            factories: FactoryRegistry::new(),
            registry: None,
        }
    }

    /// Required. Resolves the template URIs declared on edges.
    pub fn with_template_catalog(mut self, catalog: Arc<dyn TemplateCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Defaults to a `DirectoryDiffSource` over the repository working copy.
    pub fn with_diff_source(mut self, source: Arc<dyn DiffSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Defaults to a `PullFileLoader` rooted at the flow-graph directory.
    pub fn with_property_loader(mut self, loader: Arc<dyn PropertyLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn with_type_mapping(mut self, user_class: &str, builtin_class: &str) -> Self {
        self.factories = self.factories.with_type_mapping(user_class, builtin_class);
        self
    }

    pub fn with_node_factory(mut self, factory: Box<dyn DataNodeFactory>) -> Self {
        self.factories.register_node_factory(factory);
        self
    }

    pub fn with_edge_factory(mut self, factory: Box<dyn FlowEdgeFactory>) -> Self {
        self.factories.register_edge_factory(factory);
        self
    }

    /// Exports the compiler metrics through `registry`.
    pub fn with_metrics_registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<MultiHopCompiler, ConfigError> {
        self.config.validate()?;
        let catalog = self
            .catalog
            .ok_or_else(|| ConfigError::MissingSetting("template_catalog".to_string()))?;

        let metrics = CompilerMetrics::new()?;
        if let Some(registry) = &self.registry {
            metrics.register(registry)?;
        }

        let config = self.config;
        let source = self
            .source
            .unwrap_or_else(|| Arc::new(DirectoryDiffSource::new(config.repository_dir.clone())));
        let loader = self.loader.unwrap_or_else(|| {
            Arc::new(PullFileLoader::new(
                config.flowgraph_root(),
                config.properties_extensions.clone(),
                config.conf_extensions.clone(),
            ))
        });

        let graph = Arc::new(FlowGraph::new());
        tracing::debug!(
            repository = config.repository_uri.as_deref().unwrap_or_default(),
            branch = %config.branch,
            flowgraph_dir = %config.flowgraph_dir,
            "Building multi-hop compiler"
        );
        let monitor = Arc::new(GraphMonitor::new(
            config,
            Arc::clone(&graph),
            source,
            loader,
            Arc::new(self.factories),
            Arc::clone(&catalog),
        ));

        Ok(MultiHopCompiler {
            graph,
            catalog,
            monitor,
            metrics,
        })
    }
}

/// Turns flow specs into multi-hop physical plans.
///
/// The compiler owns the flow graph and the monitor that keeps it current. Compiles
/// work on a snapshot of the graph and may run concurrently with each other and with
/// the monitor's poll loop.
pub struct MultiHopCompiler {
    graph: Arc<FlowGraph>,
    catalog: Arc<dyn TemplateCatalog>,
    monitor: Arc<GraphMonitor>,
    metrics: CompilerMetrics,
}

impl MultiHopCompiler {
    pub fn builder(config: MonitorConfig) -> CompilerBuilder {
        CompilerBuilder::new(config)
    }

    /// Compiles a flow spec into one job per hop. Any other kind of spec is rejected.
    pub fn compile(&self, spec: &Spec) -> Result<PhysicalPlan, CompileError> {
        let Spec::Flow(flow_spec) = spec else {
            self.metrics.record_failure();
            tracing::warn!(kind = spec.kind(), "Rejecting spec that is not a flow spec");
            return Err(CompileError::UnsupportedSpec(spec.kind().to_string()));
        };

        let start = Instant::now();
        let snapshot = self.graph.snapshot();
        let result =
            FlowGraphPathFinder::new(&snapshot, self.catalog.as_ref(), flow_spec).find_path();

        match result {
            Ok(plan) => {
                self.metrics.record_success(start.elapsed());
                tracing::info!(
                    flow_group = %flow_spec.group,
                    flow_name = %flow_spec.name,
                    hops = plan.len(),
                    "Compiled flow"
                );
                Ok(plan)
            }
            Err(e) => {
                self.metrics.record_failure();
                tracing::warn!(
                    flow_group = %flow_spec.group,
                    flow_name = %flow_spec.name,
                    "Failed to compile flow: {}",
                    e
                );
                Err(e.into())
            }
        }
    }

    /// Turns synchronization on or off. Compiles keep working either way.
    pub fn set_active(&self, active: bool) {
        self.monitor.set_active(active);
    }

    pub fn is_active(&self) -> bool {
        self.monitor.is_active()
    }

    /// Starts the monitor's poll loop on the current tokio runtime.
    pub fn start(&self) {
        self.monitor.start();
    }

    pub async fn shutdown(&self) {
        self.monitor.shutdown().await;
    }

    pub fn flow_graph(&self) -> &Arc<FlowGraph> {
        &self.graph
    }

    pub fn monitor(&self) -> &Arc<GraphMonitor> {
        &self.monitor
    }

    pub fn metrics(&self) -> &CompilerMetrics {
        &self.metrics
    }
}

impl Drop for MultiHopCompiler {
    fn drop(&mut self) {
        self.monitor.stop();
    }
}
