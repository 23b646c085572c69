//! Common test utilities for building topologies, catalogs and compilers.
#![allow(dead_code)]

use flowroute::monitor::InMemoryDiffSource;
use flowroute::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const FLOWGRAPH_DIR: &str = "flowgraph";
pub const COPY_TEMPLATE: &str = "FS:///copy";

/// A topology repository working copy in a temp directory.
pub struct TopologyRepo {
    dir: TempDir,
}

impl TopologyRepo {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `contents` to a repository-relative path and returns that path.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let full = self.root().join(relative);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full, contents).expect("Failed to write file");
        PathBuf::from(relative)
    }

    pub fn remove(&self, relative: &str) -> PathBuf {
        fs::remove_file(self.root().join(relative)).expect("Failed to remove file");
        PathBuf::from(relative)
    }

    pub fn config(&self) -> MonitorConfig {
        MonitorConfig::new("file:///topology.git", self.root()).with_flowgraph_dir(FLOWGRAPH_DIR)
    }
}

pub fn node_file(platform: &str) -> String {
    format!("data.node.class=base\ndata.node.platform={}\n", platform)
}

/// An edge file declaring one executor per `(class, capabilities)` pair, in order.
pub fn edge_file(template_uri: &str, executors: &[(&str, &str)]) -> String {
    let mut text = format!("flow.edge.flowTemplateUri={}\n", template_uri);
    for (i, (class, caps)) in executors.iter().enumerate() {
        text.push_str(&format!(
            "flow.edge.specExecutors.{i}.specExecInstance.class={class}\n\
             flow.edge.specExecutors.{i}.specExecInstance.capabilities={caps}\n"
        ));
    }
    text
}

/// A catalog with one template that accepts anything.
pub fn copy_catalog() -> Arc<InMemoryTemplateCatalog> {
    Arc::new(
        InMemoryTemplateCatalog::new().with_template(
            FlowTemplate::new(COPY_TEMPLATE)
                .with_config(Properties::new().with_value("job.class", "CopyJob")),
        ),
    )
}

/// A compiler fed by a hand-driven diff source.
pub fn build_compiler(
    repo: &TopologyRepo,
    catalog: Arc<InMemoryTemplateCatalog>,
) -> (MultiHopCompiler, Arc<InMemoryDiffSource>) {
    let source = Arc::new(InMemoryDiffSource::new());
    let compiler = MultiHopCompiler::builder(repo.config())
        .with_template_catalog(catalog)
        .with_diff_source(source.clone())
        .build()
        .expect("Failed to build compiler");
    (compiler, source)
}

pub fn hdfs_node(id: &str) -> DataNode {
    DataNode::new(id, "hdfs")
}

pub fn edge(source: &str, destination: &str, name: &str, executors: Vec<SpecExecutor>) -> FlowEdge {
    FlowEdge::new(source, destination, name, COPY_TEMPLATE, executors)
}

pub fn executor(class: &str, capabilities: &str) -> SpecExecutor {
    SpecExecutor::new(
        class,
        Capability::parse_list(capabilities).expect("Invalid capabilities"),
    )
}

pub fn flow(source: &str, destination: &str) -> FlowSpec {
    FlowSpec::new("test-group", "test-flow", source, destination)
}
