//! Keeps a `FlowGraph` in step with the topology repository.
//!
//! Each poll cycle asks the `DiffSource` for the changes made since the previous
//! cycle and applies them in order. A file is either applied whole or skipped;
//! no single bad file stops the cycle.

mod fs_source;
mod layout;
mod source;

pub use fs_source::DirectoryDiffSource;
pub use source::{ChangeType, DiffEntry, DiffSource, InMemoryDiffSource};

use crate::config::keys::{
    DATA_NODE_ID_KEY, FLOW_EDGE_DESTINATION_KEY, FLOW_EDGE_NAME_KEY, FLOW_EDGE_SOURCE_KEY,
};
use crate::config::{MonitorConfig, Properties, PropertyLoader};
use crate::error::LoadError;
use crate::graph::{DataNode, FactoryRegistry, FlowEdge, FlowGraph};
use crate::template::TemplateCatalog;
use layout::PathClass;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Why a change was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// A conf-extension file. These only contribute overlays to other files.
    OverlayFile,
    UnsupportedExtension,
    /// The path has the right depth but does not live under the flow-graph directory.
    OutsideFlowGraphDir,
    /// The file could not be read, parsed or turned into a node or edge.
    LoadFailed,
}

/// The result of applying one add or remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeOutcome {
    Applied,
    /// The graph refused the mutation, e.g. removing an element that is not there.
    Rejected,
    Skipped(SkipReason),
    /// Not a node or edge file.
    Ignored,
}

/// Everything one poll cycle did, in the order it was done.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    outcomes: Vec<(PathBuf, ChangeOutcome)>,
}

impl SyncReport {
    fn record(&mut self, path: &Path, outcome: ChangeOutcome) {
        self.outcomes.push((path.to_path_buf(), outcome));
    }

    pub fn outcomes(&self) -> &[(PathBuf, ChangeOutcome)] {
        &self.outcomes
    }

    pub fn outcome_for(&self, path: impl AsRef<Path>) -> Option<ChangeOutcome> {
        let path = path.as_ref();
        self.outcomes
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, o)| *o)
    }

    pub fn applied(&self) -> usize {
        self.count(|o| o == ChangeOutcome::Applied)
    }

    pub fn rejected(&self) -> usize {
        self.count(|o| o == ChangeOutcome::Rejected)
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ChangeOutcome::Skipped(_)))
    }

    pub fn ignored(&self) -> usize {
        self.count(|o| o == ChangeOutcome::Ignored)
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    fn count(&self, pred: impl Fn(ChangeOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(*o)).count()
    }
}

enum GraphElement {
    Node(DataNode),
    Edge(FlowEdge),
}

struct PollTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Applies repository changes to a flow graph, once on demand or on a timer.
pub struct GraphMonitor {
    config: MonitorConfig,
    graph: Arc<FlowGraph>,
    source: Arc<dyn DiffSource>,
    loader: Arc<dyn PropertyLoader>,
    factories: Arc<FactoryRegistry>,
    catalog: Arc<dyn TemplateCatalog>,
    active: AtomicBool,
    task: Mutex<Option<PollTask>>,
}

impl GraphMonitor {
    /// Creates an inactive monitor. Call `set_active(true)` and `start` to begin polling.
    pub fn new(
        config: MonitorConfig,
        graph: Arc<FlowGraph>,
        source: Arc<dyn DiffSource>,
        loader: Arc<dyn PropertyLoader>,
        factories: Arc<FactoryRegistry>,
        catalog: Arc<dyn TemplateCatalog>,
    ) -> Self {
        Self {
            config,
            graph,
            source,
            loader,
            factories,
            catalog,
            active: AtomicBool::new(false),
            task: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn flow_graph(&self) -> &Arc<FlowGraph> {
        &self.graph
    }

    pub fn set_active(&self, active: bool) {
        let was = self.active.swap(active, Ordering::SeqCst);
        if was != active {
            tracing::info!(active, "Flow graph monitor toggled");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .map(|t| t.as_ref().is_some_and(|t| !t.handle.is_finished()))
            .unwrap_or(false)
    }

    /// Spawns the poll loop on the current tokio runtime. Does nothing if it is
    /// already running. Cycles only run while the monitor is active.
    pub fn start(self: &Arc<Self>) {
        let Ok(mut task) = self.task.lock() else {
            tracing::error!("Flow graph monitor task lock poisoned; not starting");
            return;
        };
        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            return;
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let monitor = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(monitor.config.polling_interval());
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(
                interval_secs = monitor.config.polling_interval_secs,
                "Started flow graph polling"
            );

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::debug!("Flow graph polling task cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        if monitor.is_active() {
                            monitor.poll_once().await;
                        }
                    }
                }
            }
        });
        *task = Some(PollTask { cancel, handle });
    }

    /// Stops the poll loop and waits for it to exit. A cycle already in progress
    /// is allowed to finish.
    pub async fn shutdown(&self) {
        if let Some(task) = self.cancel_task() {
            if let Err(e) = task.handle.await {
                tracing::warn!("Flow graph polling task ended abnormally: {}", e);
            }
        }
    }

    /// Signals the poll loop to stop without waiting for it.
    pub fn stop(&self) {
        self.cancel_task();
    }

    fn cancel_task(&self) -> Option<PollTask> {
        let task = self.task.lock().ok()?.take()?;
        task.cancel.cancel();
        Some(task)
    }

    /// Runs one cycle now, regardless of the active flag.
    pub async fn poll_once(&self) -> SyncReport {
        let changes = match self.source.poll_changes().await {
            Ok(changes) => changes,
            Err(e) => {
                tracing::warn!("Failed to read repository changes, will retry next cycle: {}", e);
                return SyncReport::default();
            }
        };
        let report = self.process_changes(changes).await;
        if !report.is_empty() {
            tracing::info!(
                applied = report.applied(),
                rejected = report.rejected(),
                skipped = report.skipped(),
                ignored = report.ignored(),
                nodes = self.graph.node_count(),
                edges = self.graph.edge_count(),
                "Applied flow graph changes"
            );
        }
        report
    }

    /// Applies `changes` in order.
    pub async fn process_changes(&self, changes: Vec<DiffEntry>) -> SyncReport {
        let mut report = SyncReport::default();
        for change in changes {
            match change.change_type {
                ChangeType::Add | ChangeType::Modify | ChangeType::Copy => {
                    if let Some(path) = change.new_path.as_deref() {
                        report.record(path, self.add_path(path).await);
                    }
                }
                ChangeType::Delete => {
                    if let Some(path) = change.old_path.as_deref() {
                        report.record(path, self.remove_path(path));
                    }
                }
                ChangeType::Rename => {
                    if let Some(path) = change.old_path.as_deref() {
                        report.record(path, self.remove_path(path));
                    }
                    if let Some(path) = change.new_path.as_deref() {
                        report.record(path, self.add_path(path).await);
                    }
                }
            }
        }
        report
    }

    fn classify(&self, path: &Path) -> PathClass {
        let class = layout::classify(path, &self.config);
        match &class {
            PathClass::Skipped(reason @ SkipReason::OverlayFile) => {
                tracing::debug!(path = %path.display(), ?reason, "Skipping overlay file");
            }
            PathClass::Skipped(reason) => {
                tracing::warn!(path = %path.display(), ?reason, "Skipping flow graph file");
            }
            PathClass::Ignored => {
                tracing::debug!(path = %path.display(), "Ignoring path outside node and edge depth");
            }
            _ => {}
        }
        class
    }

    async fn add_path(&self, path: &Path) -> ChangeOutcome {
        let class = self.classify(path);
        if matches!(class, PathClass::Skipped(_) | PathClass::Ignored) {
            return outcome_of(class);
        }

        let full_path = self.config.repository_dir.join(path);
        let loader = Arc::clone(&self.loader);
        let factories = Arc::clone(&self.factories);
        let catalog = Arc::clone(&self.catalog);
        let built = tokio::task::spawn_blocking(move || {
            build_element(&full_path, class, loader.as_ref(), &factories, catalog.as_ref())
        })
        .await;

        let element = match built {
            Ok(Ok(element)) => element,
            Ok(Err(e)) => {
                tracing::warn!(path = %path.display(), "Failed to load flow graph file: {}", e);
                return ChangeOutcome::Skipped(SkipReason::LoadFailed);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "Loader task failed: {}", e);
                return ChangeOutcome::Skipped(SkipReason::LoadFailed);
            }
        };

        let replaced = match element {
            GraphElement::Node(node) => self.graph.upsert_data_node(node),
            GraphElement::Edge(edge) => self.graph.upsert_flow_edge(edge),
        };
        tracing::debug!(path = %path.display(), replaced, "Applied flow graph file");
        ChangeOutcome::Applied
    }

    fn remove_path(&self, path: &Path) -> ChangeOutcome {
        let removed = match self.classify(path) {
            PathClass::Node { id } => self.graph.remove_data_node(&id),
            PathClass::Edge {
                source,
                destination,
                name,
            } => {
                // The file may already be gone; the id comes from the path alone.
                let identity = Properties::new()
                    .with_value(FLOW_EDGE_SOURCE_KEY, source)
                    .with_value(FLOW_EDGE_DESTINATION_KEY, destination)
                    .with_value(FLOW_EDGE_NAME_KEY, name);
                match self.factories.edge_id(&identity) {
                    Ok(edge_id) => self.graph.remove_flow_edge(&edge_id),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), "Could not derive edge id: {}", e);
                        return ChangeOutcome::Skipped(SkipReason::LoadFailed);
                    }
                }
            }
            other => return outcome_of(other),
        };
        if removed {
            ChangeOutcome::Applied
        } else {
            tracing::warn!(path = %path.display(), "Nothing to remove for deleted file");
            ChangeOutcome::Rejected
        }
    }
}

fn outcome_of(class: PathClass) -> ChangeOutcome {
    match class {
        PathClass::Skipped(reason) => ChangeOutcome::Skipped(reason),
        _ => ChangeOutcome::Ignored,
    }
}

/// Loads a node or edge file and stamps the path-derived identity over its contents.
fn build_element(
    full_path: &Path,
    class: PathClass,
    loader: &dyn PropertyLoader,
    factories: &FactoryRegistry,
    catalog: &dyn TemplateCatalog,
) -> Result<GraphElement, LoadError> {
    let mut props = loader.load(full_path)?;
    match class {
        PathClass::Node { id } => {
            props.insert(DATA_NODE_ID_KEY, id);
            Ok(GraphElement::Node(factories.create_data_node(&props)?))
        }
        PathClass::Edge {
            source,
            destination,
            name,
        } => {
            props.insert(FLOW_EDGE_SOURCE_KEY, source);
            props.insert(FLOW_EDGE_DESTINATION_KEY, destination);
            props.insert(FLOW_EDGE_NAME_KEY, name);
            Ok(GraphElement::Edge(
                factories.create_flow_edge(&props, catalog)?,
            ))
        }
        PathClass::Skipped(_) | PathClass::Ignored => Err(LoadError::Parse {
            path: full_path.to_path_buf(),
            line: 0,
            message: "not a node or edge file".to_string(),
        }),
    }
}
