use super::edge::FlowEdge;
use super::executor::SpecExecutor;
use super::node::DataNode;
use crate::config::Properties;
use crate::config::keys::*;
use crate::error::FactoryError;
use crate::template::TemplateCatalog;
use ahash::AHashMap;
use itertools::Itertools;

/// Builds a `DataNode` from a resolved property set.
pub trait DataNodeFactory: Send + Sync {
    fn class(&self) -> &str;
    fn create(&self, props: &Properties) -> Result<DataNode, FactoryError>;
}

/// Builds a `FlowEdge` from a resolved property set.
pub trait FlowEdgeFactory: Send + Sync {
    fn class(&self) -> &str;
    fn create(
        &self,
        props: &Properties,
        catalog: &dyn TemplateCatalog,
    ) -> Result<FlowEdge, FactoryError>;

    /// Derives the edge id without building the edge.
    fn edge_id(&self, props: &Properties) -> Result<String, FactoryError> {
        Ok(FlowEdge::edge_id(
            props.require(FLOW_EDGE_SOURCE_KEY)?,
            props.require(FLOW_EDGE_DESTINATION_KEY)?,
            props.require(FLOW_EDGE_NAME_KEY)?,
        ))
    }
}

/// Node with an explicitly declared platform.
struct BaseDataNodeFactory;

impl DataNodeFactory for BaseDataNodeFactory {
    fn class(&self) -> &str {
        "base"
    }

    fn create(&self, props: &Properties) -> Result<DataNode, FactoryError> {
        Ok(DataNode {
            id: props.require(DATA_NODE_ID_KEY)?.to_string(),
            class: self.class().to_string(),
            platform: props.require(DATA_NODE_PLATFORM_KEY)?.to_string(),
            active: props.get_bool(DATA_NODE_IS_ACTIVE_KEY, true)?,
            properties: props.clone(),
        })
    }
}

/// Node backed by a file system; the platform is the scheme of `data.node.fs.uri`.
struct FileSystemDataNodeFactory;

impl DataNodeFactory for FileSystemDataNodeFactory {
    fn class(&self) -> &str {
        "fs"
    }

    fn create(&self, props: &Properties) -> Result<DataNode, FactoryError> {
        let uri = props.require(DATA_NODE_FS_URI_KEY)?;
        let scheme = uri
            .split_once("://")
            .map(|(scheme, _)| scheme)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| FactoryError::InvalidProperty {
                key: DATA_NODE_FS_URI_KEY.to_string(),
                value: uri.to_string(),
            })?;
        Ok(DataNode {
            id: props.require(DATA_NODE_ID_KEY)?.to_string(),
            class: self.class().to_string(),
            platform: scheme.to_ascii_lowercase(),
            active: props.get_bool(DATA_NODE_IS_ACTIVE_KEY, true)?,
            properties: props.clone(),
        })
    }
}

struct BaseFlowEdgeFactory;

impl FlowEdgeFactory for BaseFlowEdgeFactory {
    fn class(&self) -> &str {
        "base"
    }

    fn create(
        &self,
        props: &Properties,
        catalog: &dyn TemplateCatalog,
    ) -> Result<FlowEdge, FactoryError> {
        let source = props.require(FLOW_EDGE_SOURCE_KEY)?;
        let destination = props.require(FLOW_EDGE_DESTINATION_KEY)?;
        let name = props.require(FLOW_EDGE_NAME_KEY)?;
        let template_uri = props.require(FLOW_EDGE_TEMPLATE_URI_KEY)?;

        // The template must exist when the edge is defined.
        catalog.get_template(template_uri)?;

        let executors = parse_executors(props)?;
        if executors.is_empty() {
            return Err(FactoryError::MissingProperty(
                FLOW_EDGE_SPEC_EXECUTORS_KEY.to_string(),
            ));
        }

        Ok(FlowEdge {
            id: FlowEdge::edge_id(source, destination, name),
            source: source.to_string(),
            destination: destination.to_string(),
            name: name.to_string(),
            class: self.class().to_string(),
            template_uri: template_uri.to_string(),
            executors,
            active: props.get_bool(FLOW_EDGE_IS_ACTIVE_KEY, true)?,
            properties: props.clone(),
        })
    }
}

/// Reads the `flow.edge.specExecutors.<n>.*` blocks in index order.
fn parse_executors(props: &Properties) -> Result<Vec<SpecExecutor>, FactoryError> {
    let block = props.subtree(FLOW_EDGE_SPEC_EXECUTORS_KEY);
    let indices: Vec<usize> = block
        .iter()
        .map(|(k, _)| k.split('.').next().unwrap_or(k))
        .unique()
        .map(|idx| {
            idx.parse::<usize>()
                .map_err(|_| FactoryError::InvalidProperty {
                    key: format!("{}.{}", FLOW_EDGE_SPEC_EXECUTORS_KEY, idx),
                    value: idx.to_string(),
                })
        })
        .collect::<Result<_, _>>()?;

    indices
        .into_iter()
        .sorted()
        .map(|idx| SpecExecutor::from_properties(block.subtree(&idx.to_string())))
        .collect()
}

fn create_node_factory_by_name(name: &str) -> Option<Box<dyn DataNodeFactory>> {
    match name {
        "base" => Some(Box::new(BaseDataNodeFactory)),
        "fs" => Some(Box::new(FileSystemDataNodeFactory)),
        _ => None,
    }
}

fn create_edge_factory_by_name(name: &str) -> Option<Box<dyn FlowEdgeFactory>> {
    match name {
        "base" => Some(Box::new(BaseFlowEdgeFactory)),
        _ => None,
    }
}

/// Maps the class declared in a node or edge file to the factory that builds it.
///
/// Resolved once when the monitor is built; per-file work is a map lookup.
pub struct FactoryRegistry {
    node_factories: AHashMap<String, Box<dyn DataNodeFactory>>,
    edge_factories: AHashMap<String, Box<dyn FlowEdgeFactory>>,
}

impl Default for FactoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FactoryRegistry {
    /// A registry holding the built-in `base` and `fs` factories.
    pub fn new() -> Self {
        let mut node_factories: AHashMap<String, Box<dyn DataNodeFactory>> = AHashMap::new();
        for name in ["base", "fs"] {
            if let Some(f) = create_node_factory_by_name(name) {
                node_factories.insert(name.to_string(), f);
            }
        }
        let mut edge_factories: AHashMap<String, Box<dyn FlowEdgeFactory>> = AHashMap::new();
        if let Some(f) = create_edge_factory_by_name("base") {
            edge_factories.insert("base".to_string(), f);
        }
        Self {
            node_factories,
            edge_factories,
        }
    }

    /// Lets files declare `user_class` and be built by the built-in `builtin_class` factory.
    pub fn with_type_mapping(mut self, user_class: &str, builtin_class: &str) -> Self {
        if let Some(f) = create_node_factory_by_name(builtin_class) {
            self.node_factories.insert(user_class.to_string(), f);
        }
        if let Some(f) = create_edge_factory_by_name(builtin_class) {
            self.edge_factories.insert(user_class.to_string(), f);
        }
        self
    }

    pub fn register_node_factory(&mut self, factory: Box<dyn DataNodeFactory>) {
        self.node_factories
            .insert(factory.class().to_string(), factory);
    }

    pub fn register_edge_factory(&mut self, factory: Box<dyn FlowEdgeFactory>) {
        self.edge_factories
            .insert(factory.class().to_string(), factory);
    }

    fn node_factory(&self, props: &Properties) -> Result<&dyn DataNodeFactory, FactoryError> {
        let class = props.get_or(DATA_NODE_CLASS_KEY, "base");
        self.node_factories
            .get(class)
            .map(|f| &**f)
            .ok_or_else(|| FactoryError::UnknownClass(class.to_string()))
    }

    fn edge_factory(&self, props: &Properties) -> Result<&dyn FlowEdgeFactory, FactoryError> {
        let class = props.get_or(FLOW_EDGE_CLASS_KEY, "base");
        self.edge_factories
            .get(class)
            .map(|f| &**f)
            .ok_or_else(|| FactoryError::UnknownClass(class.to_string()))
    }

    pub fn create_data_node(&self, props: &Properties) -> Result<DataNode, FactoryError> {
        self.node_factory(props)?.create(props)
    }

    pub fn create_flow_edge(
        &self,
        props: &Properties,
        catalog: &dyn TemplateCatalog,
    ) -> Result<FlowEdge, FactoryError> {
        self.edge_factory(props)?.create(props, catalog)
    }

    pub fn edge_id(&self, props: &Properties) -> Result<String, FactoryError> {
        self.edge_factory(props)?.edge_id(props)
    }
}
