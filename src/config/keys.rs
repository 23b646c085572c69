//! Property keys understood by the node, edge and template factories and by the
//! monitor configuration.

pub const DATA_NODE_ID_KEY: &str = "data.node.id";
pub const DATA_NODE_CLASS_KEY: &str = "data.node.class";
pub const DATA_NODE_PLATFORM_KEY: &str = "data.node.platform";
pub const DATA_NODE_FS_URI_KEY: &str = "data.node.fs.uri";
pub const DATA_NODE_IS_ACTIVE_KEY: &str = "data.node.isActive";

pub const FLOW_EDGE_SOURCE_KEY: &str = "flow.edge.source";
pub const FLOW_EDGE_DESTINATION_KEY: &str = "flow.edge.destination";
pub const FLOW_EDGE_NAME_KEY: &str = "flow.edge.name";
pub const FLOW_EDGE_CLASS_KEY: &str = "flow.edge.class";
pub const FLOW_EDGE_TEMPLATE_URI_KEY: &str = "flow.edge.flowTemplateUri";
pub const FLOW_EDGE_IS_ACTIVE_KEY: &str = "flow.edge.isActive";
pub const FLOW_EDGE_SPEC_EXECUTORS_KEY: &str = "flow.edge.specExecutors";
pub const SPEC_EXECUTOR_CLASS_KEY: &str = "specExecInstance.class";
pub const SPEC_EXECUTOR_CAPABILITIES_KEY: &str = "specExecInstance.capabilities";

pub const TEMPLATE_DESCRIPTION_KEY: &str = "template.description";
pub const TEMPLATE_INPUT_PLATFORM_KEY: &str = "template.input.platform";
pub const TEMPLATE_INPUT_FORMAT_KEY: &str = "template.input.format";
pub const TEMPLATE_OUTPUT_PLATFORM_KEY: &str = "template.output.platform";
pub const TEMPLATE_OUTPUT_FORMAT_KEY: &str = "template.output.format";

pub const FLOW_GROUP_KEY: &str = "flow.group";
pub const FLOW_NAME_KEY: &str = "flow.name";
pub const FLOW_SOURCE_IDENTIFIER_KEY: &str = "flow.sourceIdentifier";
pub const FLOW_DESTINATION_IDENTIFIER_KEY: &str = "flow.destinationIdentifier";
pub const FLOW_INPUT_FORMAT_KEY: &str = "flow.input.format";
pub const FLOW_OUTPUT_FORMAT_KEY: &str = "flow.output.format";

pub const JOB_NAME_KEY: &str = "job.name";
pub const JOB_EDGE_ID_KEY: &str = "flow.edge.id";
pub const JOB_HOP_INDEX_KEY: &str = "job.hop.index";
pub const JOB_SOURCE_NODE_KEY: &str = "job.source.node";
pub const JOB_DESTINATION_NODE_KEY: &str = "job.destination.node";

pub const MONITOR_REPO_URI_KEY: &str = "flowgraph.monitor.repositoryUri";
pub const MONITOR_REPO_DIR_KEY: &str = "flowgraph.monitor.repositoryDir";
pub const MONITOR_BRANCH_KEY: &str = "flowgraph.monitor.branch";
pub const MONITOR_POLLING_INTERVAL_KEY: &str = "flowgraph.monitor.pollingInterval";
pub const MONITOR_FLOWGRAPH_DIR_KEY: &str = "flowgraph.monitor.flowGraphDir";
pub const MONITOR_PROPERTIES_EXTENSIONS_KEY: &str = "flowgraph.monitor.propertiesExtensions";
pub const MONITOR_CONF_EXTENSIONS_KEY: &str = "flowgraph.monitor.confExtensions";

/// Platform wildcard accepted by capabilities and dataset descriptors.
pub const ANY: &str = "*";
