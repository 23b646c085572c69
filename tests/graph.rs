//! Tests for the flow graph container and the node/edge factories.
mod common;
use common::*;
use flowroute::config::keys::*;
use flowroute::error::FactoryError;
use flowroute::graph::{DataNodeFactory, FactoryRegistry};
use flowroute::prelude::*;
use std::sync::Arc;
use std::thread;

#[test]
fn test_add_data_node_keeps_first_value() {
    let graph = FlowGraph::new();
    assert!(graph.add_data_node(hdfs_node("nodeA")));
    assert!(!graph.add_data_node(DataNode::new("nodeA", "adl")));

    let node = graph.get_data_node("nodeA").expect("node should exist");
    assert_eq!(node.platform, "hdfs");
    assert_eq!(graph.node_count(), 1);
}

#[test]
fn test_remove_missing_elements_is_noop() {
    let graph = FlowGraph::new();
    assert!(!graph.remove_data_node("ghost"));
    assert!(!graph.remove_flow_edge("ghost_ghost_edge"));
    assert_eq!(graph.node_count(), 0);
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn test_edge_id_is_derived_from_endpoints_and_name() {
    let e = edge("nodeA", "nodeB", "edge1", vec![executor("local", "hdfs:hdfs")]);
    assert_eq!(e.id, "nodeA_nodeB_edge1");
    assert_eq!(FlowEdge::edge_id("a", "b", "c"), "a_b_c");
}

#[test]
fn test_edge_can_be_added_before_its_endpoints() {
    let graph = FlowGraph::new();
    assert!(graph.add_flow_edge(edge("nodeA", "nodeB", "edge1", vec![])));
    assert!(!graph.add_flow_edge(edge("nodeA", "nodeB", "edge1", vec![])));
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.neighbors("nodeA").len(), 1);
    assert!(graph.neighbors("nodeB").is_empty());
}

#[test]
fn test_neighbors_are_ordered_by_edge_id() {
    let graph = FlowGraph::new();
    graph.add_flow_edge(edge("a", "c", "z", vec![]));
    graph.add_flow_edge(edge("a", "b", "y", vec![]));
    graph.add_flow_edge(edge("a", "b", "x", vec![]));
    graph.add_flow_edge(edge("b", "c", "w", vec![]));

    let ids: Vec<String> = graph.neighbors("a").iter().map(|e| e.id.clone()).collect();
    assert_eq!(ids, vec!["a_b_x", "a_b_y", "a_c_z"]);

    let snapshot = graph.snapshot();
    let snapshot_ids: Vec<&str> = snapshot.neighbors("a").iter().map(|e| e.id.as_str()).collect();
    assert_eq!(snapshot_ids, vec!["a_b_x", "a_b_y", "a_c_z"]);
}

#[test]
fn test_remove_flow_edge_updates_neighbors() {
    let graph = FlowGraph::new();
    graph.add_flow_edge(edge("a", "b", "x", vec![]));
    assert!(graph.remove_flow_edge("a_b_x"));
    assert!(graph.neighbors("a").is_empty());
    assert!(!graph.contains_flow_edge("a_b_x"));
}

#[test]
fn test_remove_referenced_node_leaves_edges() {
    let graph = FlowGraph::new();
    graph.add_data_node(hdfs_node("a"));
    graph.add_data_node(hdfs_node("b"));
    graph.add_flow_edge(edge("a", "b", "x", vec![]));

    assert!(graph.remove_data_node("b"));
    assert!(graph.contains_flow_edge("a_b_x"));
    assert!(!graph.contains_data_node("b"));
}

#[test]
fn test_upsert_replaces_in_place_and_keeps_neighbors() {
    let graph = FlowGraph::new();
    assert!(!graph.upsert_data_node(hdfs_node("a")));
    assert!(graph.upsert_data_node(DataNode::new("a", "adl")));
    assert_eq!(graph.get_data_node("a").map(|n| n.platform.clone()), Some("adl".to_string()));
    assert_eq!(graph.node_count(), 1);

    assert!(!graph.upsert_flow_edge(edge("a", "b", "x", vec![executor("old", "*:*")])));
    assert!(graph.upsert_flow_edge(edge("a", "b", "x", vec![executor("new", "*:*")])));
    let neighbors = graph.neighbors("a");
    assert_eq!(neighbors.len(), 1);
    assert_eq!(neighbors[0].executors[0].class, "new");
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_concurrent_upserts_never_hide_the_node_from_snapshots() {
    let graph = Arc::new(FlowGraph::new());
    graph.add_data_node(hdfs_node("a"));

    let writer = {
        let graph = Arc::clone(&graph);
        thread::spawn(move || {
            for i in 0..500 {
                graph.upsert_data_node(DataNode::new("a", format!("p{}", i)));
            }
        })
    };
    for _ in 0..500 {
        assert!(graph.snapshot().node("a").is_some());
    }
    writer.join().expect("writer panicked");
}

#[test]
fn test_snapshot_is_isolated_from_later_writes() {
    let graph = FlowGraph::new();
    graph.add_data_node(hdfs_node("a"));
    let snapshot = graph.snapshot();

    graph.add_data_node(hdfs_node("b"));
    graph.remove_data_node("a");

    assert!(snapshot.node("a").is_some());
    assert!(snapshot.node("b").is_none());
    assert_eq!(snapshot.node_count(), 1);
}

#[test]
fn test_concurrent_adds_of_same_id_keep_one_value() {
    let graph = Arc::new(FlowGraph::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let graph = Arc::clone(&graph);
            thread::spawn(move || graph.add_data_node(DataNode::new("shared", format!("p{}", i))))
        })
        .collect();
    let wins = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .filter(|added| *added)
        .count();

    assert_eq!(wins, 1);
    assert_eq!(graph.node_count(), 1);
}

#[test]
fn test_factory_builds_base_node() {
    let registry = FactoryRegistry::new();
    let props = Properties::new()
        .with_value(DATA_NODE_ID_KEY, "nodeA")
        .with_value(DATA_NODE_PLATFORM_KEY, "hdfs")
        .with_value(DATA_NODE_IS_ACTIVE_KEY, "false");

    let node = registry.create_data_node(&props).expect("Failed to build node");
    assert_eq!(node.id, "nodeA");
    assert_eq!(node.class, "base");
    assert_eq!(node.platform, "hdfs");
    assert!(!node.active);
}

#[test]
fn test_fs_node_takes_platform_from_uri_scheme() {
    let registry = FactoryRegistry::new();
    let props = Properties::new()
        .with_value(DATA_NODE_ID_KEY, "lake")
        .with_value(DATA_NODE_CLASS_KEY, "fs")
        .with_value(DATA_NODE_FS_URI_KEY, "ADL://lake.azuredatalakestore.net");

    let node = registry.create_data_node(&props).expect("Failed to build node");
    assert_eq!(node.platform, "adl");
    assert_eq!(node.class, "fs");
}

#[test]
fn test_node_factory_reports_missing_platform() {
    let registry = FactoryRegistry::new();
    let props = Properties::new().with_value(DATA_NODE_ID_KEY, "nodeA");
    assert_eq!(
        registry.create_data_node(&props).unwrap_err(),
        FactoryError::MissingProperty(DATA_NODE_PLATFORM_KEY.to_string())
    );
}

#[test]
fn test_unknown_class_is_rejected_and_type_mapping_resolves_it() {
    let props = Properties::new()
        .with_value(DATA_NODE_ID_KEY, "nodeA")
        .with_value(DATA_NODE_CLASS_KEY, "HdfsDataNode")
        .with_value(DATA_NODE_PLATFORM_KEY, "hdfs");

    let registry = FactoryRegistry::new();
    assert_eq!(
        registry.create_data_node(&props).unwrap_err(),
        FactoryError::UnknownClass("HdfsDataNode".to_string())
    );

    let registry = FactoryRegistry::new().with_type_mapping("HdfsDataNode", "base");
    let node = registry.create_data_node(&props).expect("mapped class should build");
    assert_eq!(node.platform, "hdfs");
}

struct UpperCaseNodeFactory;

impl DataNodeFactory for UpperCaseNodeFactory {
    fn class(&self) -> &str {
        "upper"
    }

    fn create(&self, props: &Properties) -> std::result::Result<DataNode, FactoryError> {
        Ok(DataNode::new(
            props.require(DATA_NODE_ID_KEY)?,
            props.require(DATA_NODE_PLATFORM_KEY)?.to_uppercase(),
        ))
    }
}

#[test]
fn test_custom_node_factory() {
    let mut registry = FactoryRegistry::new();
    registry.register_node_factory(Box::new(UpperCaseNodeFactory));
    let props = Properties::new()
        .with_value(DATA_NODE_ID_KEY, "nodeA")
        .with_value(DATA_NODE_CLASS_KEY, "upper")
        .with_value(DATA_NODE_PLATFORM_KEY, "hdfs");

    let node = registry.create_data_node(&props).expect("Failed to build node");
    assert_eq!(node.platform, "HDFS");
}

fn edge_props() -> Properties {
    Properties::new()
        .with_value(FLOW_EDGE_SOURCE_KEY, "nodeA")
        .with_value(FLOW_EDGE_DESTINATION_KEY, "nodeB")
        .with_value(FLOW_EDGE_NAME_KEY, "edge1")
        .with_value(FLOW_EDGE_TEMPLATE_URI_KEY, COPY_TEMPLATE)
        .with_value("flow.edge.specExecutors.1.specExecInstance.class", "second")
        .with_value("flow.edge.specExecutors.1.specExecInstance.capabilities", "s2:d2")
        .with_value("flow.edge.specExecutors.0.specExecInstance.class", "first")
        .with_value(
            "flow.edge.specExecutors.0.specExecInstance.capabilities",
            "s1:d1, s1:d2",
        )
        .with_value("flow.edge.specExecutors.0.specExecInstance.retries", "3")
}

#[test]
fn test_edge_factory_reads_executor_blocks_in_index_order() {
    let registry = FactoryRegistry::new();
    let catalog = copy_catalog();
    let edge = registry
        .create_flow_edge(&edge_props(), catalog.as_ref())
        .expect("Failed to build edge");

    assert_eq!(edge.id, "nodeA_nodeB_edge1");
    assert_eq!(edge.executors.len(), 2);
    assert_eq!(edge.executors[0].class, "first");
    assert_eq!(
        edge.executors[0].capabilities,
        vec![Capability::new("s1", "d1"), Capability::new("s1", "d2")]
    );
    assert_eq!(
        edge.executors[0].config.get("specExecInstance.retries"),
        Some("3")
    );
    assert_eq!(edge.executors[1].class, "second");
    assert!(edge.active);
}

#[test]
fn test_edge_factory_requires_resolvable_template() {
    let registry = FactoryRegistry::new();
    let props = edge_props().with_value(FLOW_EDGE_TEMPLATE_URI_KEY, "FS:///missing");
    let err = registry
        .create_flow_edge(&props, copy_catalog().as_ref())
        .unwrap_err();
    assert!(matches!(err, FactoryError::Template(_)));
}

#[test]
fn test_edge_factory_requires_an_executor() {
    let registry = FactoryRegistry::new();
    let props: Properties = edge_props()
        .iter()
        .filter(|(k, _)| !k.starts_with(FLOW_EDGE_SPEC_EXECUTORS_KEY))
        .collect();
    let err = registry
        .create_flow_edge(&props, copy_catalog().as_ref())
        .unwrap_err();
    assert_eq!(
        err,
        FactoryError::MissingProperty(FLOW_EDGE_SPEC_EXECUTORS_KEY.to_string())
    );
}

#[test]
fn test_first_capable_executor_follows_declared_order() {
    let e = edge(
        "a",
        "b",
        "x",
        vec![
            executor("narrow", "hdfs:adl"),
            executor("wide", "*:*"),
            executor("late", "hdfs:hdfs"),
        ],
    );
    let chosen = e
        .first_capable_executor(&Capability::new("hdfs", "hdfs"))
        .expect("an executor should match");
    assert_eq!(chosen.class, "wide");
    assert_eq!(
        e.first_capable_executor(&Capability::new("hdfs", "adl"))
            .map(|x| x.class.as_str()),
        Some("narrow")
    );
}
