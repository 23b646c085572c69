//! Tests for path search and hop feasibility.
mod common;
use common::*;
use flowroute::config::keys::*;
use flowroute::prelude::*;

fn find(
    graph: &FlowGraph,
    catalog: &dyn TemplateCatalog,
    spec: &FlowSpec,
) -> std::result::Result<PhysicalPlan, PathFinderError> {
    let snapshot = graph.snapshot();
    FlowGraphPathFinder::new(&snapshot, catalog, spec).find_path()
}

fn edge_ids(plan: &PhysicalPlan) -> Vec<String> {
    plan.values()
        .map(|hop| hop.job_spec.config.get(JOB_EDGE_ID_KEY).unwrap_or_default().to_string())
        .collect()
}

fn graph_with_nodes(ids: &[&str]) -> FlowGraph {
    let graph = FlowGraph::new();
    for id in ids {
        graph.add_data_node(hdfs_node(id));
    }
    graph
}

#[test]
fn test_direct_edge_gives_single_hop_plan() {
    let graph = graph_with_nodes(&["A", "B"]);
    graph.add_flow_edge(edge("A", "B", "e1", vec![executor("local", "hdfs:hdfs")]));

    let plan = find(&graph, copy_catalog().as_ref(), &flow("A", "B")).expect("path expected");
    assert_eq!(plan.len(), 1);
    assert_eq!(edge_ids(&plan), vec!["A_B_e1"]);
    assert_eq!(plan.values().next().map(|h| h.executor.class.as_str()), Some("local"));
}

#[test]
fn test_two_hop_plan_when_no_direct_edge() {
    let graph = graph_with_nodes(&["A", "B", "C"]);
    graph.add_flow_edge(edge("A", "C", "e1", vec![executor("local", "hdfs:hdfs")]));
    graph.add_flow_edge(edge("C", "B", "e2", vec![executor("local", "hdfs:hdfs")]));

    let plan = find(&graph, copy_catalog().as_ref(), &flow("A", "B")).expect("path expected");
    assert_eq!(edge_ids(&plan), vec!["A_C_e1", "C_B_e2"]);

    let nodes = plan.nodes();
    assert!(nodes[0].parents.is_empty());
    assert_eq!(nodes[0].children, vec![1]);
    assert_eq!(nodes[1].parents, vec![0]);
    assert_eq!(plan.start_nodes().len(), 1);
    assert_eq!(plan.end_nodes().len(), 1);
}

#[test]
fn test_direct_edge_preferred_over_earlier_multi_hop() {
    let graph = graph_with_nodes(&["A", "AA", "B"]);
    // "A_AA_a" sorts before "A_B_z", so a plain depth-first walk would try AA first.
    graph.add_flow_edge(edge("A", "AA", "a", vec![executor("local", "hdfs:hdfs")]));
    graph.add_flow_edge(edge("AA", "B", "a", vec![executor("local", "hdfs:hdfs")]));
    graph.add_flow_edge(edge("A", "B", "z", vec![executor("local", "hdfs:hdfs")]));

    let plan = find(&graph, copy_catalog().as_ref(), &flow("A", "B")).expect("path expected");
    assert_eq!(edge_ids(&plan), vec!["A_B_z"]);
}

#[test]
fn test_infeasible_direct_edge_falls_back_to_multi_hop() {
    let graph = graph_with_nodes(&["A", "B", "C"]);
    graph.add_flow_edge(edge("A", "B", "direct", vec![executor("adl-only", "adl:adl")]));
    graph.add_flow_edge(edge("A", "C", "e1", vec![executor("local", "hdfs:hdfs")]));
    graph.add_flow_edge(edge("C", "B", "e2", vec![executor("local", "hdfs:hdfs")]));

    let plan = find(&graph, copy_catalog().as_ref(), &flow("A", "B")).expect("path expected");
    assert_eq!(edge_ids(&plan), vec!["A_C_e1", "C_B_e2"]);
}

#[test]
fn test_no_path_and_unknown_endpoint_are_distinguished() {
    let graph = graph_with_nodes(&["A", "B"]);
    let catalog = copy_catalog();

    assert_eq!(
        find(&graph, catalog.as_ref(), &flow("A", "B")).unwrap_err(),
        PathFinderError::NoPath {
            source_id: "A".to_string(),
            destination_id: "B".to_string(),
        }
    );
    assert_eq!(
        find(&graph, catalog.as_ref(), &flow("A", "Z")).unwrap_err(),
        PathFinderError::UnknownEndpoint("Z".to_string())
    );
}

#[test]
fn test_dangling_edge_becomes_usable_once_endpoint_exists() {
    let graph = graph_with_nodes(&["A"]);
    graph.add_flow_edge(edge("A", "B", "e1", vec![executor("local", "hdfs:hdfs")]));
    let catalog = copy_catalog();

    assert!(matches!(
        find(&graph, catalog.as_ref(), &flow("A", "B")),
        Err(PathFinderError::UnknownEndpoint(_))
    ));

    graph.add_data_node(hdfs_node("B"));
    assert!(find(&graph, catalog.as_ref(), &flow("A", "B")).is_ok());

    // An edge whose intermediate node is missing is not traversed.
    graph.add_data_node(hdfs_node("D"));
    graph.add_flow_edge(edge("A", "C", "e2", vec![executor("local", "hdfs:hdfs")]));
    graph.add_flow_edge(edge("C", "D", "e3", vec![executor("local", "hdfs:hdfs")]));
    assert!(matches!(
        find(&graph, catalog.as_ref(), &flow("A", "D")),
        Err(PathFinderError::NoPath { .. })
    ));
}

#[test]
fn test_inactive_elements_are_not_routable() {
    let graph = FlowGraph::new();
    graph.add_data_node(hdfs_node("A"));
    graph.add_data_node(hdfs_node("B").with_active(false));
    graph.add_data_node(hdfs_node("C"));
    graph.add_flow_edge(edge("A", "B", "e1", vec![executor("local", "hdfs:hdfs")]));
    graph.add_flow_edge(
        edge("A", "C", "e2", vec![executor("local", "hdfs:hdfs")]).with_active(false),
    );
    let catalog = copy_catalog();

    assert!(matches!(
        find(&graph, catalog.as_ref(), &flow("A", "B")),
        Err(PathFinderError::NoPath { .. })
    ));
    assert!(matches!(
        find(&graph, catalog.as_ref(), &flow("A", "C")),
        Err(PathFinderError::NoPath { .. })
    ));
}

#[test]
fn test_cycles_do_not_loop_forever() {
    let graph = graph_with_nodes(&["A", "B", "C", "D"]);
    for (src, dst) in [("A", "B"), ("B", "C"), ("C", "A"), ("C", "B")] {
        graph.add_flow_edge(edge(src, dst, "loop", vec![executor("local", "hdfs:hdfs")]));
    }

    assert!(matches!(
        find(&graph, copy_catalog().as_ref(), &flow("A", "D")),
        Err(PathFinderError::NoPath { .. })
    ));
}

#[test]
fn test_source_equal_to_destination_has_no_path() {
    let graph = graph_with_nodes(&["A"]);
    graph.add_flow_edge(edge("A", "A", "self", vec![executor("local", "hdfs:hdfs")]));
    assert!(matches!(
        find(&graph, copy_catalog().as_ref(), &flow("A", "A")),
        Err(PathFinderError::NoPath { .. })
    ));
}

#[test]
fn test_executor_choice_uses_node_platforms() {
    let graph = FlowGraph::new();
    graph.add_data_node(DataNode::new("A", "hdfs"));
    graph.add_data_node(DataNode::new("B", "adl"));
    graph.add_flow_edge(edge(
        "A",
        "B",
        "e1",
        vec![
            executor("hdfs-to-hdfs", "hdfs:hdfs"),
            executor("any-to-adl", "*:adl"),
            executor("hdfs-to-adl", "hdfs:adl"),
        ],
    ));

    let plan = find(&graph, copy_catalog().as_ref(), &flow("A", "B")).expect("path expected");
    let hop = plan.values().next().expect("one hop");
    assert_eq!(hop.executor.class, "any-to-adl");
}

#[test]
fn test_template_descriptors_restrict_hops() {
    let graph = FlowGraph::new();
    graph.add_data_node(DataNode::new("A", "hdfs"));
    graph.add_data_node(DataNode::new("B", "hdfs"));
    graph.add_flow_edge(FlowEdge::new(
        "A",
        "B",
        "avro",
        "FS:///avro-to-orc",
        vec![executor("local", "*:*")],
    ));
    let catalog = InMemoryTemplateCatalog::new().with_template(
        FlowTemplate::new("FS:///avro-to-orc")
            .with_input(DatasetDescriptor::new("hdfs", "avro"))
            .with_output(DatasetDescriptor::new("hdfs", "orc")),
    );

    let ok = flow("A", "B").with_input_format("avro").with_output_format("orc");
    assert!(find(&graph, &catalog, &ok).is_ok());

    let wrong_input = flow("A", "B").with_input_format("json");
    assert!(find(&graph, &catalog, &wrong_input).is_err());

    let wrong_output = flow("A", "B").with_output_format("parquet");
    assert!(find(&graph, &catalog, &wrong_output).is_err());
}

#[test]
fn test_format_is_carried_across_hops() {
    let graph = graph_with_nodes(&["A", "B", "C"]);
    let any = || vec![executor("local", "*:*")];
    graph.add_flow_edge(FlowEdge::new("A", "B", "convert", "FS:///to-orc", any()));
    graph.add_flow_edge(FlowEdge::new("B", "C", "publish", "FS:///orc-only", any()));
    let catalog = InMemoryTemplateCatalog::new()
        .with_template(
            FlowTemplate::new("FS:///to-orc").with_output(DatasetDescriptor::new("*", "orc")),
        )
        .with_template(
            FlowTemplate::new("FS:///orc-only").with_input(DatasetDescriptor::new("*", "orc")),
        );

    let spec = flow("A", "C").with_input_format("avro");
    let plan = find(&graph, &catalog, &spec).expect("path expected");
    assert_eq!(edge_ids(&plan), vec!["A_B_convert", "B_C_publish"]);
}

#[test]
fn test_missing_template_makes_edge_infeasible() {
    let graph = graph_with_nodes(&["A", "B"]);
    graph.add_flow_edge(FlowEdge::new("A", "B", "e1", "FS:///gone", vec![executor("local", "*:*")]));
    assert!(matches!(
        find(&graph, copy_catalog().as_ref(), &flow("A", "B")),
        Err(PathFinderError::NoPath { .. })
    ));
}

#[test]
fn test_job_specs_merge_template_and_flow_config() {
    let graph = graph_with_nodes(&["A", "B"]);
    graph.add_flow_edge(edge("A", "B", "e1", vec![executor("local", "hdfs:hdfs")]));
    let spec = flow("A", "B").with_config(
        Properties::new()
            .with_value("job.class", "OverriddenJob")
            .with_value("extract.namespace", "events"),
    );

    let plan = find(&graph, copy_catalog().as_ref(), &spec).expect("path expected");
    let job = &plan.values().next().expect("one hop").job_spec;
    assert_eq!(job.uri, "test-group/test-flow/A_B_e1");
    assert_eq!(job.template_uri, COPY_TEMPLATE);
    assert_eq!(job.config.get("job.class"), Some("OverriddenJob"));
    assert_eq!(job.config.get("extract.namespace"), Some("events"));
    assert_eq!(job.config.get(JOB_HOP_INDEX_KEY), Some("0"));
    assert_eq!(job.config.get(JOB_SOURCE_NODE_KEY), Some("A"));
    assert_eq!(job.config.get(JOB_DESTINATION_NODE_KEY), Some("B"));
    assert_eq!(job.config.get(JOB_NAME_KEY), Some("test-group_test-flow_A_B_e1"));
}

#[test]
fn test_dead_end_node_is_retried_with_another_format() {
    let graph = graph_with_nodes(&["A", "B", "C", "D"]);
    let any = || vec![executor("local", "*:*")];
    // A -> C delivers avro, which C -> B rejects; A -> D -> C delivers json.
    graph.add_flow_edge(FlowEdge::new("A", "C", "avro", "FS:///to-avro", any()));
    graph.add_flow_edge(FlowEdge::new("A", "D", "json", "FS:///to-json", any()));
    graph.add_flow_edge(FlowEdge::new("D", "C", "copy", COPY_TEMPLATE, any()));
    graph.add_flow_edge(FlowEdge::new("C", "B", "publish", "FS:///json-only", any()));
    let catalog = InMemoryTemplateCatalog::new()
        .with_template(FlowTemplate::new(COPY_TEMPLATE))
        .with_template(
            FlowTemplate::new("FS:///to-avro").with_output(DatasetDescriptor::new("*", "avro")),
        )
        .with_template(
            FlowTemplate::new("FS:///to-json").with_output(DatasetDescriptor::new("*", "json")),
        )
        .with_template(
            FlowTemplate::new("FS:///json-only").with_input(DatasetDescriptor::new("*", "json")),
        );

    let plan = find(&graph, &catalog, &flow("A", "B")).expect("path expected");
    assert_eq!(edge_ids(&plan), vec!["A_D_json", "D_C_copy", "C_B_publish"]);
}
