use super::SkipReason;
use crate::config::MonitorConfig;
use std::path::{Component, Path};

/// Component count of a node file: `<root>/<node>/<file>`.
pub(crate) const NODE_FILE_DEPTH: usize = 3;
/// Component count of an edge file: `<root>/<source>/<destination>/<file>`.
pub(crate) const EDGE_FILE_DEPTH: usize = 4;

/// What a repository path means to the flow graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PathClass {
    Node {
        id: String,
    },
    Edge {
        source: String,
        destination: String,
        name: String,
    },
    Skipped(SkipReason),
    Ignored,
}

/// Classifies a repository-relative path. The identity is taken from the directory
/// layout only; nothing inside the file is consulted.
pub(crate) fn classify(path: &Path, config: &MonitorConfig) -> PathClass {
    let parts: Option<Vec<&str>> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_str()),
            _ => None,
        })
        .collect();
    let Some(parts) = parts else {
        return PathClass::Ignored;
    };
    if parts.len() != NODE_FILE_DEPTH && parts.len() != EDGE_FILE_DEPTH {
        return PathClass::Ignored;
    }

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let is_one_of = |set: &[String]| set.iter().any(|x| x == extension);
    if !is_one_of(&config.properties_extensions) {
        let reason = if is_one_of(&config.conf_extensions) {
            SkipReason::OverlayFile
        } else {
            SkipReason::UnsupportedExtension
        };
        return PathClass::Skipped(reason);
    }

    if parts[0] != config.flowgraph_dir {
        return PathClass::Skipped(SkipReason::OutsideFlowGraphDir);
    }

    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return PathClass::Ignored;
    };
    if parts.len() == NODE_FILE_DEPTH {
        PathClass::Node {
            id: parts[1].to_string(),
        }
    } else {
        PathClass::Edge {
            source: parts[1].to_string(),
            destination: parts[2].to_string(),
            name: stem.to_string(),
        }
    }
}
