use crate::config::Properties;
use serde::{Deserialize, Serialize};

/// A named storage or compute location participating in data movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataNode {
    pub id: String,
    /// Factory class the node was built with.
    pub class: String,
    /// Storage platform backing the node, e.g. `hdfs` or `adl`.
    pub platform: String,
    pub active: bool,
    pub properties: Properties,
}

impl DataNode {
    pub fn new(id: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            class: "base".to_string(),
            platform: platform.into(),
            active: true,
            properties: Properties::new(),
        }
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}
