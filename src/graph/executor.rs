use crate::config::Properties;
use crate::config::keys::{ANY, SPEC_EXECUTOR_CAPABILITIES_KEY, SPEC_EXECUTOR_CLASS_KEY};
use crate::error::FactoryError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A `(source platform, destination platform)` pair an executor can move data between.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capability {
    pub source_platform: String,
    pub destination_platform: String,
}

impl Capability {
    pub fn new(source_platform: impl Into<String>, destination_platform: impl Into<String>) -> Self {
        Self {
            source_platform: source_platform.into(),
            destination_platform: destination_platform.into(),
        }
    }

    /// Parses a single `source:destination` pair.
    pub fn parse(text: &str) -> Result<Self, FactoryError> {
        let invalid = || FactoryError::InvalidProperty {
            key: SPEC_EXECUTOR_CAPABILITIES_KEY.to_string(),
            value: text.to_string(),
        };
        let (src, dst) = text.split_once(':').ok_or_else(invalid)?;
        let (src, dst) = (src.trim(), dst.trim());
        if src.is_empty() || dst.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(src, dst))
    }

    /// Parses a comma separated capability list.
    pub fn parse_list(text: &str) -> Result<Vec<Self>, FactoryError> {
        text.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::parse)
            .collect()
    }

    /// True if this declared capability covers `required`. `*` matches any platform.
    pub fn satisfies(&self, required: &Capability) -> bool {
        let matches = |declared: &str, wanted: &str| declared == ANY || declared == wanted;
        matches(&self.source_platform, &required.source_platform)
            && matches(&self.destination_platform, &required.destination_platform)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source_platform, self.destination_platform)
    }
}

/// An opaque handle to a runtime executor, as declared in an edge file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecExecutor {
    pub class: String,
    /// The executor's whole configuration block, including class and capabilities.
    pub config: Properties,
    pub capabilities: Vec<Capability>,
}

impl SpecExecutor {
    pub fn new(class: impl Into<String>, capabilities: Vec<Capability>) -> Self {
        let class = class.into();
        let config = Properties::new()
            .with_value(SPEC_EXECUTOR_CLASS_KEY, class.clone())
            .with_value(
                SPEC_EXECUTOR_CAPABILITIES_KEY,
                capabilities.iter().map(ToString::to_string).collect::<Vec<_>>().join(","),
            );
        Self {
            class,
            config,
            capabilities,
        }
    }

    /// Builds an executor from its configuration block (keys relative to the block).
    pub fn from_properties(config: Properties) -> Result<Self, FactoryError> {
        let class = config.require(SPEC_EXECUTOR_CLASS_KEY)?.to_string();
        let capabilities = Capability::parse_list(config.get_or(SPEC_EXECUTOR_CAPABILITIES_KEY, ""))?;
        Ok(Self {
            class,
            config,
            capabilities,
        })
    }

    pub fn supports(&self, required: &Capability) -> bool {
        self.capabilities.iter().any(|c| c.satisfies(required))
    }
}
