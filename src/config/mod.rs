//! Property sets and the monitor configuration.

pub mod keys;
pub mod loader;

pub use loader::{PropertyLoader, PullFileLoader};

use crate::error::{ConfigError, FactoryError, LoadError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A flat, ordered set of string properties.
///
/// Nested structure is expressed with dotted keys (`flow.edge.specExecutors.0.specExecInstance.class`);
/// [`Properties::subtree`] strips a prefix to get at a nested block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties(BTreeMap<String, String>);

impl Properties {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Returns the value for `key` or a `MissingProperty` error.
    pub fn require(&self, key: &str) -> Result<&str, FactoryError> {
        self.get(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| FactoryError::MissingProperty(key.to_string()))
    }

    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool, FactoryError> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(true),
                "false" | "no" | "0" => Ok(false),
                _ => Err(FactoryError::InvalidProperty {
                    key: key.to_string(),
                    value: v.to_string(),
                }),
            },
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Copies every entry of `other` into `self`, overriding existing keys.
    pub fn merge(&mut self, other: &Properties) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    /// Returns the entries under `prefix.`, with the prefix removed.
    pub fn subtree(&self, prefix: &str) -> Properties {
        let dotted = format!("{}.", prefix);
        self.0
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(&dotted)
                    .map(|rest| (rest.to_string(), v.clone()))
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses property-file text.
    ///
    /// Accepts `key=value`, `key: value` and `key value` entries, `#` and `!` comments,
    /// trailing-backslash continuation lines, backslash escapes (`\=`, `\:`, `\\`, `\n`)
    /// and optionally double-quoted values. `path` is only used for error reporting.
    pub fn parse(text: &str, path: &Path) -> Result<Self, LoadError> {
        let mut props = Properties::new();
        let mut pending: Option<(usize, String)> = None;

        for (idx, raw) in text.lines().enumerate() {
            let trimmed = raw.trim();
            let (start_line, logical) = match pending.take() {
                Some((start, mut acc)) => {
                    acc.push_str(trimmed);
                    (start, acc)
                }
                None => {
                    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                        continue;
                    }
                    (idx + 1, trimmed.to_string())
                }
            };

            if ends_with_continuation(&logical) {
                let stripped = &logical[..logical.len() - 1];
                pending = Some((start_line, stripped.to_string()));
                continue;
            }
            let (key, value) = split_entry(&logical, path, start_line)?;
            props.insert(key, value);
        }

        if let Some((start_line, logical)) = pending {
            let (key, value) = split_entry(&logical, path, start_line)?;
            props.insert(key, value);
        }
        Ok(props)
    }
}

/// An odd run of trailing backslashes continues the line; an even run is escaped backslashes.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_entry(line: &str, path: &Path, line_no: usize) -> Result<(String, String), LoadError> {
    let malformed = |message: &str| LoadError::Parse {
        path: path.to_path_buf(),
        line: line_no,
        message: message.to_string(),
    };

    let mut escaped = false;
    let sep = line
        .char_indices()
        .find(|&(_, c)| {
            if escaped {
                escaped = false;
                return false;
            }
            escaped = c == '\\';
            c == '=' || c == ':' || c.is_whitespace()
        })
        .map(|(i, _)| i)
        .ok_or_else(|| malformed("expected a key/value separator"))?;
    let key = unescape(line[..sep].trim());
    if key.is_empty() {
        return Err(malformed("empty key"));
    }
    let rest = line[sep..].trim_start();
    let rest = rest.strip_prefix(['=', ':']).unwrap_or(rest).trim();
    let value = rest
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .unwrap_or(rest);
    Ok((key, unescape(value)))
}

/// Resolves `\\`, `\n`, `\t`, `\r` and `\f`; any other escaped character stands for itself.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000C}'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn default_repository_dir() -> PathBuf {
    PathBuf::from("git-flowgraph")
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_polling_interval_secs() -> u64 {
    60
}

fn default_flowgraph_dir() -> String {
    "gobblin-flowgraph".to_string()
}

fn default_properties_extensions() -> Vec<String> {
    vec!["properties".to_string(), "props".to_string()]
}

fn default_conf_extensions() -> Vec<String> {
    vec!["configuration".to_string(), "conf".to_string()]
}

/// Settings for the flow-graph monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Location of the version-controlled topology repository. Required.
    #[serde(default)]
    pub repository_uri: Option<String>,
    /// Local working copy of the repository. Files are loaded relative to this directory.
    #[serde(default = "default_repository_dir")]
    pub repository_dir: PathBuf,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_polling_interval_secs")]
    pub polling_interval_secs: u64,
    /// Name of the flow-graph root directory inside the repository.
    #[serde(default = "default_flowgraph_dir")]
    pub flowgraph_dir: String,
    #[serde(default = "default_properties_extensions")]
    pub properties_extensions: Vec<String>,
    #[serde(default = "default_conf_extensions")]
    pub conf_extensions: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            repository_uri: None,
            repository_dir: default_repository_dir(),
            branch: default_branch(),
            polling_interval_secs: default_polling_interval_secs(),
            flowgraph_dir: default_flowgraph_dir(),
            properties_extensions: default_properties_extensions(),
            conf_extensions: default_conf_extensions(),
        }
    }
}

impl MonitorConfig {
    /// Creates a config with defaults for everything but the repository location.
    pub fn new(repository_uri: impl Into<String>, repository_dir: impl Into<PathBuf>) -> Self {
        Self {
            repository_uri: Some(repository_uri.into()),
            repository_dir: repository_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_flowgraph_dir(mut self, dir: impl Into<String>) -> Self {
        self.flowgraph_dir = dir.into();
        self
    }

    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval_secs = interval.as_secs().max(1);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: MonitorConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the `flowgraph.monitor.*` keys of a service property set.
    pub fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let polling_interval_secs = match props.get(keys::MONITOR_POLLING_INTERVAL_KEY) {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidSetting {
                key: keys::MONITOR_POLLING_INTERVAL_KEY.to_string(),
                value: v.to_string(),
                message: "expected a whole number of seconds".to_string(),
            })?,
            None => defaults.polling_interval_secs,
        };
        let split_list = |v: &str| -> Vec<String> {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        };

        let config = Self {
            repository_uri: props.get(keys::MONITOR_REPO_URI_KEY).map(str::to_string),
            repository_dir: props
                .get(keys::MONITOR_REPO_DIR_KEY)
                .map(PathBuf::from)
                .unwrap_or(defaults.repository_dir),
            branch: props
                .get(keys::MONITOR_BRANCH_KEY)
                .map(str::to_string)
                .unwrap_or(defaults.branch),
            polling_interval_secs,
            flowgraph_dir: props
                .get(keys::MONITOR_FLOWGRAPH_DIR_KEY)
                .map(str::to_string)
                .unwrap_or(defaults.flowgraph_dir),
            properties_extensions: props
                .get(keys::MONITOR_PROPERTIES_EXTENSIONS_KEY)
                .map(split_list)
                .unwrap_or(defaults.properties_extensions),
            conf_extensions: props
                .get(keys::MONITOR_CONF_EXTENSIONS_KEY)
                .map(split_list)
                .unwrap_or(defaults.conf_extensions),
        };
        config.validate()?;
        Ok(config)
    }

    /// Fails fast on settings the monitor cannot run without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.repository_uri {
            Some(uri) if !uri.trim().is_empty() => {}
            _ => return Err(ConfigError::MissingSetting("repository_uri".to_string())),
        }
        if self.polling_interval_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "polling_interval_secs".to_string(),
                value: "0".to_string(),
                message: "polling interval must be positive".to_string(),
            });
        }
        if self.flowgraph_dir.is_empty() || self.flowgraph_dir.contains('/') {
            return Err(ConfigError::InvalidSetting {
                key: "flowgraph_dir".to_string(),
                value: self.flowgraph_dir.clone(),
                message: "must be a single directory name".to_string(),
            });
        }
        if self.properties_extensions.is_empty() {
            return Err(ConfigError::MissingSetting(
                "properties_extensions".to_string(),
            ));
        }
        Ok(())
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_secs)
    }

    /// Absolute location of the flow-graph root inside the working copy.
    pub fn flowgraph_root(&self) -> PathBuf {
        self.repository_dir.join(&self.flowgraph_dir)
    }
}
