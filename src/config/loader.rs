use super::Properties;
use crate::error::LoadError;
use itertools::Itertools;
use std::fs;
use std::path::{Path, PathBuf};

/// Turns a file on disk into a resolved property set.
pub trait PropertyLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Properties, LoadError>;
}

/// Loads property files below a root directory, resolving `.conf` overlays.
///
/// For a file at `root/a/b/edge.properties` the overlays are every conf-extension
/// file in `root`, `root/a` and `root/a/b`, merged shallowest first. The file's own
/// entries are applied last and win.
#[derive(Debug, Clone)]
pub struct PullFileLoader {
    root: PathBuf,
    properties_extensions: Vec<String>,
    conf_extensions: Vec<String>,
}

impl PullFileLoader {
    pub fn new(
        root: impl Into<PathBuf>,
        properties_extensions: Vec<String>,
        conf_extensions: Vec<String>,
    ) -> Self {
        Self {
            root: root.into(),
            properties_extensions,
            conf_extensions,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn has_extension(path: &Path, extensions: &[String]) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.iter().any(|x| x == ext))
    }

    fn read(path: &Path) -> Result<Properties, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Properties::parse(&text, path)
    }

    /// Directories from the root down to (and including) `dir`.
    /// Falls back to just `dir` when it does not live under the root.
    fn overlay_dirs(&self, dir: &Path) -> Vec<PathBuf> {
        let Ok(relative) = dir.strip_prefix(&self.root) else {
            return vec![dir.to_path_buf()];
        };
        let mut dirs = vec![self.root.clone()];
        let mut current = self.root.clone();
        for component in relative.components() {
            current = current.join(component);
            dirs.push(current.clone());
        }
        dirs
    }

    fn overlay_files(&self, dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(LoadError::Io {
                    path: dir.to_path_buf(),
                    source,
                });
            }
        };
        Ok(entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && Self::has_extension(p, &self.conf_extensions))
            .sorted()
            .collect())
    }
}

impl PropertyLoader for PullFileLoader {
    fn load(&self, path: &Path) -> Result<Properties, LoadError> {
        let own = Self::read(path)?;
        if !Self::has_extension(path, &self.properties_extensions) {
            return Ok(own);
        }

        let mut resolved = Properties::new();
        if let Some(parent) = path.parent() {
            for dir in self.overlay_dirs(parent) {
                for overlay in self.overlay_files(&dir)? {
                    tracing::trace!(overlay = %overlay.display(), file = %path.display(), "Applying overlay");
                    resolved.merge(&Self::read(&overlay)?);
                }
            }
        }
        resolved.merge(&own);
        Ok(resolved)
    }
}
