use super::source::{DiffEntry, DiffSource};
use crate::error::RepositoryError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use walkdir::WalkDir;

type Snapshot = BTreeMap<PathBuf, blake3::Hash>;

/// Diffs a checked-out working tree against what it looked like at the previous poll.
///
/// Files are identified by their path relative to the root and compared by content
/// hash. The first poll reports every file as added. `.git` is never scanned.
#[derive(Debug)]
pub struct DirectoryDiffSource {
    root: PathBuf,
    previous: Mutex<Snapshot>,
}

impl DirectoryDiffSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            previous: Mutex::new(Snapshot::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scan(root: &Path) -> Result<Snapshot, RepositoryError> {
        if !root.is_dir() {
            return Err(RepositoryError::Unavailable(root.display().to_string()));
        }
        let mut snapshot = Snapshot::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git");
        for entry in walker {
            let entry = entry.map_err(|e| RepositoryError::Read(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let bytes = std::fs::read(entry.path()).map_err(|e| {
                RepositoryError::Read(format!("{}: {}", entry.path().display(), e))
            })?;
            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(|e| RepositoryError::Read(e.to_string()))?;
            snapshot.insert(relative.to_path_buf(), blake3::hash(&bytes));
        }
        Ok(snapshot)
    }

    /// Changes from `before` to `after`: every delete first, then adds and modifies.
    /// Each group is ordered by path.
    ///
    /// A file moved to a new path with the same derived identity shows up as a
    /// delete and an add; applying the delete first leaves the element in place.
    fn diff(before: &Snapshot, after: &Snapshot) -> Vec<DiffEntry> {
        let deletes = before
            .keys()
            .filter(|p| !after.contains_key(*p))
            .map(DiffEntry::delete);
        let updates = after
            .iter()
            .filter_map(|(path, hash)| match before.get(path) {
                None => Some(DiffEntry::add(path)),
                Some(old) if old != hash => Some(DiffEntry::modify(path)),
                Some(_) => None,
            });
        deletes.chain(updates).collect()
    }
}

#[async_trait]
impl DiffSource for DirectoryDiffSource {
    async fn poll_changes(&self) -> Result<Vec<DiffEntry>, RepositoryError> {
        let root = self.root.clone();
        let current = tokio::task::spawn_blocking(move || Self::scan(&root))
            .await
            .map_err(|e| RepositoryError::Read(format!("scan task failed: {}", e)))??;

        let mut previous = self.previous.lock().await;
        let changes = Self::diff(&previous, &current);
        *previous = current;
        if !changes.is_empty() {
            tracing::debug!(root = %self.root.display(), changes = changes.len(), "Working tree changed");
        }
        Ok(changes)
    }
}
