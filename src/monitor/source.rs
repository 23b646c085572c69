use crate::error::RepositoryError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Add,
    Modify,
    Copy,
    Delete,
    Rename,
}

/// One file-level change, with paths relative to the repository root.
///
/// `old_path` is `None` for an add, `new_path` is `None` for a delete. Both are
/// set (and equal) for a modification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    pub change_type: ChangeType,
    pub old_path: Option<PathBuf>,
    pub new_path: Option<PathBuf>,
}

impl DiffEntry {
    pub fn add(path: impl Into<PathBuf>) -> Self {
        Self {
            change_type: ChangeType::Add,
            old_path: None,
            new_path: Some(path.into()),
        }
    }

    pub fn modify(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            change_type: ChangeType::Modify,
            old_path: Some(path.clone()),
            new_path: Some(path),
        }
    }

    pub fn delete(path: impl Into<PathBuf>) -> Self {
        Self {
            change_type: ChangeType::Delete,
            old_path: Some(path.into()),
            new_path: None,
        }
    }

    pub fn rename(old_path: impl Into<PathBuf>, new_path: impl Into<PathBuf>) -> Self {
        Self {
            change_type: ChangeType::Rename,
            old_path: Some(old_path.into()),
            new_path: Some(new_path.into()),
        }
    }
}

/// Produces the ordered changes made to the repository since the previous call.
#[async_trait]
pub trait DiffSource: Send + Sync {
    async fn poll_changes(&self) -> Result<Vec<DiffEntry>, RepositoryError>;
}

/// A diff source fed by hand, one batch per poll.
#[derive(Debug, Default)]
pub struct InMemoryDiffSource {
    batches: Mutex<VecDeque<Result<Vec<DiffEntry>, RepositoryError>>>,
}

impl InMemoryDiffSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a batch returned by a later poll.
    pub fn push(&self, changes: Vec<DiffEntry>) {
        self.enqueue(Ok(changes));
    }

    /// Queues a poll that fails.
    pub fn push_error(&self, error: RepositoryError) {
        self.enqueue(Err(error));
    }

    pub fn pending(&self) -> usize {
        self.batches.lock().map(|b| b.len()).unwrap_or(0)
    }

    fn enqueue(&self, batch: Result<Vec<DiffEntry>, RepositoryError>) {
        if let Ok(mut batches) = self.batches.lock() {
            batches.push_back(batch);
        }
    }
}

#[async_trait]
impl DiffSource for InMemoryDiffSource {
    async fn poll_changes(&self) -> Result<Vec<DiffEntry>, RepositoryError> {
        let mut batches = self
            .batches
            .lock()
            .map_err(|_| RepositoryError::Read("diff queue lock poisoned".to_string()))?;
        batches.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}
