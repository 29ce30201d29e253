//! Directory of board manifests keyed by board id.

use std::collections::BTreeMap;
use std::path::Path;

use walkdir::WalkDir;

use crate::{BoardConfig, BoardError};

/// All board manifests found under a directory, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct BoardRegistry {
    boards: BTreeMap<String, BoardConfig>,
}

impl BoardRegistry {
    /// Load every `*.json` file under `dir` (recursively, sorted by name).
    ///
    /// # Errors
    ///
    /// Returns the first [`BoardError`] raised while walking the directory
    /// or parsing a manifest.
    pub fn load_dir(dir: &Path) -> Result<Self, BoardError> {
        let mut registry = Self::default();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            let is_manifest = entry.file_type().is_file()
                && entry.path().extension().and_then(|e| e.to_str()) == Some("json");
            if !is_manifest {
                continue;
            }
            let board = BoardConfig::load(entry.path())?;
            tracing::debug!(id = %board.id, path = %entry.path().display(), "loaded board manifest");
            registry.insert(board);
        }
        Ok(registry)
    }

    /// Add or replace a board.
    pub fn insert(&mut self, board: BoardConfig) {
        self.boards.insert(board.id.clone(), board);
    }

    /// Look a board up by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&BoardConfig> {
        self.boards.get(id)
    }

    /// Number of boards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boards.len()
    }

    /// `true` if no manifests were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    /// Boards in id order.
    pub fn iter(&self) -> impl Iterator<Item = &BoardConfig> {
        self.boards.values()
    }

    /// Boards in id order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BoardConfig> {
        self.boards.values_mut()
    }
}
