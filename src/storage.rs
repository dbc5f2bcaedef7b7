//! Persistence of the experiment set.
//!
//! The registry rewrites the whole set after every successful mutation. The
//! JSON-file backend writes `{"experiments": [...]}` through a temp file in the
//! same directory and renames it into place, so readers never observe a
//! half-written file.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::store::{Experiment, ExperimentFile};

/// Durable home of the experiment set.
pub trait ExperimentStorage: Send + Sync {
    fn load(&self) -> Result<Vec<Experiment>, StorageError>;
    fn save(&self, experiments: &[Experiment]) -> Result<(), StorageError>;
}

#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ExperimentStorage for JsonFileStorage {
    fn load(&self) -> Result<Vec<Experiment>, StorageError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Experiment file {:?} not found, starting empty", self.path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };
        let file: ExperimentFile = serde_json::from_str(&content)?;
        info!(
            "Loaded {} experiments from {:?}",
            file.experiments.len(),
            self.path
        );
        Ok(file.experiments)
    }

    fn save(&self, experiments: &[Experiment]) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;

        let file = ExperimentFile {
            experiments: experiments.to_vec(),
        };
        serde_json::to_writer(&mut tmp, &file)?;
        tmp.flush().map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path)?;

        debug!("Wrote {} experiments to {:?}", experiments.len(), self.path);
        Ok(())
    }
}

/// Storage that keeps the last saved set in memory. For embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    saved: Mutex<Vec<Experiment>>,
    saves: Mutex<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_experiments(experiments: Vec<Experiment>) -> Self {
        Self {
            saved: Mutex::new(experiments),
            saves: Mutex::new(0),
        }
    }

    /// Snapshot of what was last persisted.
    pub fn snapshot(&self) -> Vec<Experiment> {
        self.saved.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ExperimentStorage for MemoryStorage {
    fn load(&self) -> Result<Vec<Experiment>, StorageError> {
        Ok(self.snapshot())
    }

    fn save(&self, experiments: &[Experiment]) -> Result<(), StorageError> {
        *self.saved.lock().unwrap_or_else(|e| e.into_inner()) = experiments.to_vec();
        *self.saves.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}
