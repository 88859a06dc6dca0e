//! Process-local facade: loads a dataset
//! from on-disk files into process-private memory, for the engine's
//! entire lifetime.

use std::sync::Arc;

use crate::config::StorageConfig;
use crate::dataset::Dataset;
use crate::error::Status;
use crate::facade::Facade;
use crate::revision::GenerationId;

/// A facade that exclusively owns a [`Dataset`] loaded from a fixed
/// set of file paths at construction. Its generation id never
/// changes; there is nothing to reload.
pub struct LocalFacade {
    dataset: Arc<Dataset>,
}

impl LocalFacade {
    /// Load the dataset named by `config`. Fails with
    /// [`crate::error::EngineError::ConfigInvalid`] if any required
    /// path is missing or unreadable.
    pub fn load(config: &StorageConfig) -> Status<Self> {
        let dataset = Dataset::load(config, GenerationId::first())?;
        Ok(LocalFacade {
            dataset: Arc::new(dataset),
        })
    }

    /// Wrap an already-built dataset directly, bypassing the file
    /// loader. Useful for tests and embedders that construct a
    /// dataset in memory.
    pub fn from_dataset(dataset: Dataset) -> Self {
        LocalFacade {
            dataset: Arc::new(dataset),
        }
    }
}

impl Facade for LocalFacade {
    fn current(&self) -> Status<Arc<Dataset>> {
        Ok(self.dataset.clone())
    }

    fn attached_generation(&self) -> GenerationId {
        self.dataset.generation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::synthetic_line;
    use tempfile::tempdir;

    #[test]
    fn load_fails_on_missing_paths() {
        let dir = tempdir().unwrap();
        let config = StorageConfig::from_directory(dir.path());
        assert!(LocalFacade::load(&config).is_err());
    }

    #[test]
    fn load_succeeds_on_valid_dataset() {
        let dir = tempdir().unwrap();
        let config = StorageConfig::from_directory(dir.path());
        let dataset = synthetic_line(GenerationId::first(), 4);
        dataset.write_to_directory(&config).unwrap();

        let facade = LocalFacade::load(&config).unwrap();
        assert_eq!(facade.attached_generation(), GenerationId::first());
        assert_eq!(facade.current().unwrap().node_count(), 4);
    }

    #[test]
    fn generation_never_changes() {
        let dataset = synthetic_line(GenerationId::first(), 2);
        let facade = LocalFacade::from_dataset(dataset);
        let first = facade.current().unwrap();
        let second = facade.current().unwrap();
        assert_eq!(first.generation(), second.generation());
    }
}
