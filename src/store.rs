//! Persistence of the category → model registry.
//!
//! The registry is written as a single JSON artifact. Floats are written with
//! round-trip precision, so a reloaded model forecasts bit-identically.

use crate::error::PersistenceError;
use crate::models::{ModelFamily, ModelRegistry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default artifact location for the seasonal family.
pub const DEFAULT_MODEL_PATH: &str = "models/accident_predictor_sarima.json";

/// Version of the artifact layout written by [`ModelStore::save`].
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct ArtifactRef<'a> {
    format_version: u32,
    family: Option<ModelFamily>,
    saved_at: DateTime<Utc>,
    models: &'a ModelRegistry,
}

#[derive(Deserialize)]
struct Artifact {
    models: ModelRegistry,
}

#[derive(Deserialize)]
struct ArtifactHeader {
    format_version: u32,
}

/// Reads and writes the registry artifact at a fixed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStore {
    path: PathBuf,
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_PATH)
    }
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location for `family`.
    pub fn for_family(family: ModelFamily) -> Self {
        Self::new(family.default_artifact_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Write the registry, replacing any previous artifact.
    ///
    /// The parent directory is created when missing. The artifact is written
    /// to a sibling file and renamed into place.
    pub fn save(&self, registry: &ModelRegistry) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(parent, source))?;
        }

        let artifact = ArtifactRef {
            format_version: FORMAT_VERSION,
            family: common_family(registry),
            saved_at: Utc::now(),
            models: registry,
        };

        let staging = self.path.with_extension("json.tmp");
        if let Err(e) = self.write_staged(&staging, &artifact) {
            if let Err(cleanup) = fs::remove_file(&staging) {
                debug!(path = %staging.display(), error = %cleanup, "staging file not removed");
            }
            return Err(e);
        }

        info!(
            path = %self.path.display(),
            models = registry.len(),
            "saved model registry"
        );
        Ok(())
    }

    fn write_staged(&self, staging: &Path, artifact: &ArtifactRef<'_>) -> Result<(), PersistenceError> {
        let file = File::create(staging).map_err(|source| self.io_error(staging, source))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, artifact)?;
        writer
            .flush()
            .map_err(|source| self.io_error(staging, source))?;
        drop(writer);
        fs::rename(staging, &self.path).map_err(|source| self.io_error(&self.path, source))
    }

    /// Read the registry, surfacing every failure.
    pub fn try_load(&self) -> Result<ModelRegistry, PersistenceError> {
        let bytes = fs::read(&self.path).map_err(|source| self.io_error(&self.path, source))?;

        let header: ArtifactHeader = serde_json::from_slice(&bytes)?;
        if header.format_version != FORMAT_VERSION {
            return Err(PersistenceError::FormatVersion {
                found: header.format_version,
                expected: FORMAT_VERSION,
            });
        }

        let artifact: Artifact = serde_json::from_slice(&bytes)?;
        Ok(artifact.models)
    }

    /// Read the registry, degrading to an empty one on any failure.
    ///
    /// A missing artifact is expected before the first training run; the
    /// caller serves no categories until one is published.
    pub fn load(&self) -> ModelRegistry {
        match self.try_load() {
            Ok(registry) => {
                info!(
                    path = %self.path.display(),
                    models = registry.len(),
                    "loaded model registry"
                );
                registry
            }
            Err(PersistenceError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                warn!(
                    path = %self.path.display(),
                    "no model artifact found, starting with an empty registry"
                );
                ModelRegistry::new()
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to load model artifact, starting with an empty registry"
                );
                ModelRegistry::new()
            }
        }
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Family shared by every model, if there is exactly one.
fn common_family(registry: &ModelRegistry) -> Option<ModelFamily> {
    let mut families = registry.iter().map(|(_, m)| m.family());
    let first = families.next()?;
    families.all(|f| f == first).then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MonthlySeries;
    use crate::models::arima::ARIMA;
    use crate::models::Forecaster;
    use chrono::NaiveDate;

    fn registry() -> ModelRegistry {
        let values: Vec<f64> = (0..36).map(|i| 20.0 + (i % 12) as f64 * 1.5).collect();
        let series =
            MonthlySeries::new(NaiveDate::from_ymd_opt(2017, 1, 1).unwrap(), values).unwrap();
        let mut model = ARIMA::new(2, 1, 0);
        model.fit(&series).unwrap();

        let mut registry = ModelRegistry::new();
        registry.insert("X", model);
        registry
    }

    #[test]
    fn save_creates_directory_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("nested/models/registry.json"));
        let registry = registry();

        store.save(&registry).unwrap();
        assert!(store.exists());
        assert_eq!(store.try_load().unwrap(), registry);
    }

    #[test]
    fn save_overwrites_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("registry.json"));

        store.save(&registry()).unwrap();
        store.save(&ModelRegistry::new()).unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn missing_artifact_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("absent.json"));

        assert!(matches!(store.try_load(), Err(PersistenceError::Io { .. })));
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_artifact_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        fs::write(&path, b"{ not json").unwrap();
        let store = ModelStore::new(&path);

        assert!(matches!(
            store.try_load(),
            Err(PersistenceError::Serialization(_))
        ));
        assert!(store.load().is_empty());
    }

    #[test]
    fn unknown_format_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        fs::write(&path, br#"{"format_version": 99, "models": {}}"#).unwrap();
        let store = ModelStore::new(&path);

        assert!(matches!(
            store.try_load(),
            Err(PersistenceError::FormatVersion {
                found: 99,
                expected: FORMAT_VERSION
            })
        ));
        assert!(store.load().is_empty());
    }

    #[test]
    fn artifact_records_family() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("registry.json"));
        store.save(&registry()).unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(json["format_version"], FORMAT_VERSION);
        assert_eq!(json["family"], "arima");
        assert_eq!(json["models"]["X"]["family"], "arima");
    }

    #[test]
    fn failed_save_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("registry.json");
        fs::create_dir_all(target.join("occupied")).unwrap();
        let store = ModelStore::new(&target);

        let err = store.save(&registry()).unwrap_err();
        assert!(matches!(err, PersistenceError::Io { ref path, .. } if path == &target));
        assert!(!dir.path().join("registry.json.tmp").exists());
        assert!(target.is_dir());
    }

    #[test]
    fn default_paths() {
        assert_eq!(ModelStore::default().path(), Path::new(DEFAULT_MODEL_PATH));
        assert_eq!(
            ModelStore::for_family(ModelFamily::Arima).path(),
            Path::new("models/accident_predictor_arima.json")
        );
    }
}
