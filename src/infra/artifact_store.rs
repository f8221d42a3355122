// ============================================================
// Layer 6 — Artifact Store
// ============================================================
// Named JSON blobs shared between train, test and predict runs.
// Every blob is keyed by artifact name AND language:
//
//   artifacts/
//     char_to_index_mapping_hindi.json
//     index_to_char_mapping_hindi.json
//     dict_of_encoders_hindi.json
//     num_of_indiv_features_hindi.json
//     categorized_features_hindi.json
//     class_labels_orig_hindi.json
//     class_labels_transformed_hindi.json
//     ..._urdu.json
//
// so runs for different languages never touch each other's files.
// Writes go to a temp file in the same directory and are renamed
// into place; a reader sees either the old blob or the new one.

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    io::{BufWriter, Write},
    path::PathBuf,
};
use tempfile::NamedTempFile;

use crate::error::{PipelineError, PipelineResult};

pub const CHAR_TO_INDEX: &str            = "char_to_index_mapping";
pub const INDEX_TO_CHAR: &str            = "index_to_char_mapping";
pub const LABEL_SPACES: &str             = "dict_of_encoders";
pub const CLASS_COUNTS: &str             = "num_of_indiv_features";
pub const CATEGORIZED_FEATURES: &str     = "categorized_features";
pub const CLASS_LABELS_ORIG: &str        = "class_labels_orig";
pub const CLASS_LABELS_TRANSFORMED: &str = "class_labels_transformed";

pub struct ArtifactStore {
    dir:  PathBuf,
    lang: String,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, lang: impl Into<String>) -> Self {
        Self { dir: dir.into(), lang: lang.into() }
    }

    /// `<artifact_name>_<language>`
    pub fn key(&self, name: &str) -> String {
        format!("{name}_{}", self.lang)
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", self.key(name)))
    }

    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create artifact directory '{}'", self.dir.display()))?;

        let path = self.path(name);
        let temp = NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("Cannot create temp file in '{}'", self.dir.display()))?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, value)
                .with_context(|| format!("Cannot serialise artifact '{}'", self.key(name)))?;
            writer.flush()?;
        }
        temp.persist(&path)
            .with_context(|| format!("Cannot write artifact to '{}'", path.display()))?;

        tracing::debug!("Saved artifact '{}' to '{}'", self.key(name), path.display());
        Ok(())
    }

    pub fn load<T: DeserializeOwned>(&self, name: &str) -> PipelineResult<T> {
        let path = self.path(name);
        let key = self.key(name);
        let json = fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PipelineError::MissingArtifact {
                key:  key.clone(),
                path: path.display().to_string(),
            },
            _ => PipelineError::Io(e),
        })?;
        serde_json::from_str(&json).map_err(|source| PipelineError::MalformedArtifact { key, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_keyed_by_language() {
        let dir = tempfile::tempdir().unwrap();
        let hindi = ArtifactStore::new(dir.path(), "hindi");
        let urdu = ArtifactStore::new(dir.path(), "urdu");

        hindi.save(CLASS_COUNTS, &vec![3usize, 2]).unwrap();
        urdu.save(CLASS_COUNTS, &vec![5usize]).unwrap();

        assert_eq!(hindi.key(CLASS_COUNTS), "num_of_indiv_features_hindi");
        assert_eq!(hindi.load::<Vec<usize>>(CLASS_COUNTS).unwrap(), vec![3, 2]);
        assert_eq!(urdu.load::<Vec<usize>>(CLASS_COUNTS).unwrap(), vec![5]);
    }

    #[test]
    fn test_missing_artifact_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), "hindi");
        let err = store.load::<Vec<usize>>(LABEL_SPACES).unwrap_err();
        assert!(matches!(err, PipelineError::MissingArtifact { ref key, .. } if key == "dict_of_encoders_hindi"));
    }

    #[test]
    fn test_malformed_artifact_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), "hindi");
        fs::write(store.path(CLASS_COUNTS), "{not json").unwrap();
        assert!(matches!(
            store.load::<Vec<usize>>(CLASS_COUNTS),
            Err(PipelineError::MalformedArtifact { .. })
        ));
    }
}
