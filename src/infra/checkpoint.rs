// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// Only the best model (lowest validation loss) is kept. Files are
// keyed by language and by whether phonetic input was used, since
// the two variants have differently shaped tag heads:
//
//   checkpoints/
//     model_hindi.mpk.gz                ← best weights, hindi
//     model_hindi_phonetic.mpk.gz       ← best weights, hindi + phonetic
//     train_config_hindi.json           ← MorphModelConfig used to build it
//     train_config_hindi_phonetic.json
//
// The config is needed at load time to rebuild the exact
// architecture before the weights are loaded into it.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use tempfile::NamedTempFile;

use crate::ml::model::{MorphModel, MorphModelConfig};

pub struct CheckpointManager {
    dir: PathBuf,
    tag: String,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>, lang: &str, phonetic: bool) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        let tag = if phonetic { format!("{lang}_phonetic") } else { lang.to_string() };
        Ok(Self { dir, tag })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Path without extension; the recorder appends `.mpk.gz`.
    fn model_path(&self) -> PathBuf {
        self.dir.join(format!("model_{}", self.tag))
    }

    fn config_path(&self) -> PathBuf {
        self.dir.join(format!("train_config_{}.json", self.tag))
    }

    /// Overwrite the best-model weights.
    pub fn save_model<B: Backend>(&self, model: &MorphModel<B>) -> Result<()> {
        let path = self.model_path();
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        tracing::debug!("Saved checkpoint '{}'", path.display());
        Ok(())
    }

    /// Load the best-model weights into a freshly built model.
    pub fn load_model<B: Backend>(
        &self,
        model:  MorphModel<B>,
        device: &B::Device,
    ) -> Result<MorphModel<B>> {
        let path = self.model_path();
        tracing::info!("Loading checkpoint '{}'", path.display());

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display()
                )
            })?;

        Ok(model.load_record(record))
    }

    /// Must be called before training starts so inference can rebuild the model.
    pub fn save_config(&self, cfg: &MorphModelConfig) -> Result<()> {
        let path = self.config_path();
        let json = serde_json::to_string_pretty(cfg)?;

        let temp = NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("Cannot create temp file in '{}'", self.dir.display()))?;
        fs::write(temp.path(), json)
            .with_context(|| format!("Cannot write config to '{}'", temp.path().display()))?;
        temp.persist(&path)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<MorphModelConfig> {
        let path = self.config_path();
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. \
                 Make sure you have run 'train' with the same --lang and --phonetic flags.",
                path.display()
            )
        })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed model config '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    fn config() -> MorphModelConfig {
        MorphModelConfig::new(10, 6, 4, 8, 2, 1, vec![2; 6], Vec::new(), 0.0)
    }

    #[test]
    fn test_config_roundtrip_keyed_by_variant() {
        let dir = tempfile::tempdir().unwrap();
        let plain = CheckpointManager::new(dir.path(), "hindi", false).unwrap();
        let phonetic = CheckpointManager::new(dir.path(), "hindi", true).unwrap();

        plain.save_config(&config()).unwrap();
        let loaded = plain.load_config().unwrap();
        assert_eq!(loaded.vocab_width, 10);
        assert_eq!(loaded.feature_classes, vec![2; 6]);
        assert!(phonetic.load_config().is_err());
        assert!(dir.path().join("train_config_hindi.json").exists());
    }

    #[test]
    fn test_model_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path(), "urdu", false).unwrap();
        let device = Default::default();

        let model = config().init::<NdArray>(&device);
        ckpt.save_model(&model).unwrap();

        let fresh = config().init::<NdArray>(&device);
        let restored = ckpt.load_model(fresh, &device).unwrap();
        assert_eq!(restored.max_positions(), 6);
    }
}
