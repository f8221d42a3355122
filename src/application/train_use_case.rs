// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Resolve paths for the language     (Layer 2 - config)
//   Step 2: Load train + validation corpora    (Layer 4 - data)
//   Step 3: Pool them, train corpus first      (Layer 3 - domain)
//   Step 4: Fit + save vocabulary and labels   (Layer 6 - infra)
//   Step 5: Tensorise the pool                 (Layer 2 - pipeline)
//   Step 6: Split back at the train length     (Layer 4 - data)
//   Step 7: Save model config                  (Layer 6 - infra)
//   Step 8: Run training loop                  (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::{
    config::{Mode, RunConfig},
    pipeline::{tensorize_corpus, PipelineArtifacts},
};
use crate::data::{
    context::DEFAULT_CONTEXT_WINDOW,
    dataset::{samples_from_bundle, MorphDataset},
    loader::TsvCorpusLoader,
    phonetic::ScriptClassPhonetics,
    splitter::split_train_val,
    vocabulary::DEFAULT_VOCAB_SIZE,
};
use crate::domain::{
    corpus::Corpus,
    traits::{CorpusSource, PhoneticFeatureSource},
};
use crate::error::PipelineError;
use crate::infra::{
    artifact_store::ArtifactStore,
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
};
use crate::ml::{
    model::MorphModelConfig,
    trainer::{run_training, TrainingSummary},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub run:            RunConfig,
    pub epochs:         usize,
    pub lr:             f64,
    pub embed_dim:      usize,
    pub hidden_dim:     usize,
    pub num_heads:      usize,
    pub dropout:        f64,
    pub patience:       usize,
    pub vocab_size:     usize,
    pub context_window: usize,
    /// Lower bound on the model's maximum word width.
    pub max_positions:  usize,
    pub seed:           u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            run:            RunConfig::default(),
            epochs:         50,
            lr:             1e-3,
            embed_dim:      64,
            hidden_dim:     128,
            num_heads:      4,
            dropout:        0.1,
            patience:       10,
            vocab_size:     DEFAULT_VOCAB_SIZE,
            context_window: DEFAULT_CONTEXT_WINDOW,
            max_positions:  32,
            seed:           42,
        }
    }
}

impl TrainConfig {
    /// Reject parameter combinations the model cannot be built with.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let fail = |msg: String| Err(PipelineError::Config(msg));
        if self.vocab_size < 1 {
            return fail("vocab size must be at least 1".to_string());
        }
        if self.num_heads == 0 || self.hidden_dim % self.num_heads != 0 {
            return fail(format!(
                "hidden dim {} must be divisible by the number of heads {}",
                self.hidden_dim, self.num_heads
            ));
        }
        if self.embed_dim == 0 {
            return fail("embedding dim must be positive".to_string());
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return fail(format!("dropout {} outside [0, 1)", self.dropout));
        }
        if self.lr <= 0.0 {
            return fail(format!("learning rate {} must be positive", self.lr));
        }
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainingSummary> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Resolve paths ─────────────────────────────────────────────
        let (paths, lang_paths) = cfg.run.resolve(Mode::Train)?;

        // ── Step 2: Load corpora ──────────────────────────────────────────────
        let train_path = lang_paths.train.as_ref().context("train path missing")?;
        let train = TsvCorpusLoader::new(train_path).load_corpus()?;
        let validation = match &lang_paths.validation {
            Some(path) => TsvCorpusLoader::new(path).load_corpus()?,
            None => Corpus::default(),
        };
        tracing::info!("Loaded {} train and {} validation tokens", train.len(), validation.len());

        if train.is_empty() {
            return Err(PipelineError::Config(format!(
                "training corpus '{}' is empty",
                train_path.display()
            ))
            .into());
        }

        // ── Step 3: Pool ──────────────────────────────────────────────────────
        let train_size = train.len();
        let pool = train.concat(validation);

        // ── Step 4: Fit + save artifacts ──────────────────────────────────────
        let store = ArtifactStore::new(&paths.artifact_dir, &cfg.run.lang);
        let (artifacts, fitted) = PipelineArtifacts::fit(&pool, cfg.vocab_size)?;
        artifacts.save(&store, &fitted)?;

        // ── Step 5: Tensorise ─────────────────────────────────────────────────
        let phonetic_source = ScriptClassPhonetics;
        let phonetic: Option<&dyn PhoneticFeatureSource> =
            cfg.run.phonetic.then_some(&phonetic_source as &dyn PhoneticFeatureSource);
        let (inputs, targets) = tensorize_corpus(&pool, &artifacts, cfg.context_window, phonetic)?;
        tracing::info!("Tensorised {} samples at word width {}", inputs.len(), inputs.width());

        // ── Step 6: Split ─────────────────────────────────────────────────────
        let samples = samples_from_bundle(&inputs, Some(&targets));
        let (train_samples, val_samples) = split_train_val(samples, train_size);

        // ── Step 7: Save model config ─────────────────────────────────────────
        let model_cfg = MorphModelConfig::new(
            artifacts.vocab.width(),
            cfg.max_positions.max(inputs.width()),
            cfg.embed_dim,
            cfg.hidden_dim,
            cfg.num_heads,
            cfg.context_window,
            artifacts.codec.class_counts(),
            inputs.phonetic_widths(),
            cfg.dropout,
        );
        let ckpt_manager = CheckpointManager::new(&paths.checkpoint_dir, &cfg.run.lang, cfg.run.phonetic)?;
        ckpt_manager.save_config(&model_cfg)?;
        let metrics = MetricsLogger::new(ckpt_manager.dir().clone(), &cfg.run.lang)?;

        // ── Step 8: Train ─────────────────────────────────────────────────────
        run_training(
            cfg,
            &model_cfg,
            MorphDataset::new(train_samples),
            MorphDataset::new(val_samples),
            &ckpt_manager,
            &metrics,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_heads_must_divide_hidden_dim() {
        let cfg = TrainConfig { hidden_dim: 30, num_heads: 4, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_dropout_range() {
        let cfg = TrainConfig { dropout: 1.0, ..Default::default() };
        assert!(cfg.validate().is_err());
    }
}
