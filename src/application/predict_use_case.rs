// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Analyses unannotated sentences with a trained model.
// Each sentence is tensorised on its own, so its padding width
// is the length of its longest word.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::application::{
    config::{Mode, RunConfig},
    pipeline::{analyze_sentences, PipelineArtifacts},
};
use crate::data::{loader::TsvCorpusLoader, phonetic::ScriptClassPhonetics};
use crate::domain::traits::{PhoneticFeatureSource, SentenceSource};
use crate::infra::{artifact_store::ArtifactStore, checkpoint::CheckpointManager, report};
use crate::ml::inferencer::Inferencer;

pub struct PredictUseCase {
    config: RunConfig,
}

impl PredictUseCase {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Returns the path of the written predictions file.
    pub fn execute(&self) -> Result<PathBuf> {
        let cfg = &self.config;
        let (paths, lang_paths) = cfg.resolve(Mode::Predict)?;

        let artifacts = PipelineArtifacts::load(&ArtifactStore::new(&paths.artifact_dir, &cfg.lang))?;
        let ckpt_manager = CheckpointManager::new(&paths.checkpoint_dir, &cfg.lang, cfg.phonetic)?;
        let inferencer = Inferencer::from_checkpoint(&ckpt_manager, cfg.batch_size)?;

        let input = lang_paths.predict_input.as_ref().context("predict_input path missing")?;
        let sentences = TsvCorpusLoader::new(input).required().load_sentences()?;
        tracing::info!("Loaded {} sentences from '{}'", sentences.len(), input.display());

        let phonetic_source = ScriptClassPhonetics;
        let phonetic: Option<&dyn PhoneticFeatureSource> =
            cfg.phonetic.then_some(&phonetic_source as &dyn PhoneticFeatureSource);
        let analyzed = analyze_sentences(
            &inferencer,
            &sentences,
            &artifacts,
            inferencer.config().context_window,
            phonetic,
        )?;

        let path = report::write_predictions(&lang_paths.output, &analyzed)?;
        tracing::info!("Predictions written to '{}'", path.display());
        Ok(path)
    }
}
