// ============================================================
// Layer 2 — TestUseCase
// ============================================================
// Evaluates a trained model on an annotated test corpus:
//
//   Step 1: Resolve paths, load artifacts + best checkpoint
//   Step 2: Load the test corpus
//   Step 3: Filter, tensorise, predict, decode  (pipeline)
//   Step 4: Write feature_<i>.txt, roots.txt, accuracy.txt

use anyhow::{Context, Result};

use crate::application::{
    config::{Mode, RunConfig},
    pipeline::{evaluate_corpus, PipelineArtifacts},
};
use crate::data::{loader::TsvCorpusLoader, phonetic::ScriptClassPhonetics};
use crate::domain::traits::{CorpusSource, PhoneticFeatureSource};
use crate::infra::{
    artifact_store::ArtifactStore,
    checkpoint::CheckpointManager,
    metrics::EvaluationSummary,
    report,
};
use crate::ml::inferencer::Inferencer;

pub struct TestUseCase {
    config: RunConfig,
}

impl TestUseCase {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<EvaluationSummary> {
        let cfg = &self.config;

        // ── Step 1: Paths, artifacts, model ───────────────────────────────────
        let (paths, lang_paths) = cfg.resolve(Mode::Test)?;
        let artifacts = PipelineArtifacts::load(&ArtifactStore::new(&paths.artifact_dir, &cfg.lang))?;
        let ckpt_manager = CheckpointManager::new(&paths.checkpoint_dir, &cfg.lang, cfg.phonetic)?;
        let inferencer = Inferencer::from_checkpoint(&ckpt_manager, cfg.batch_size)?;

        // ── Step 2: Test corpus ───────────────────────────────────────────────
        let test_path = lang_paths.test.as_ref().context("test path missing")?;
        let corpus = TsvCorpusLoader::new(test_path).required().load_corpus()?;
        tracing::info!("Loaded {} test tokens from '{}'", corpus.len(), test_path.display());

        // ── Step 3: Evaluate ──────────────────────────────────────────────────
        let phonetic_source = ScriptClassPhonetics;
        let phonetic: Option<&dyn PhoneticFeatureSource> =
            cfg.phonetic.then_some(&phonetic_source as &dyn PhoneticFeatureSource);
        let eval = evaluate_corpus(
            &inferencer,
            &corpus,
            &artifacts,
            inferencer.config().context_window,
            phonetic,
        )?;

        // ── Step 4: Reports ───────────────────────────────────────────────────
        let out = &lang_paths.output;
        report::write_feature_files(out, &eval.words, &eval.orig_tags, &eval.pred_tags)?;
        report::write_root_file(out, &eval.words, &eval.orig_roots, &eval.pred_roots)?;

        let summary = EvaluationSummary::compute(
            &eval.orig_roots,
            &eval.pred_roots,
            &eval.orig_tags,
            &eval.pred_tags,
        );
        summary.log();
        report::write_accuracy(out, &summary)?;
        tracing::info!("Test reports written to '{}'", out.display());

        Ok(summary)
    }
}
