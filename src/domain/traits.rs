// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The pipeline talks to its collaborators only through these
// traits, so the orchestration in Layer 2 can be exercised in
// tests with in-memory fakes instead of files and a GPU model.

use anyhow::Result;

use crate::domain::bundle::{ModelInputs, Predictions};
use crate::domain::corpus::Corpus;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Supplies annotated (word, root, six tags) records for one split.
///
/// Implementations:
///   - TsvCorpusLoader → tab-separated files in a directory
pub trait CorpusSource {
    /// Load every record of the split as aligned columns.
    /// Misaligned columns are an error, never a partial corpus.
    fn load_corpus(&self) -> Result<Corpus>;
}

// ─── SentenceSource ───────────────────────────────────────────────────────────
/// Supplies unannotated sentences for predict mode.
pub trait SentenceSource {
    fn load_sentences(&self) -> Result<Vec<Vec<String>>>;
}

// ─── PhoneticFeatureSource ────────────────────────────────────────────────────
/// Computes phonetic sub-feature vectors for words.
///
/// Returns one entry per word; each entry holds at least
/// FEATURE_COUNT sub-feature vectors. Only the first
/// FEATURE_COUNT are consumed.
pub trait PhoneticFeatureSource {
    fn features(&self, words: &[String]) -> Vec<Vec<Vec<f32>>>;
}

// ─── MorphPredictor ───────────────────────────────────────────────────────────
/// A trained model that maps an input bundle to argmax'd predictions.
///
/// Implementations:
///   - Inferencer → Burn model restored from a checkpoint
pub trait MorphPredictor {
    /// One forward pass using the decoder input exactly as given.
    fn predict(&self, inputs: &ModelInputs) -> Result<Predictions>;
}
