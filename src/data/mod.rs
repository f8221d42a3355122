// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from raw corpus columns to model-ready tensors,
// and back from predicted indices to strings.
//
//   TsvCorpusLoader       → words, roots, six tag columns
//       │
//       ▼
//   remove_erroneous      → (test only) drop unseen tag values
//       │
//       ▼
//   Vocabulary            → characters to indices (words reversed)
//   shift_corpus          → left/right neighbor columns
//       │
//       ▼
//   pad_sequences         → fixed-width index matrices
//   build_decoder_input   → [START] + shifted target
//   FeatureCodec          → tag strings to classes / one-hot
//   merge_phonetic        → (optional) phonetic columns
//       │
//       ▼
//   MorphDataset / MorphBatcher → Burn tensors
//
// Each module is responsible for exactly one step.

/// Reads annotated corpora and predict input
pub mod loader;

/// Character vocabulary: build, index, decode
pub mod vocabulary;

/// Context-window neighbor columns
pub mod context;

/// Right-padding and teacher-forcing decoder inputs
pub mod padding;

/// Per-feature label spaces and one-hot encoding
pub mod labels;

/// Removes samples with tag values unseen in training
pub mod filter;

/// Phonetic sub-feature columns
pub mod phonetic;

/// Burn Dataset over padded samples
pub mod dataset;

/// Stacks samples into tensor batches
pub mod batcher;

/// Cuts the train-mode pool back into train/validation
pub mod splitter;
