// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one mode of the analyzer (train, test or predict).
//
// Rules for this layer:
//   - No model code here (that's Layer 5)
//   - No printing here (that's Layer 1)
//   - File access only through Layer 4 loaders and Layer 6 stores
//
// pipeline.rs holds the tensorisation and decoding steps the
// three use cases share; it only sees the model through the
// MorphPredictor trait, so it is tested with in-memory fakes.

/// Paths file, language and mode validation
pub mod config;

/// Shared tensorisation, decoding and mode workflows
pub mod pipeline;

/// The training workflow
pub mod train_use_case;

/// The evaluation workflow
pub mod test_use_case;

/// The prediction workflow
pub mod predict_use_case;
