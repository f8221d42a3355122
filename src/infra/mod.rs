// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem outside corpus loading:
//
//   artifact_store.rs — vocabulary, label spaces and label sets
//                       as language-keyed JSON blobs, written
//                       atomically so a concurrent reader never
//                       sees half a file.
//
//   checkpoint.rs     — best-model weights via Burn's
//                       CompactRecorder plus the model config
//                       needed to rebuild the architecture.
//
//   metrics.rs        — per-epoch CSV log and the test-mode
//                       accuracy summary.
//
//   report.rs         — the text files test and predict runs
//                       leave behind for inspection.

/// Language-keyed JSON artifacts
pub mod artifact_store;

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger and evaluation summary
pub mod metrics;

/// feature_<i>.txt, roots.txt, predictions.txt, accuracy.txt
pub mod report;
