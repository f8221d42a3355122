// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs and traits that define the core concepts of
// the morphological analyzer:
//
//   corpus.rs  — parallel word/root/tag columns with sentence ids
//   bundle.rs  — framework-free model inputs, targets, predictions
//   traits.rs  — seams to the corpus, phonetic and model collaborators
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits

pub mod corpus;

pub mod bundle;

pub mod traits;
