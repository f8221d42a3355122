// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model code lives here. The rest of the crate sees a
// trained model only through domain::traits::MorphPredictor.
//
//   model.rs      — character encoder/decoder with six tag heads
//                   and the summed cross-entropy loss
//
//   trainer.rs    — Adam training loop, validation metrics,
//                   best-model checkpointing, early stopping
//
//   inferencer.rs — restores the best checkpoint and argmaxes
//                   root characters and tag classes
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

/// Backend used for gradient computation during training
pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Backend used for inference and validation
pub type InferBackend = burn::backend::Wgpu;

/// Character encoder/decoder architecture
pub mod model;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Inference engine — loads checkpoint and predicts roots and tags
pub mod inferencer;
