// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Restores the best checkpoint and runs forward passes over a
// ModelInputs bundle in fixed-size chunks. The result is argmax'd
// per root position and per tag head; turning indices back into
// characters and tag strings happens in Layer 2.

use anyhow::{anyhow, Result};
use burn::prelude::*;

use crate::data::{batcher::MorphBatcher, dataset::samples_from_bundle};
use crate::domain::{
    bundle::{ModelInputs, Predictions},
    traits::MorphPredictor,
};
use crate::error::PipelineError;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{MorphModel, MorphModelConfig};
use crate::ml::InferBackend;

pub struct Inferencer<B: Backend> {
    model:      MorphModel<B>,
    config:     MorphModelConfig,
    batcher:    MorphBatcher<B>,
    batch_size: usize,
}

impl Inferencer<InferBackend> {
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, batch_size: usize) -> Result<Self> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        let config = ckpt_manager.load_config()?;
        let model = ckpt_manager.load_model(config.init::<InferBackend>(&device), &device)?;
        tracing::info!("Model loaded from checkpoint ({} trained positions)", config.max_positions);
        Ok(Self::new(model, config, device, batch_size))
    }
}

impl<B: Backend> Inferencer<B> {
    pub fn new(model: MorphModel<B>, config: MorphModelConfig, device: B::Device, batch_size: usize) -> Self {
        Self { model, config, batcher: MorphBatcher::new(device), batch_size: batch_size.max(1) }
    }

    pub fn config(&self) -> &MorphModelConfig {
        &self.config
    }

    /// Rejects bundles the restored architecture cannot consume.
    fn check_compatible(&self, inputs: &ModelInputs) -> Result<()> {
        if inputs.context_window() != self.config.context_window {
            return Err(PipelineError::Config(format!(
                "model was trained with context window {}, inputs use {}",
                self.config.context_window,
                inputs.context_window()
            ))
            .into());
        }
        if inputs.phonetic_widths() != self.config.phonetic_dims {
            return Err(PipelineError::Config(format!(
                "phonetic input widths {:?} do not match the trained model's {:?}",
                inputs.phonetic_widths(),
                self.config.phonetic_dims
            ))
            .into());
        }
        Ok(())
    }
}

fn to_indices<B: Backend, const D: usize>(t: Tensor<B, D, Int>) -> Result<Vec<i64>> {
    t.into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .map_err(|e| anyhow!("Cannot read prediction tensor: {e:?}"))
}

impl<B: Backend> MorphPredictor for Inferencer<B> {
    fn predict(&self, inputs: &ModelInputs) -> Result<Predictions> {
        self.check_compatible(inputs)?;

        let heads = self.config.feature_classes.len();
        let mut roots: Vec<Vec<u32>> = Vec::with_capacity(inputs.len());
        let mut features: Vec<Vec<usize>> = vec![Vec::with_capacity(inputs.len()); heads];

        let samples = samples_from_bundle(inputs, None);
        for chunk in samples.chunks(self.batch_size) {
            let batch = self.batcher.batch(chunk);
            let output = self.model.forward(batch.words, batch.decoder_input, batch.phonetic);

            let [_, width, _] = output.root_logits.dims();
            let root_idx = to_indices(output.root_logits.argmax(2))?;
            roots.extend(
                root_idx
                    .chunks(width.max(1))
                    .map(|row| row.iter().map(|&c| c as u32).collect::<Vec<u32>>()),
            );

            for (column, logits) in features.iter_mut().zip(output.feature_logits) {
                column.extend(to_indices(logits.argmax(1))?.into_iter().map(|c| c as usize));
            }
        }

        tracing::debug!("Predicted {} samples", roots.len());
        Ok(Predictions { roots, features })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bundle::{BaseInputs, IndexMatrix};
    use burn::backend::NdArray;

    fn inputs(width: usize, rows: usize) -> ModelInputs {
        let m = IndexMatrix::zeros(rows, width);
        ModelInputs::Base(BaseInputs {
            anchor:        m.clone(),
            left:          vec![m.clone()],
            right:         vec![m.clone()],
            decoder_input: m,
        })
    }

    fn inferencer() -> Inferencer<NdArray> {
        let config = MorphModelConfig::new(9, 5, 4, 8, 2, 1, vec![3, 2, 2, 2, 2, 4], Vec::new(), 0.0);
        let device = Default::default();
        let model = config.init::<NdArray>(&device);
        Inferencer::new(model, config, device, 2)
    }

    #[test]
    fn test_predict_shapes_across_chunks() {
        let p = inferencer().predict(&inputs(4, 3)).unwrap();
        assert_eq!(p.roots.len(), 3);
        assert!(p.roots.iter().all(|r| r.len() == 4 && r.iter().all(|&c| c < 9)));
        assert_eq!(p.features.len(), 6);
        assert!(p.features.iter().all(|col| col.len() == 3));
        assert!(p.features[0].iter().all(|&c| c < 3));
    }

    #[test]
    fn test_inputs_wider_than_trained_positions() {
        let p = inferencer().predict(&inputs(7, 1)).unwrap();
        assert_eq!(p.roots[0].len(), 7);
    }

    #[test]
    fn test_context_window_mismatch_is_rejected() {
        let m = IndexMatrix::zeros(1, 3);
        let two_words = ModelInputs::Base(BaseInputs {
            anchor:        m.clone(),
            left:          vec![m.clone(), m.clone()],
            right:         vec![m.clone(), m.clone()],
            decoder_input: m,
        });
        let err = inferencer().predict(&two_words).unwrap_err();
        assert!(matches!(err.downcast_ref::<PipelineError>(), Some(PipelineError::Config(_))));
    }
}
