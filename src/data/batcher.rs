// ============================================================
// Layer 4 — Morph Batcher
// ============================================================
// Stacks MorphSamples into Burn tensors:
//
//   words[k]         [batch, width]   Int   (anchor, left×cw, right×cw)
//   decoder_input    [batch, width]   Int
//   phonetic[i]      [batch, dim_i]   Float (only with phonetic input)
//   root_targets     [batch, width]   Int   (only with ground truth)
//   feature_targets  6 × [batch]      Int   (only with ground truth)
//
// All sequences are pre-padded to the same width, so stacking is a
// flatten + reshape.

use burn::prelude::*;

use crate::data::dataset::MorphSample;

#[derive(Debug, Clone)]
pub struct MorphBatch<B: Backend> {
    pub words:           Vec<Tensor<B, 2, Int>>,
    pub decoder_input:   Tensor<B, 2, Int>,
    pub phonetic:        Vec<Tensor<B, 2>>,
    pub root_targets:    Option<Tensor<B, 2, Int>>,
    pub feature_targets: Vec<Tensor<B, 1, Int>>,
}

#[derive(Clone, Debug)]
pub struct MorphBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> MorphBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    fn int_matrix<'a>(&self, rows: impl Iterator<Item = &'a [u32]>, batch: usize) -> Tensor<B, 2, Int> {
        let flat: Vec<i32> = rows.flat_map(|r| r.iter().map(|&x| x as i32)).collect();
        let width = if batch == 0 { 0 } else { flat.len() / batch };
        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device).reshape([batch, width])
    }

    fn float_matrix<'a>(&self, rows: impl Iterator<Item = &'a [f32]>, batch: usize) -> Tensor<B, 2> {
        let flat: Vec<f32> = rows.flat_map(|r| r.iter().copied()).collect();
        let width = if batch == 0 { 0 } else { flat.len() / batch };
        Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device).reshape([batch, width])
    }

    /// Convert a slice of samples into one batch.
    /// Targets are included only when every sample carries them.
    pub fn batch(&self, items: &[MorphSample]) -> MorphBatch<B> {
        let batch = items.len();
        let word_columns = items.first().map_or(0, |s| s.words.len());
        let phonetic_columns = items.first().map_or(0, |s| s.phonetic.len());

        let words = (0..word_columns)
            .map(|k| self.int_matrix(items.iter().map(|s| s.words[k].as_slice()), batch))
            .collect();
        let decoder_input = self.int_matrix(items.iter().map(|s| s.decoder_input.as_slice()), batch);
        let phonetic = (0..phonetic_columns)
            .map(|i| self.float_matrix(items.iter().map(|s| s.phonetic[i].as_slice()), batch))
            .collect();

        let labelled = batch > 0 && items.iter().all(MorphSample::has_targets);
        let root_targets = labelled
            .then(|| self.int_matrix(items.iter().map(|s| s.root_target.as_slice()), batch));
        let feature_targets = if labelled {
            (0..items[0].feature_targets.len())
                .map(|i| {
                    let col: Vec<i32> = items.iter().map(|s| s.feature_targets[i] as i32).collect();
                    Tensor::<B, 1, Int>::from_ints(col.as_slice(), &self.device)
                })
                .collect()
        } else {
            Vec::new()
        };

        MorphBatch { words, decoder_input, phonetic, root_targets, feature_targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    fn sample(v: u32) -> MorphSample {
        MorphSample {
            words:           vec![vec![v, 0, 0]; 3],
            decoder_input:   vec![1, v, 0],
            phonetic:        vec![vec![0.5, 0.25]],
            root_target:     vec![v, 0, 0],
            feature_targets: vec![1; 6],
        }
    }

    #[test]
    fn test_batch_shapes() {
        let batcher = MorphBatcher::<NdArray>::new(Default::default());
        let batch = batcher.batch(&[sample(2), sample(3)]);
        assert_eq!(batch.words.len(), 3);
        assert_eq!(batch.words[0].dims(), [2, 3]);
        assert_eq!(batch.decoder_input.dims(), [2, 3]);
        assert_eq!(batch.phonetic[0].dims(), [2, 2]);
        assert_eq!(batch.root_targets.unwrap().dims(), [2, 3]);
        assert_eq!(batch.feature_targets.len(), 6);
        assert_eq!(batch.feature_targets[0].dims(), [2]);
    }

    #[test]
    fn test_unlabelled_batch_has_no_targets() {
        let batcher = MorphBatcher::<NdArray>::new(Default::default());
        let mut s = sample(2);
        s.root_target.clear();
        s.feature_targets.clear();
        let batch = batcher.batch(&[s]);
        assert!(batch.root_targets.is_none());
        assert!(batch.feature_targets.is_empty());
    }
}
