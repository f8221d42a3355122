use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::bundle::{InputTensor, ModelInputs, ModelTargets};

/// One row of the model bundle, already padded.
/// `words` holds anchor, left×cw, right×cw in that order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MorphSample {
    pub words:           Vec<Vec<u32>>,
    pub decoder_input:   Vec<u32>,
    pub phonetic:        Vec<Vec<f32>>,
    /// Empty when the sample carries no ground truth.
    pub root_target:     Vec<u32>,
    pub feature_targets: Vec<usize>,
}

impl MorphSample {
    pub fn has_targets(&self) -> bool {
        !self.root_target.is_empty()
    }
}

/// Cut the column-oriented bundle into per-sample rows.
pub fn samples_from_bundle(inputs: &ModelInputs, targets: Option<&ModelTargets>) -> Vec<MorphSample> {
    let n = inputs.len();

    let root_targets: Vec<Vec<u32>> = match targets {
        Some(t) => t
            .root
            .argmax()
            .chunks(inputs.width().max(1))
            .map(|row| row.iter().map(|&c| c as u32).collect())
            .collect(),
        None => vec![Vec::new(); n],
    };
    let feature_targets: Vec<Vec<usize>> = match targets {
        Some(t) => t.features.iter().map(|f| f.argmax()).collect(),
        None => Vec::new(),
    };

    let word_columns = 1 + 2 * inputs.context_window();
    let tensors = inputs.tensor_list();

    (0..n)
        .map(|i| {
            let mut sample = MorphSample {
                words:           Vec::with_capacity(word_columns),
                decoder_input:   Vec::new(),
                phonetic:        Vec::new(),
                root_target:     root_targets.get(i).cloned().unwrap_or_default(),
                feature_targets: feature_targets.iter().map(|col| col[i]).collect(),
            };
            for (pos, tensor) in tensors.iter().enumerate() {
                match tensor {
                    InputTensor::Indices(m) if pos < word_columns => sample.words.push(m.row(i).to_vec()),
                    InputTensor::Indices(m) => sample.decoder_input = m.row(i).to_vec(),
                    InputTensor::Dense(col) => sample.phonetic.push(col[i].clone()),
                }
            }
            sample
        })
        .collect()
}

pub struct MorphDataset {
    samples: Vec<MorphSample>,
}

impl MorphDataset {
    pub fn new(samples: Vec<MorphSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<MorphSample> for MorphDataset {
    fn get(&self, index: usize) -> Option<MorphSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bundle::{BaseInputs, IndexMatrix, OneHot};

    #[test]
    fn test_rows_follow_tensor_order() {
        let m = |v: u32| IndexMatrix::from_rows(2, vec![vec![v, 0], vec![v + 10, 0]]).unwrap();
        let base = BaseInputs {
            anchor:        m(1),
            left:          vec![m(2)],
            right:         vec![m(3)],
            decoder_input: m(4),
        };
        let inputs = ModelInputs::Base(base);
        let targets = ModelTargets {
            root:     OneHot::from_sequences(&m(5), 20),
            features: vec![OneHot::from_classes(&[0, 1], 2); 6],
        };

        let samples = samples_from_bundle(&inputs, Some(&targets));
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].words, vec![vec![11, 0], vec![12, 0], vec![13, 0]]);
        assert_eq!(samples[1].decoder_input, vec![14, 0]);
        assert_eq!(samples[1].root_target, vec![15, 0]);
        assert_eq!(samples[1].feature_targets, vec![1; 6]);
        assert!(samples[0].phonetic.is_empty());

        let unlabeled = samples_from_bundle(&inputs, None);
        assert!(!unlabeled[0].has_targets());
        assert!(unlabeled[0].feature_targets.is_empty());
    }
}
