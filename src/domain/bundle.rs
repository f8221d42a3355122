// ============================================================
// Layer 3 — Model Tensor Bundle
// ============================================================
// Framework-free containers for everything that crosses the
// boundary between the data pipeline and the model:
//
//   IndexMatrix    fixed-width rows of character indices
//   OneHot         dense one-hot targets (2-D or 3-D)
//   ModelInputs    named input columns (+ optional phonetic columns)
//   ModelTargets   named output columns
//   Predictions    argmax'd model outputs
//
// The positional tensor order the model expects only exists in
// ModelInputs::tensor_list; every other layer works by field name.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

// ─── IndexMatrix ──────────────────────────────────────────────────────────────
/// Rows of character indices that all share the same width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMatrix {
    width: usize,
    rows:  Vec<Vec<u32>>,
}

impl IndexMatrix {
    /// Wrap already padded rows. Every row must be exactly `width` long.
    pub fn from_rows(width: usize, rows: Vec<Vec<u32>>) -> PipelineResult<Self> {
        if let Some(row) = rows.iter().find(|r| r.len() != width) {
            return Err(PipelineError::SequenceTooLong { len: row.len(), width });
        }
        Ok(Self { width, rows })
    }

    pub fn zeros(rows: usize, width: usize) -> Self {
        Self { width, rows: vec![vec![0; width]; rows] }
    }

    pub fn width(&self) -> usize { self.width }

    pub fn len(&self) -> usize { self.rows.len() }

    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    pub fn rows(&self) -> &[Vec<u32>] { &self.rows }

    pub fn row(&self, idx: usize) -> &[u32] { &self.rows[idx] }

    pub fn set(&mut self, row: usize, col: usize, value: u32) {
        self.rows[row][col] = value;
    }
}

// ─── OneHot ───────────────────────────────────────────────────────────────────
/// Row-major one-hot tensor. The last axis holds the classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHot {
    shape: Vec<usize>,
    data:  Vec<f32>,
}

impl OneHot {
    /// [n, classes] from one class index per sample.
    pub fn from_classes(indices: &[usize], classes: usize) -> Self {
        let mut data = vec![0.0f32; indices.len() * classes];
        for (row, &c) in indices.iter().enumerate() {
            data[row * classes + c] = 1.0;
        }
        Self { shape: vec![indices.len(), classes], data }
    }

    /// [rows, width, classes] from a matrix of class indices.
    pub fn from_sequences(matrix: &IndexMatrix, classes: usize) -> Self {
        let (n, w) = (matrix.len(), matrix.width());
        let mut data = vec![0.0f32; n * w * classes];
        for (r, row) in matrix.rows().iter().enumerate() {
            for (t, &c) in row.iter().enumerate() {
                data[(r * w + t) * classes + c as usize] = 1.0;
            }
        }
        Self { shape: vec![n, w, classes], data }
    }

    pub fn shape(&self) -> &[usize] { &self.shape }

    /// Size of the leading (sample) axis.
    pub fn len(&self) -> usize { self.shape.first().copied().unwrap_or(0) }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn classes(&self) -> usize { self.shape.last().copied().unwrap_or(0) }

    /// Argmax over the class axis, flattened over all leading axes.
    pub fn argmax(&self) -> Vec<usize> {
        let classes = self.classes().max(1);
        self.data
            .chunks(classes)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold((0usize, f32::NEG_INFINITY), |best, (i, &v)| {
                        if v > best.1 { (i, v) } else { best }
                    })
                    .0
            })
            .collect()
    }

}

// ─── ModelInputs ──────────────────────────────────────────────────────────────
/// Character-index inputs shared by every run.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseInputs {
    pub anchor:        IndexMatrix,
    /// Column k-1 holds the word k positions to the left.
    pub left:          Vec<IndexMatrix>,
    /// Column k-1 holds the word k positions to the right.
    pub right:         Vec<IndexMatrix>,
    pub decoder_input: IndexMatrix,
}

/// One dense column per tag position, each row a word's sub-feature vector.
#[derive(Debug, Clone, PartialEq)]
pub struct PhoneticInputs {
    pub columns: Vec<Vec<Vec<f32>>>,
    pub widths:  Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelInputs {
    Base(BaseInputs),
    WithPhonetic {
        base:     BaseInputs,
        phonetic: PhoneticInputs,
    },
}

/// One entry of the positional tensor list handed to the model.
#[derive(Debug, Clone, Copy)]
pub enum InputTensor<'a> {
    Indices(&'a IndexMatrix),
    Dense(&'a [Vec<f32>]),
}

impl ModelInputs {
    pub fn base(&self) -> &BaseInputs {
        match self {
            ModelInputs::Base(base) | ModelInputs::WithPhonetic { base, .. } => base,
        }
    }

    pub fn base_mut(&mut self) -> &mut BaseInputs {
        match self {
            ModelInputs::Base(base) | ModelInputs::WithPhonetic { base, .. } => base,
        }
    }

    pub fn phonetic(&self) -> Option<&PhoneticInputs> {
        match self {
            ModelInputs::Base(_) => None,
            ModelInputs::WithPhonetic { phonetic, .. } => Some(phonetic),
        }
    }

    /// Widths of the phonetic columns, empty without phonetic input.
    pub fn phonetic_widths(&self) -> Vec<usize> {
        self.phonetic().map(|p| p.widths.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize { self.base().anchor.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn width(&self) -> usize { self.base().anchor.width() }

    pub fn context_window(&self) -> usize { self.base().left.len() }

    /// The model's input order:
    /// anchor, left×cw, right×cw, decoder input, [phonetic×6].
    pub fn tensor_list(&self) -> Vec<InputTensor<'_>> {
        let base = self.base();
        let mut list = vec![InputTensor::Indices(&base.anchor)];
        list.extend(base.left.iter().map(InputTensor::Indices));
        list.extend(base.right.iter().map(InputTensor::Indices));
        list.push(InputTensor::Indices(&base.decoder_input));
        if let Some(phonetic) = self.phonetic() {
            list.extend(phonetic.columns.iter().map(|c| InputTensor::Dense(c.as_slice())));
        }
        list
    }
}

// ─── ModelTargets ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct ModelTargets {
    /// [n, width, vocab_width]
    pub root:     OneHot,
    /// FEATURE_COUNT tensors of shape [n, class_count_i]
    pub features: Vec<OneHot>,
}

// ─── Predictions ──────────────────────────────────────────────────────────────
/// Model outputs after argmax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predictions {
    /// Predicted character index per row and position.
    pub roots:    Vec<Vec<u32>>,
    /// FEATURE_COUNT columns of predicted class indices.
    pub features: Vec<Vec<usize>>,
}
