// ============================================================
// Layer 4 — Feature Label Codec
// ============================================================
// Six independent label spaces, one per tag position
// (POS, Gender, Number, Person, Case, TAM).
//
// Fitting (train mode only):
//   raw column  ["v", "n", "v", "adj"]
//   classes     ["adj", "n", "v"]          sorted, deduplicated
//   encoded     [2, 1, 2, 0]
//   one-hot     [[0,0,1], [0,1,0], [0,0,1], [1,0,0]]
//
// After training the spaces are closed: a value that was never
// fitted cannot be encoded. Test mode removes such samples with
// the erroneous-sample filter before it reaches this codec.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::bundle::OneHot;
use crate::error::{PipelineError, PipelineResult};

// ─── LabelSpace ───────────────────────────────────────────────────────────────
/// Category ↔ integer mapping for one tag position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSpace {
    /// Sorted; a class's index is its position.
    classes: Vec<String>,
}

impl LabelSpace {
    pub fn fit<S: AsRef<str>>(values: &[S]) -> Self {
        let classes: BTreeSet<&str> = values.iter().map(|v| v.as_ref()).collect();
        Self { classes: classes.into_iter().map(str::to_string).collect() }
    }

    pub fn class_count(&self) -> usize { self.classes.len() }

    pub fn classes(&self) -> &[String] { &self.classes }

    pub fn contains(&self, value: &str) -> bool {
        self.classes.binary_search_by(|c| c.as_str().cmp(value)).is_ok()
    }

    /// `feature` only labels the error.
    pub fn encode(&self, feature: usize, value: &str) -> PipelineResult<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(value))
            .map_err(|_| PipelineError::UnknownLabel { feature, value: value.to_string() })
    }

    pub fn decode(&self, feature: usize, index: usize) -> PipelineResult<&str> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or(PipelineError::ClassOutOfRange {
                feature,
                index,
                class_count: self.classes.len(),
            })
    }
}

// ─── FeatureCodec ─────────────────────────────────────────────────────────────
/// The six fitted label spaces of one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCodec {
    spaces: Vec<LabelSpace>,
}

/// Everything produced by fitting the codec on training columns.
#[derive(Debug, Clone)]
pub struct FittedFeatures {
    pub codec:        FeatureCodec,
    pub encoded:      Vec<Vec<usize>>,
    pub one_hot:      Vec<OneHot>,
    pub class_counts: Vec<usize>,
}

impl FeatureCodec {
    /// Fit one label space per column, then encode the same columns.
    pub fn fit_encode(columns: &[Vec<String>]) -> PipelineResult<FittedFeatures> {
        let codec = Self { spaces: columns.iter().map(|c| LabelSpace::fit(c.as_slice())).collect() };
        let encoded = codec.encode_columns(columns)?;
        let class_counts = codec.class_counts();
        let one_hot = codec.one_hot(&encoded);

        for (i, n) in class_counts.iter().enumerate() {
            tracing::debug!("Feature {} fitted with {} classes", i, n);
        }

        Ok(FittedFeatures { codec, encoded, one_hot, class_counts })
    }

    pub fn spaces(&self) -> &[LabelSpace] { &self.spaces }

    pub fn class_counts(&self) -> Vec<usize> {
        self.spaces.iter().map(LabelSpace::class_count).collect()
    }

    /// Encode with the already fitted spaces. Any unseen value is an error.
    pub fn encode_columns(&self, columns: &[Vec<String>]) -> PipelineResult<Vec<Vec<usize>>> {
        self.spaces
            .iter()
            .zip(columns)
            .enumerate()
            .map(|(feature, (space, col))| {
                col.iter()
                    .map(|v| space.encode(feature, v))
                    .collect::<PipelineResult<Vec<usize>>>()
            })
            .collect()
    }

    /// Expand encoded columns to one-hot tensors of width class_count.
    pub fn one_hot(&self, encoded: &[Vec<usize>]) -> Vec<OneHot> {
        self.spaces
            .iter()
            .zip(encoded)
            .map(|(space, col)| OneHot::from_classes(col, space.class_count()))
            .collect()
    }

    /// Predicted class indices back to tag strings.
    pub fn decode(&self, feature: usize, indices: &[usize]) -> PipelineResult<Vec<String>> {
        let space = self.spaces.get(feature).ok_or_else(|| {
            PipelineError::Config(format!("no label space for feature {feature}"))
        })?;
        indices
            .iter()
            .map(|&i| space.decode(feature, i).map(str::to_string))
            .collect()
    }
}

/// Distinct values of each column in first-seen order.
/// These are the "original" label sets the erroneous-sample filter uses.
pub fn original_label_sets(columns: &[Vec<String>]) -> Vec<Vec<String>> {
    columns
        .iter()
        .map(|col| {
            let mut seen = HashSet::new();
            col.iter().filter(|v| seen.insert(v.as_str())).cloned().collect()
        })
        .collect()
}

/// Distinct encoded values of each column in first-seen order.
pub fn transformed_label_sets(encoded: &[Vec<usize>]) -> Vec<Vec<usize>> {
    encoded
        .iter()
        .map(|col| {
            let mut seen = HashSet::new();
            col.iter().filter(|v| seen.insert(**v)).copied().collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fit_is_sorted_and_deterministic() {
        let space = LabelSpace::fit(&col(&["v", "n", "v", "adj"]));
        assert_eq!(space.classes(), &["adj", "n", "v"]);
        assert_eq!(space.encode(0, "v").unwrap(), 2);
        assert_eq!(space.decode(0, 1).unwrap(), "n");
    }

    #[test]
    fn test_encode_rejects_unseen_value() {
        let space = LabelSpace::fit(&col(&["N", "V"]));
        assert!(matches!(
            space.encode(0, "X"),
            Err(PipelineError::UnknownLabel { feature: 0, .. })
        ));
    }

    #[test]
    fn test_fit_encode_shapes() {
        let columns: Vec<Vec<String>> = (0..6).map(|i| {
            if i == 0 { col(&["n", "v", "n"]) } else { col(&["x", "x", "x"]) }
        }).collect();
        let fitted = FeatureCodec::fit_encode(&columns).unwrap();
        assert_eq!(fitted.class_counts, vec![2, 1, 1, 1, 1, 1]);
        assert_eq!(fitted.encoded[0], vec![0, 1, 0]);
        assert_eq!(fitted.one_hot[0].shape(), &[3, 2]);
        assert_eq!(fitted.one_hot[0].argmax(), vec![0, 1, 0]);
        for (encoded, n) in fitted.encoded.iter().zip(&fitted.class_counts) {
            assert!(encoded.iter().all(|c| c < n));
        }
    }

    #[test]
    fn test_decode_round_trip_and_out_of_range() {
        let columns = vec![col(&["b", "a"]); 6];
        let fitted = FeatureCodec::fit_encode(&columns).unwrap();
        assert_eq!(fitted.codec.decode(3, &fitted.encoded[3]).unwrap(), col(&["b", "a"]));
        assert!(fitted.codec.decode(3, &[7]).is_err());
    }

    #[test]
    fn test_label_sets_keep_first_seen_order() {
        let sets = original_label_sets(&[col(&["v", "n", "v"])]);
        assert_eq!(sets, vec![col(&["v", "n"])]);
        assert_eq!(transformed_label_sets(&[vec![1, 0, 1]]), vec![vec![1, 0]]);
    }
}
