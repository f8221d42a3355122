// ============================================================
// Layer 3 — Corpus Domain Type
// ============================================================
// A corpus is a set of PARALLEL columns, one entry per word token:
//
//   words        ["लड़का", "घर",  "गया"]
//   roots        ["लड़का", "घर",  "जा"]
//   features[0]  ["n",     "n",   "v"]      ← POS
//   ...
//   features[5]  ["0",     "0",   "yA"]     ← TAM
//   sentence_ids [0,       0,     0]
//
// Every column has the same length and the same ordering.
// Any operation that drops a token drops it from every column,
// sentence_ids included.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Number of morphological tag positions predicted per word.
pub const FEATURE_COUNT: usize = 6;

/// Human-readable names of the tag positions, in column order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] =
    ["POS", "Gender", "Number", "Person", "Case", "TAM"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    pub words:        Vec<String>,
    pub roots:        Vec<String>,
    /// Exactly FEATURE_COUNT columns, each as long as `words`.
    pub features:     Vec<Vec<String>>,
    /// Sentence membership of each token; equal consecutive ids form one sentence.
    pub sentence_ids: Vec<usize>,
}

impl Corpus {
    /// Build a corpus from raw columns, rejecting any misalignment.
    pub fn from_columns(
        source_name:  &str,
        words:        Vec<String>,
        roots:        Vec<String>,
        features:     Vec<Vec<String>>,
        sentence_ids: Vec<usize>,
    ) -> PipelineResult<Self> {
        if features.len() != FEATURE_COUNT {
            return Err(PipelineError::Config(format!(
                "'{source_name}' has {} feature columns, expected {FEATURE_COUNT}",
                features.len()
            )));
        }

        let mismatch = |feature: usize, feature_len: usize| PipelineError::LengthMismatch {
            source_name: source_name.to_string(),
            words:       words.len(),
            roots:       roots.len(),
            feature,
            feature_len,
        };

        if roots.len() != words.len() || sentence_ids.len() != words.len() {
            return Err(mismatch(0, features[0].len()));
        }
        if let Some((idx, col)) = features
            .iter()
            .enumerate()
            .find(|(_, col)| col.len() != words.len())
        {
            return Err(mismatch(idx, col.len()));
        }

        Ok(Self { words, roots, features, sentence_ids })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Append `other` after `self`, renumbering its sentences so they
    /// never merge with the last sentence of `self`.
    pub fn concat(mut self, other: Corpus) -> Corpus {
        let offset = self.sentence_ids.iter().max().map_or(0, |m| m + 1);
        self.words.extend(other.words);
        self.roots.extend(other.roots);
        if self.features.is_empty() {
            self.features = vec![Vec::new(); FEATURE_COUNT];
        }
        for (col, extra) in self.features.iter_mut().zip(other.features) {
            col.extend(extra);
        }
        self.sentence_ids
            .extend(other.sentence_ids.into_iter().map(|id| id + offset));
        self
    }

    /// Keep only the tokens whose index satisfies `keep`, in every column.
    pub fn retain_indices(&self, keep: impl Fn(usize) -> bool) -> Corpus {
        let pick = |col: &[String]| -> Vec<String> {
            col.iter()
                .enumerate()
                .filter(|(i, _)| keep(*i))
                .map(|(_, v)| v.clone())
                .collect()
        };
        Corpus {
            words:        pick(&self.words),
            roots:        pick(&self.roots),
            features:     self.features.iter().map(|c| pick(c)).collect(),
            sentence_ids: self
                .sentence_ids
                .iter()
                .enumerate()
                .filter(|(i, _)| keep(*i))
                .map(|(_, id)| *id)
                .collect(),
        }
    }

    /// Token ranges of each sentence, in corpus order.
    pub fn sentence_spans(&self) -> Vec<Range<usize>> {
        sentence_spans(&self.sentence_ids)
    }
}

/// Split a sentence-id column into ranges of equal consecutive ids.
pub fn sentence_spans(sentence_ids: &[usize]) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0usize;
    for i in 1..=sentence_ids.len() {
        if i == sentence_ids.len() || sentence_ids[i] != sentence_ids[start] {
            spans.push(start..i);
            start = i;
        }
    }
    spans
}

/// Predict-mode output for one input sentence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedSentence {
    pub words:    Vec<String>,
    pub roots:    Vec<String>,
    /// FEATURE_COUNT columns, each as long as `words`.
    pub features: Vec<Vec<String>>,
}

impl AnalyzedSentence {
    /// Tag values of word `i`, in FEATURE_NAMES order.
    pub fn tags_of(&self, i: usize) -> Vec<&str> {
        self.features.iter().map(|col| col[i].as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn features(n: usize) -> Vec<Vec<String>> {
        vec![vec!["x".to_string(); n]; FEATURE_COUNT]
    }

    #[test]
    fn test_rejects_short_root_column() {
        let err = Corpus::from_columns(
            "t", col(&["a", "b"]), col(&["a"]), features(2), vec![0, 0],
        ).unwrap_err();
        assert!(matches!(err, PipelineError::LengthMismatch { words: 2, roots: 1, .. }));
    }

    #[test]
    fn test_rejects_short_feature_column() {
        let mut f = features(2);
        f[3].pop();
        let err = Corpus::from_columns(
            "t", col(&["a", "b"]), col(&["a", "b"]), f, vec![0, 0],
        ).unwrap_err();
        assert!(matches!(err, PipelineError::LengthMismatch { feature: 3, feature_len: 1, .. }));
    }

    #[test]
    fn test_concat_keeps_sentences_apart() {
        let a = Corpus::from_columns("a", col(&["x"]), col(&["x"]), features(1), vec![0]).unwrap();
        let b = Corpus::from_columns("b", col(&["y"]), col(&["y"]), features(1), vec![0]).unwrap();
        let c = a.concat(b);
        assert_eq!(c.sentence_ids, vec![0, 1]);
        assert_eq!(c.sentence_spans(), vec![0..1, 1..2]);
    }

    #[test]
    fn test_retain_indices_drops_from_every_column() {
        let c = Corpus::from_columns(
            "t", col(&["a", "b", "c"]), col(&["A", "B", "C"]), features(3), vec![0, 0, 1],
        ).unwrap();
        let kept = c.retain_indices(|i| i != 1);
        assert_eq!(kept.words, col(&["a", "c"]));
        assert_eq!(kept.roots, col(&["A", "C"]));
        assert_eq!(kept.sentence_ids, vec![0, 1]);
        assert!(kept.features.iter().all(|f| f.len() == 2));
    }
}
