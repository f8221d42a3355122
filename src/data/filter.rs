// ============================================================
// Layer 4 — Erroneous-Sample Filter
// ============================================================
// Test corpora can contain tag values the training run never saw.
// Those samples cannot be encoded by the closed label spaces, so
// they are removed before tensorisation from EVERY column at
// once, which keeps words, roots, tags and sentence ids aligned.

use std::collections::{BTreeSet, HashSet};

use crate::domain::corpus::Corpus;

/// Indices of samples whose value in any feature column is missing
/// from that column's training label set.
pub fn erroneous_indices(features: &[Vec<String>], label_sets: &[Vec<String>]) -> BTreeSet<usize> {
    let mut erroneous = BTreeSet::new();
    for (column, labels) in features.iter().zip(label_sets) {
        let known: HashSet<&str> = labels.iter().map(String::as_str).collect();
        erroneous.extend(
            column
                .iter()
                .enumerate()
                .filter(|(_, v)| !known.contains(v.as_str()))
                .map(|(i, _)| i),
        );
    }
    erroneous
}

/// Drop every erroneous sample from all parallel columns.
/// Returns the filtered corpus and the removed indices.
pub fn remove_erroneous(corpus: &Corpus, label_sets: &[Vec<String>]) -> (Corpus, Vec<usize>) {
    let erroneous = erroneous_indices(&corpus.features, label_sets);
    if erroneous.is_empty() {
        return (corpus.clone(), Vec::new());
    }

    tracing::warn!(
        "Removing {} of {} samples with tag values unseen in training",
        erroneous.len(),
        corpus.len()
    );
    let filtered = corpus.retain_indices(|i| !erroneous.contains(&i));
    (filtered, erroneous.into_iter().collect())
}
