// ============================================================
// Layer 4 — Context-Window Shifter
// ============================================================
// For every anchor word, collect the indexed forms of the cw words
// to its left and the cw words to its right:
//
//   sentence:  w0  w1  w2        cw = 2
//
//   anchor   left[0] left[1]  right[0] right[1]
//   w0       ·       ·        w1       w2
//   w1       w0      ·        w2       ·
//   w2       w1      w0       ·        ·
//
// "·" is the sentinel [PAD]. Neighbors are never taken from a
// different sentence, in any mode.

use crate::data::vocabulary::{Vocabulary, PAD_INDEX};
use crate::domain::corpus::sentence_spans;

pub const DEFAULT_CONTEXT_WINDOW: usize = 4;

/// Indexed form of a missing neighbor.
pub fn sentinel() -> Vec<u32> {
    vec![PAD_INDEX]
}

/// Unpadded indexed neighbor columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextColumns {
    /// `left[k - 1][p]` is the word k positions before p.
    pub left:  Vec<Vec<Vec<u32>>>,
    /// `right[k - 1][p]` is the word k positions after p.
    pub right: Vec<Vec<Vec<u32>>>,
}

impl ContextColumns {
    fn empty(cw: usize) -> Self {
        Self { left: vec![Vec::new(); cw], right: vec![Vec::new(); cw] }
    }

    /// Number of anchor words covered.
    pub fn len(&self) -> usize {
        self.left.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn append(&mut self, other: ContextColumns) {
        for (col, extra) in self.left.iter_mut().zip(other.left) {
            col.extend(extra);
        }
        for (col, extra) in self.right.iter_mut().zip(other.right) {
            col.extend(extra);
        }
    }
}

/// Shift one sentence.
pub fn shift_sentence<S: AsRef<str>>(words: &[S], cw: usize, vocab: &Vocabulary) -> ContextColumns {
    let indexed = vocab.index_words(words);
    let n = indexed.len();

    let left = (1..=cw)
        .map(|k| {
            (0..n)
                .map(|p| if p >= k { indexed[p - k].clone() } else { sentinel() })
                .collect()
        })
        .collect();

    let right = (1..=cw)
        .map(|k| {
            (0..n)
                .map(|p| if p + k < n { indexed[p + k].clone() } else { sentinel() })
                .collect()
        })
        .collect();

    ContextColumns { left, right }
}

/// Shift a flattened corpus sentence by sentence and concatenate the
/// columns back in corpus order.
pub fn shift_corpus<S: AsRef<str>>(
    words:        &[S],
    sentence_ids: &[usize],
    cw:           usize,
    vocab:        &Vocabulary,
) -> ContextColumns {
    let mut columns = ContextColumns::empty(cw);
    for span in sentence_spans(sentence_ids) {
        columns.append(shift_sentence(&words[span], cw, vocab));
    }
    columns
}
