// ============================================================
// Layer 4 — Sequence Padding and Teacher-Forcing Inputs
// ============================================================
// Every character column (anchor, context neighbors, root and
// decoder input) is right-padded with [PAD] to the same width so
// the columns can be batched together:
//
//   width = max(len of any anchor word, len of any root)
//
// Context columns never widen the matrix; their words come from
// the same anchor column, and the sentinel is a single [PAD].
//
// The decoder input is the target shifted right by one position
// with [START] in front:
//
//   target         [ r0  r1  r2  0 ]
//   decoder input  [ 1   r0  r1  r2 ]

use crate::data::vocabulary::{PAD_INDEX, START_INDEX};
use crate::domain::bundle::IndexMatrix;
use crate::error::{PipelineError, PipelineResult};

/// Padding width for a run: longest anchor word or root.
pub fn max_word_len(anchors: &[Vec<u32>], roots: Option<&[Vec<u32>]>) -> usize {
    let longest = |col: &[Vec<u32>]| col.iter().map(Vec::len).max().unwrap_or(0);
    longest(anchors).max(roots.map_or(0, longest))
}

/// Right-pad every sequence with [PAD] to exactly `width`.
/// Sequences are never truncated.
pub fn pad_sequences(sequences: &[Vec<u32>], width: usize) -> PipelineResult<IndexMatrix> {
    let rows = sequences
        .iter()
        .map(|seq| {
            if seq.len() > width {
                return Err(PipelineError::SequenceTooLong { len: seq.len(), width });
            }
            let mut row = Vec::with_capacity(width);
            row.extend_from_slice(seq);
            row.resize(width, PAD_INDEX);
            Ok(row)
        })
        .collect::<PipelineResult<Vec<_>>>()?;
    IndexMatrix::from_rows(width, rows)
}

/// Shift `target` right by one and put [START] in column 0.
pub fn build_decoder_input(target: &IndexMatrix) -> IndexMatrix {
    let width = target.width();
    let mut decoder = IndexMatrix::zeros(target.len(), width);
    if width == 0 {
        return decoder;
    }
    for (r, row) in target.rows().iter().enumerate() {
        decoder.set(r, 0, START_INDEX);
        for t in 1..width {
            decoder.set(r, t, row[t - 1]);
        }
    }
    decoder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_comes_from_anchor_and_root_only() {
        let anchors = vec![vec![2, 3], vec![4]];
        let roots = vec![vec![2, 3, 4]];
        assert_eq!(max_word_len(&anchors, Some(&roots)), 3);
        assert_eq!(max_word_len(&anchors, None), 2);
    }

    #[test]
    fn test_padding_keeps_prefix_and_fills_with_pad() {
        let padded = pad_sequences(&[vec![5, 6], vec![7], vec![]], 4).unwrap();
        assert_eq!(padded.width(), 4);
        assert_eq!(padded.rows(), &[vec![5, 6, 0, 0], vec![7, 0, 0, 0], vec![0, 0, 0, 0]]);
    }

    #[test]
    fn test_padding_refuses_to_truncate() {
        assert!(matches!(
            pad_sequences(&[vec![1, 2, 3]], 2),
            Err(PipelineError::SequenceTooLong { len: 3, width: 2 })
        ));
    }

    #[test]
    fn test_decoder_input_is_shifted_target() {
        let target = pad_sequences(&[vec![5, 6, 7], vec![8]], 3).unwrap();
        let dec = build_decoder_input(&target);
        assert_eq!(dec.rows(), &[vec![1, 5, 6], vec![1, 8, 0]]);
        for r in 0..target.len() {
            assert_eq!(dec.row(r)[0], START_INDEX);
            assert_eq!(&dec.row(r)[1..], &target.row(r)[..2]);
        }
    }
}
