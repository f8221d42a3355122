// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Train mode tensorises the training and validation corpora as ONE
// pool (training corpus first) so both share the same padding width,
// vocabulary and label spaces. The pool is then cut back apart at
// the training corpus length:
//
//   [ train_0 … train_{n-1} | val_0 … val_{m-1} ]
//                           ^ train_size = n
//
// No shuffling happens here; order is part of the alignment contract.

/// Split `samples` into (train, validation) at `train_size`.
///
/// A `train_size` past the end keeps everything for training.
pub fn split_train_val<T>(mut samples: Vec<T>, train_size: usize) -> (Vec<T>, Vec<T>) {
    let split_at = train_size.min(samples.len());

    // split_off(n) removes elements [n..] from the Vec and returns them
    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        samples.len(),
        val.len(),
    );

    (samples, val)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val)      = split_train_val(items, 80);
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(),   20);
    }

    #[test]
    fn test_order_is_preserved() {
        let items: Vec<usize> = (0..5).collect();
        let (train, val)      = split_train_val(items, 3);
        assert_eq!(train, vec![0, 1, 2]);
        assert_eq!(val,   vec![3, 4]);
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<usize> = Vec::new();
        let (train, val)      = split_train_val(items, 8);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }

    #[test]
    fn test_oversized_train_size_keeps_everything() {
        let items: Vec<usize> = (0..10).collect();
        let (train, val)      = split_train_val(items, 50);
        assert_eq!(train.len(), 10);
        assert!(val.is_empty());
    }
}
