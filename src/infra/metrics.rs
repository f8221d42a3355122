// ============================================================
// Layer 6 — Metrics
// ============================================================
// Two kinds of numbers are recorded:
//
//   EpochMetrics       one CSV row per training epoch
//                      (checkpoints/metrics_<lang>.csv)
//   EvaluationSummary  test-mode accuracy of roots and tags
//
// Example CSV output:
//   epoch,train_loss,val_loss,root_char_acc,feature_acc
//   1,5.812400,5.390100,0.412000,0.533000
//   2,4.120300,4.011800,0.561000,0.640000

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

use crate::domain::corpus::FEATURE_NAMES;

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Average summed loss (root + six tags) over training batches
    pub train_loss: f64,

    /// Average summed loss on the validation split
    pub val_loss: f64,

    /// Fraction of non-padding root characters predicted correctly
    pub root_char_acc: f64,

    /// Mean over the six tag positions of per-sample accuracy
    pub feature_acc: f64,
}

impl EpochMetrics {
    pub fn new(
        epoch:         usize,
        train_loss:    f64,
        val_loss:      f64,
        root_char_acc: f64,
        feature_acc:   f64,
    ) -> Self {
        Self { epoch, train_loss, val_loss, root_char_acc, feature_acc }
    }

    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<PathBuf>, lang: &str) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join(format!("metrics_{lang}.csv"));

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create metrics CSV '{}'", csv_path.display()))?;
            writeln!(f, "epoch,train_loss,val_loss,root_char_acc,feature_acc")
                .with_context(|| format!("Cannot write CSV header to '{}'", csv_path.display()))?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open metrics CSV '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.val_loss,
            m.root_char_acc,
            m.feature_acc,
        )
        .with_context(|| format!("Cannot append to metrics CSV '{}'", self.csv_path.display()))?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );

        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── EvaluationSummary ────────────────────────────────────────────────────────
/// Test-mode accuracy over the filtered test corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub samples:          usize,
    /// Exact-match accuracy of predicted roots
    pub root_accuracy:    f64,
    /// Accuracy per tag position, in FEATURE_NAMES order
    pub feature_accuracy: Vec<f64>,
}

fn fraction(hits: usize, total: usize) -> f64 {
    if total == 0 { 0.0 } else { hits as f64 / total as f64 }
}

impl EvaluationSummary {
    pub fn compute(
        orig_roots: &[String],
        pred_roots: &[String],
        orig_tags:  &[Vec<String>],
        pred_tags:  &[Vec<String>],
    ) -> Self {
        let samples = orig_roots.len();
        let root_hits = orig_roots.iter().zip(pred_roots).filter(|(a, b)| a == b).count();
        let feature_accuracy = orig_tags
            .iter()
            .zip(pred_tags)
            .map(|(orig, pred)| {
                fraction(orig.iter().zip(pred).filter(|(a, b)| a == b).count(), orig.len())
            })
            .collect();

        Self { samples, root_accuracy: fraction(root_hits, samples), feature_accuracy }
    }

    pub fn log(&self) {
        tracing::info!(
            "Evaluated {} samples: root accuracy {:.2}%",
            self.samples,
            self.root_accuracy * 100.0
        );
        for (name, acc) in FEATURE_NAMES.iter().zip(&self.feature_accuracy) {
            tracing::info!("  {:<7} accuracy {:.2}%", name, acc * 100.0);
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn col(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 2.5, 2.3, 0.2, 0.2);
        assert!(m.is_improvement(3.0));
        assert!(!m.is_improvement(2.0));
    }

    #[test]
    fn test_logger_appends_rows() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path(), "hindi").unwrap();
        logger.log(&EpochMetrics::new(1, 2.0, 1.5, 0.5, 0.25)).unwrap();
        logger.log(&EpochMetrics::new(2, 1.0, 1.2, 0.6, 0.5)).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "1,2.000000,1.500000,0.500000,0.250000");
    }

    #[test]
    fn test_unwritable_dir_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let err = MetricsLogger::new(blocker.join("checkpoints"), "hindi").err().unwrap();
        let message = format!("{err:#}");
        assert!(message.contains("Cannot create metrics directory"));
        assert!(message.contains("blocker"));
    }

    #[test]
    fn test_evaluation_summary() {
        let summary = EvaluationSummary::compute(
            &col(&["a", "b"]),
            &col(&["a", "c"]),
            &[col(&["n", "v"]), col(&["m", "f"])],
            &[col(&["n", "v"]), col(&["f", "f"])],
        );
        assert_eq!(summary.samples, 2);
        assert_eq!(summary.root_accuracy, 0.5);
        assert_eq!(summary.feature_accuracy, vec![1.0, 0.5]);
    }
}
