// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + validation loop with Adam, best-model checkpointing
// and early stopping.
//
//   - Training uses TrainBackend (Autodiff<Wgpu>) for gradients
//   - model.valid() returns the model on the inner backend,
//     dropout disabled, so validation needs its own batcher
//   - Batch order is reshuffled every epoch from a seeded RNG
//   - Only an epoch with a new lowest validation loss is saved;
//     `patience` epochs without one stop the run
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{Context, Result};
use burn::{
    data::dataset::Dataset,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{MorphBatch, MorphBatcher},
    dataset::{MorphDataset, MorphSample},
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::model::{morph_loss, MorphModel, MorphModelConfig};
use crate::ml::TrainBackend;

/// Outcome of a finished training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub epochs_run:    usize,
    pub best_epoch:    usize,
    pub best_val_loss: f64,
}

pub fn run_training(
    cfg:           &TrainConfig,
    model_cfg:     &MorphModelConfig,
    train_dataset: MorphDataset,
    val_dataset:   MorphDataset,
    ckpt_manager:  &CheckpointManager,
    metrics:       &MetricsLogger,
) -> Result<TrainingSummary> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop::<TrainBackend>(cfg, model_cfg, train_dataset, val_dataset, ckpt_manager, metrics, device)
}

fn gather(dataset: &MorphDataset, indices: &[usize]) -> Vec<MorphSample> {
    indices.iter().filter_map(|&i| dataset.get(i)).collect()
}

/// Running totals over one pass of the validation set.
#[derive(Default)]
struct EvalTotals {
    loss_sum:      f64,
    batches:       usize,
    root_hits:     i64,
    root_total:    i64,
    feature_hits:  i64,
    feature_total: i64,
}

impl EvalTotals {
    fn loss(&self) -> f64 {
        if self.batches > 0 { self.loss_sum / self.batches as f64 } else { f64::NAN }
    }

    fn root_acc(&self) -> f64 {
        if self.root_total > 0 { self.root_hits as f64 / self.root_total as f64 } else { 0.0 }
    }

    fn feature_acc(&self) -> f64 {
        if self.feature_total > 0 { self.feature_hits as f64 / self.feature_total as f64 } else { 0.0 }
    }
}

fn evaluate<B: Backend>(
    model:      &MorphModel<B>,
    batcher:    &MorphBatcher<B>,
    dataset:    &MorphDataset,
    batch_size: usize,
) -> Result<EvalTotals> {
    let mut totals = EvalTotals::default();
    let order: Vec<usize> = (0..dataset.len()).collect();

    for chunk in order.chunks(batch_size) {
        let MorphBatch { words, decoder_input, phonetic, root_targets, feature_targets } =
            batcher.batch(&gather(dataset, chunk));
        let root_targets = root_targets.context("validation batch has no root targets")?;
        let output = model.forward(words, decoder_input, phonetic);

        totals.loss_sum += morph_loss(&output, root_targets.clone(), &feature_targets)
            .into_scalar()
            .elem::<f64>();
        totals.batches += 1;

        // Root accuracy counts non-padding target positions only.
        let [batch, width, _] = output.root_logits.dims();
        let predicted = output.root_logits.clone().argmax(2).reshape([batch, width]);
        let mask = root_targets.clone().equal_elem(0).bool_not().int();
        totals.root_hits += predicted
            .equal(root_targets)
            .int()
            .mul(mask.clone())
            .sum()
            .into_scalar()
            .elem::<i64>();
        totals.root_total += mask.sum().into_scalar().elem::<i64>();

        // argmax(1) returns shape [batch, 1]; flatten before comparing
        for (logits, targets) in output.feature_logits.iter().zip(&feature_targets) {
            totals.feature_hits += logits
                .clone()
                .argmax(1)
                .flatten::<1>(0, 1)
                .equal(targets.clone())
                .int()
                .sum()
                .into_scalar()
                .elem::<i64>();
            totals.feature_total += batch as i64;
        }
    }

    Ok(totals)
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    model_cfg:     &MorphModelConfig,
    train_dataset: MorphDataset,
    val_dataset:   MorphDataset,
    ckpt_manager:  &CheckpointManager,
    metrics:       &MetricsLogger,
    device:        B::Device,
) -> Result<TrainingSummary> {
    let batch_size = cfg.run.batch_size.max(1);

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: MorphModel<B> = model_cfg.init(&device);
    tracing::info!(
        "Model ready: embed_dim={}, hidden_dim={}, positions={}, {} train / {} validation samples",
        model_cfg.embed_dim,
        model_cfg.hidden_dim,
        model_cfg.max_positions,
        train_dataset.len(),
        val_dataset.len(),
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    let train_batcher = MorphBatcher::<B>::new(device.clone());
    let val_batcher   = MorphBatcher::<B::InnerBackend>::new(device.clone());
    let mut rng       = StdRng::seed_from_u64(cfg.seed);

    // Without a validation split the training loss drives model selection.
    let has_validation = val_dataset.sample_count() > 0;
    if !has_validation {
        tracing::warn!("Validation set is empty; selecting checkpoints on training loss");
    }

    let mut best_loss  = f64::INFINITY;
    let mut best_epoch = 0usize;
    let mut stale      = 0usize;
    let mut epochs_run = 0usize;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        epochs_run = epoch;

        // ── Training phase ────────────────────────────────────────────────────
        let mut order: Vec<usize> = (0..train_dataset.len()).collect();
        order.shuffle(&mut rng);

        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for chunk in order.chunks(batch_size) {
            let MorphBatch { words, decoder_input, phonetic, root_targets, feature_targets } =
                train_batcher.batch(&gather(&train_dataset, chunk));
            let root_targets = root_targets.context("training batch has no root targets")?;

            let output = model.forward(words, decoder_input, phonetic);
            let loss = morph_loss(&output, root_targets, &feature_targets);

            train_loss_sum += loss.clone().into_scalar().elem::<f64>();
            train_batches  += 1;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let totals = evaluate(&model.valid(), &val_batcher, &val_dataset, batch_size)?;
        let m = EpochMetrics::new(
            epoch,
            avg_train_loss,
            totals.loss(),
            totals.root_acc(),
            totals.feature_acc(),
        );
        metrics.log(&m)?;

        tracing::info!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | root_char_acc={:.1}% | feature_acc={:.1}%",
            epoch, cfg.epochs, m.train_loss, m.val_loss,
            m.root_char_acc * 100.0, m.feature_acc * 100.0,
        );

        // ── Checkpoint / early stopping ───────────────────────────────────────
        let improved = if has_validation {
            m.is_improvement(best_loss)
        } else {
            m.train_loss < best_loss
        };

        if improved {
            best_loss  = if has_validation { m.val_loss } else { m.train_loss };
            best_epoch = epoch;
            stale      = 0;
            ckpt_manager.save_model(&model)?;
            tracing::info!("New best model at epoch {} (loss {:.4})", epoch, best_loss);
        } else {
            stale += 1;
            if stale >= cfg.patience {
                tracing::info!(
                    "No improvement for {} epochs, stopping early at epoch {}",
                    stale, epoch
                );
                break;
            }
        }
    }

    tracing::info!("Training complete! Best epoch {} with loss {:.4}", best_epoch, best_loss);
    Ok(TrainingSummary { epochs_run, best_epoch, best_val_loss: best_loss })
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    fn sample(c: u32, class: usize) -> MorphSample {
        MorphSample {
            words:           vec![vec![c, c + 1, 0], vec![0, 0, 0], vec![0, 0, 0]],
            decoder_input:   vec![1, c, 0],
            phonetic:        Vec::new(),
            root_target:     vec![c, 0, 0],
            feature_targets: vec![class; 6],
        }
    }

    #[test]
    fn test_training_saves_best_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path(), "hindi", false).unwrap();
        let metrics = MetricsLogger::new(dir.path(), "hindi").unwrap();

        let mut cfg = TrainConfig::default();
        cfg.epochs = 2;
        cfg.patience = 5;
        cfg.run.batch_size = 2;

        let model_cfg = MorphModelConfig::new(8, 3, 4, 8, 2, 1, vec![2; 6], Vec::new(), 0.0);
        let train = MorphDataset::new(vec![sample(2, 0), sample(3, 1), sample(4, 0)]);
        let val = MorphDataset::new(vec![sample(2, 0)]);

        let summary = train_loop::<Autodiff<NdArray>>(
            &cfg, &model_cfg, train, val, &ckpt, &metrics, Default::default(),
        )
        .unwrap();

        assert_eq!(summary.epochs_run, 2);
        assert!(summary.best_epoch >= 1);
        assert!(summary.best_val_loss.is_finite());
        assert!(dir.path().join("model_hindi.mpk.gz").exists());

        let csv = std::fs::read_to_string(metrics.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 3);
    }
}
