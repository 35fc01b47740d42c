// ============================================================
// Layer 5 — Training Loop ("fit")
// ============================================================
// Full train + held-out loop using Burn's DataLoader and AdamW.
//
// Key Burn insights:
//   - Training uses an Autodiff<...> backend for gradients
//   - model.valid() returns the model on B::InnerBackend
//   - The held-out batcher must also use B::InnerBackend
//
// Learning rate: linear warmup over the first `warmup_proportion`
// of all steps, then linear decay to zero (the usual BERT
// fine-tuning schedule).
//
// Reference: Burn Book §5, Loshchilov & Hutter (2019) AdamW

use anyhow::{bail, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    grad_clipping::GradientClippingConfig,
    module::AutodiffModule,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::TokenBatcher, dataset::TokenDataset};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{masked_correct, masked_cross_entropy, TokenClassifier, TokenClassifierConfig};

/// Learning rate for optimiser step `step` (0-based) out of `total_steps`.
pub fn scheduled_lr(base_lr: f64, step: usize, total_steps: usize, warmup_steps: usize) -> f64 {
    if step < warmup_steps {
        return base_lr * (step + 1) as f64 / warmup_steps as f64;
    }
    let remaining = total_steps.saturating_sub(step) as f64;
    let decay     = total_steps.saturating_sub(warmup_steps).max(1) as f64;
    base_lr * (remaining / decay).clamp(0.0, 1.0)
}

pub fn run_training<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    model_cfg:     &TokenClassifierConfig,
    train_dataset: TokenDataset,
    test_dataset:  TokenDataset,
    ckpt_manager:  &CheckpointManager,
    pretrained:    Option<&CheckpointManager>,
    device:        B::Device,
) -> Result<TokenClassifier<B::InnerBackend>> {
    if train_dataset.sample_count() == 0 {
        bail!("Training set is empty");
    }
    B::seed(cfg.random_seed);

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: TokenClassifier<B> = model_cfg.init(&device);
    if let Some(source) = pretrained {
        model.encoder = source.load_encoder(model.encoder, &device)?;
        tracing::info!("Encoder initialised from pretrained weights");
    }
    tracing::info!(
        "Model ready: {} layers, d_model={}, {} labels",
        model_cfg.encoder.num_layers, model_cfg.encoder.d_model, model_cfg.num_labels
    );

    // ── AdamW optimiser with gradient-norm clipping ──────────────────────────
    let optim_cfg = AdamWConfig::new()
        .with_epsilon(1e-8)
        .with_weight_decay(cfg.weight_decay as f32)
        .with_grad_clipping(Some(GradientClippingConfig::Norm(1.0)));
    let mut optim = optim_cfg.init();

    let steps_per_epoch = train_dataset.sample_count().div_ceil(cfg.batch_size);
    let total_steps     = steps_per_epoch * cfg.epochs;
    let warmup_steps    = (total_steps as f64 * cfg.warmup_proportion).round() as usize;

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_batcher = TokenBatcher::<B>::new(device.clone());
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.random_seed)
        .num_workers(1)
        .build(train_dataset);

    // ── Held-out data loader (InnerBackend — no autodiff overhead) ────────────
    let has_test    = test_dataset.sample_count() > 0;
    let test_batcher = TokenBatcher::<B::InnerBackend>::new(device.clone());
    let test_loader  = DataLoaderBuilder::new(test_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(test_dataset);

    let metrics_logger = MetricsLogger::new(&cfg.checkpoint_dir)?;
    let mut step      = 0usize;
    let mut best_loss = f64::INFINITY;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _) = model.forward_loss(
                batch.input_ids,
                batch.attention_mask,
                batch.label_ids,
                batch.loss_mask,
            );

            train_loss_sum += loss.clone().into_scalar().elem::<f64>();
            train_batches  += 1;

            let lr    = scheduled_lr(cfg.lr, step, total_steps, warmup_steps);
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(lr, model, grads);
            step += 1;
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Held-out phase ────────────────────────────────────────────────────
        // dropout disabled for deterministic evaluation
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;
        let mut correct      = 0usize;
        let mut counted      = 0usize;

        if has_test {
            for batch in test_loader.iter() {
                let logits = model_valid.forward(batch.input_ids, batch.attention_mask);
                let loss   = masked_cross_entropy(
                    logits.clone(), batch.label_ids.clone(), batch.loss_mask.clone(),
                );
                val_loss_sum += loss.into_scalar().elem::<f64>();
                val_batches  += 1;

                let (hit, total) = masked_correct(logits, batch.label_ids, batch.loss_mask);
                correct += hit;
                counted += total;
            }
        }

        let avg_val_loss = if val_batches > 0 { val_loss_sum / val_batches as f64 } else { f64::NAN };
        let token_acc    = if counted > 0 { correct as f64 / counted as f64 } else { 0.0 };

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | test_loss={:.4} | token_acc={:.1}%",
            epoch, cfg.epochs, avg_train_loss, avg_val_loss, token_acc * 100.0,
        );

        let metrics = EpochMetrics::new(epoch, avg_train_loss, avg_val_loss, token_acc);
        if metrics.is_improvement(best_loss) {
            best_loss = metrics.test_loss;
            tracing::info!("New best test loss {:.4} at epoch {}", best_loss, epoch);
        }
        metrics_logger.log(&metrics)?;
        ckpt_manager.save_model(&model, epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);
    }

    ckpt_manager.save_encoder(&model.encoder)?;
    tracing::info!("Training complete! Metrics in '{}'", metrics_logger.csv_path().display());
    Ok(model.valid())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_without_warmup_decays_linearly() {
        assert_eq!(scheduled_lr(1.0, 0, 4, 0), 1.0);
        assert_eq!(scheduled_lr(1.0, 2, 4, 0), 0.5);
        assert_eq!(scheduled_lr(1.0, 3, 4, 0), 0.25);
    }

    #[test]
    fn test_schedule_with_warmup() {
        // 10 steps, 2 warmup
        assert_eq!(scheduled_lr(1.0, 0, 10, 2), 0.5);
        assert_eq!(scheduled_lr(1.0, 1, 10, 2), 1.0);
        assert_eq!(scheduled_lr(1.0, 2, 10, 2), 1.0);
        assert_eq!(scheduled_lr(1.0, 6, 10, 2), 0.5);
        assert_eq!(scheduled_lr(1.0, 10, 10, 2), 0.0);
    }
}
