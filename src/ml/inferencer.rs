// ============================================================
// Layer 5 — Inferencer ("predict")
// ============================================================
// Runs the trained token classifier over encoded samples and
// turns per-piece class ids back into per-word tags:
//
//   pieces:  [CLS] Johan ##son lives  [SEP]
//   argmax:   O    I-PER  X    O       O
//   starts:        y      n    y
//   tags:          I-PER       O
//
// Only word-start positions are read; trailing pieces are
// dropped. A trailing tag predicted on a word start has no
// meaning at word level and is reported as "O".

use anyhow::{anyhow, Result};
use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::{batcher::TokenBatcher, dataset::TokenSample};
use crate::domain::label_map::LabelMap;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::TokenClassifier;

const OUTSIDE: &str = "O";

pub struct Tagger<B: Backend> {
    model:      TokenClassifier<B>,
    label_map:  LabelMap,
    batch_size: usize,
    device:     B::Device,
}

impl<B: Backend> Tagger<B> {
    pub fn new(model: TokenClassifier<B>, label_map: LabelMap, batch_size: usize, device: B::Device) -> Self {
        Self { model, label_map, batch_size: batch_size.max(1), device }
    }

    /// Rebuild the model saved in `ckpt_manager` and load its latest weights.
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, device: B::Device) -> Result<Self> {
        let cfg       = ckpt_manager.load_config()?;
        let label_map = ckpt_manager.load_label_map()?;
        let model_cfg = ckpt_manager.load_model_config()?;

        let model: TokenClassifier<B> = model_cfg.init(&device);
        let model = ckpt_manager.load_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint");

        Ok(Self::new(model, label_map, cfg.batch_size, device))
    }

    /// Predicted class id at every position, one row per sample, in input order.
    pub fn predict_ids(&self, samples: &[TokenSample]) -> Result<Vec<Vec<u32>>> {
        let batcher = TokenBatcher::<B>::new(self.device.clone());
        let mut out = Vec::with_capacity(samples.len());

        // Chunks rather than a DataLoader: results must stay aligned with `samples`.
        for chunk in samples.chunks(self.batch_size) {
            let batch   = batcher.batch(chunk.to_vec());
            let seq_len = batch.input_ids.dims()[1];
            let logits  = self.model.forward(batch.input_ids, batch.attention_mask);
            let ids     = logits
                .argmax(2)
                .into_data()
                .convert::<i64>()
                .to_vec::<i64>()
                .map_err(|e| anyhow!("Cannot read predictions: {e:?}"))?;

            out.extend(ids.chunks(seq_len).map(|row| row.iter().map(|&i| i as u32).collect()));
        }
        Ok(out)
    }

    /// Predicted tag for every word-start position of every sample.
    pub fn predict(&self, samples: &[TokenSample]) -> Result<Vec<Vec<String>>> {
        let ids = self.predict_ids(samples)?;
        Ok(samples
            .iter()
            .zip(ids)
            .map(|(sample, row)| self.word_tags(sample, &row))
            .collect())
    }

    fn word_tags(&self, sample: &TokenSample, row: &[u32]) -> Vec<String> {
        let trailing = self.label_map.trailing_id();
        sample
            .word_starts
            .iter()
            .zip(row)
            .filter(|(start, _)| **start)
            .map(|(_, &id)| match self.label_map.label_of(id) {
                Some(label) if id != trailing => label.to_string(),
                _ => OUTSIDE.to_string(),
            })
            .collect()
    }
}
