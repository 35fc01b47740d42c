// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores everything needed to rebuild a trained
// tagger, using Burn's CompactRecorder for weights and JSON for
// the rest.
//
// File layout:
//   checkpoints/
//     model_epoch_1.mpk        ← full classifier after epoch 1
//     model_epoch_2.mpk
//     ...
//     encoder.mpk              ← encoder only, for reuse as a
//                                pretrained starting point
//     latest_epoch.json        ← number of the latest epoch
//     train_config.json        ← run hyperparameters
//     model_config.json        ← exact architecture incl. label count
//     label_map.json           ← class id ⇄ tag
//     tokenizer.json           ← written by TokenizerStore
//     metrics.csv / results.json ← written by MetricsLogger
//
// The architecture is saved separately from the weights because
// loading needs a model of the right shape to load into.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{anyhow, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::domain::label_map::LabelMap;
use crate::ml::model::{Encoder, TokenClassifier, TokenClassifierConfig};

const LATEST_EPOCH: &str = "latest_epoch.json";
const TRAIN_CONFIG: &str = "train_config.json";
const MODEL_CONFIG: &str = "model_config.json";
const LABEL_MAP:    &str = "label_map.json";
const ENCODER:      &str = "encoder";

/// Manages saving and loading of model checkpoints.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Point at a checkpoint directory. Nothing is created until
    /// the first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", self.dir.display()))
    }

    // ── Weights ───────────────────────────────────────────────────────────────

    /// Save classifier weights for `epoch` and mark it as the latest.
    pub fn save_model<B: Backend>(&self, model: &TokenClassifier<B>, epoch: usize) -> Result<()> {
        self.ensure_dir()?;
        // Recorder adds the file extension
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        self.write_json(LATEST_EPOCH, &epoch)?;
        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the latest classifier weights into `model`, which must
    /// have the architecture recorded in model_config.json.
    pub fn load_model<B: Backend>(
        &self,
        model:  TokenClassifier<B>,
        device: &B::Device,
    ) -> Result<TokenClassifier<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_encoder<B: Backend>(&self, encoder: &Encoder<B>) -> Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join(ENCODER);
        CompactRecorder::new()
            .record(encoder.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save encoder to '{}'", path.display()))?;
        Ok(())
    }

    pub fn load_encoder<B: Backend>(&self, encoder: Encoder<B>, device: &B::Device) -> Result<Encoder<B>> {
        let path   = self.dir.join(ENCODER);
        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load pretrained encoder '{}'", path.display()))?;
        Ok(encoder.load_record(record))
    }

    fn latest_epoch(&self) -> Result<usize> {
        self.read_json(LATEST_EPOCH)
            .context("No checkpoint found. Have you run 'train' first?")
    }

    // ── Metadata ──────────────────────────────────────────────────────────────

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json(TRAIN_CONFIG, cfg)
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        self.read_json(TRAIN_CONFIG)
    }

    pub fn save_model_config(&self, cfg: &TokenClassifierConfig) -> Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join(MODEL_CONFIG);
        cfg.save(&path)
            .with_context(|| format!("Cannot write model config to '{}'", path.display()))
    }

    pub fn load_model_config(&self) -> Result<TokenClassifierConfig> {
        let path = self.dir.join(MODEL_CONFIG);
        TokenClassifierConfig::load(&path)
            .map_err(|e| anyhow!("Cannot read model config '{}': {e}", path.display()))
    }

    pub fn save_label_map(&self, map: &LabelMap) -> Result<()> {
        self.write_json(LABEL_MAP, map)
    }

    pub fn load_label_map(&self) -> Result<LabelMap> {
        self.read_json(LABEL_MAP)
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Saved '{}'", path.display());
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed '{}'", path.display()))
    }
}
