// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full fine-tuning pipeline in order:
//
//   Step 1: Download / open the CoNLL file  (Layer 4 - data)
//   Step 2: Split train/test, subsample     (Layer 4 - data)
//   Step 3: Build the label map             (Layer 3 - domain)
//   Step 4: Resolve the tokenizer           (Layer 6 - infra)
//   Step 5: Align labels to sub-words       (Layer 4 - data)
//   Step 6: Save config, architecture, map  (Layer 6 - infra)
//   Step 7: Fit                             (Layer 5 - ml)
//   Step 8: Predict + score the test split  (Layer 5 / eval)
//   Step 9: Record results.json             (Layer 6 - infra)
//
// Reference: Burn Book §5 (Training)

use std::path::PathBuf;

use anyhow::{bail, Result};
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};

use crate::application::evaluate_use_case::{evaluate, Evaluation};
use crate::data::{
    conll::ConllFile,
    dataset::TokenDataset,
    download::{DatasetDownloader, WIKIGOLD_URL},
    processor::TokenClassificationProcessor,
    splitter::{split_train_test, subsample},
};
use crate::domain::{label_map::LabelMap, sentence::TaggedSentence, traits::SentenceSource};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::RunSummary,
    tokenizer_store::TokenizerStore,
};
use crate::ml::{
    inferencer::Tagger,
    model::{EncoderConfig, TokenClassifierConfig},
    trainer::run_training,
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings for a training run. Saved next to the checkpoints
// as train_config.json so evaluation and prediction can rebuild
// the same preprocessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub dataset_url:         String,
    /// Local CoNLL file; skips the download when set
    pub conll_file:          Option<String>,
    pub separator:           String,
    pub cache_dir:           String,
    pub checkpoint_dir:      String,
    pub test_fraction:       f64,
    pub train_data_fraction: f64,
    pub test_data_fraction:  f64,
    pub random_seed:         u64,
    pub max_seq_len:         usize,
    pub batch_size:          usize,
    pub epochs:              usize,
    pub lr:                  f64,
    pub warmup_proportion:   f64,
    pub weight_decay:        f64,
    pub d_model:             usize,
    pub num_heads:           usize,
    pub num_layers:          usize,
    pub d_ff:                usize,
    pub dropout:             f64,
    pub vocab_size:          usize,
    pub do_lower_case:       bool,
    pub trailing_piece_tag:  String,
    pub tokenizer_file:      Option<String>,
    /// Checkpoint directory of an earlier run whose encoder and
    /// tokenizer are the starting point
    pub pretrained_dir:      Option<String>,
    pub num_examples:        usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            dataset_url:         WIKIGOLD_URL.to_string(),
            conll_file:          None,
            separator:           " ".to_string(),
            cache_dir:           "data".to_string(),
            checkpoint_dir:      "checkpoints".to_string(),
            test_fraction:       0.5,
            train_data_fraction: 1.0,
            test_data_fraction:  1.0,
            random_seed:         100,
            max_seq_len:         200,
            batch_size:          16,
            epochs:              5,
            lr:                  5e-5,
            warmup_proportion:   0.0,
            weight_decay:        0.01,
            d_model:             256,
            num_heads:           8,
            num_layers:          6,
            d_ff:                1024,
            dropout:             0.1,
            vocab_size:          30000,
            do_lower_case:       false,
            trailing_piece_tag:  "X".to_string(),
            tokenizer_file:      None,
            pretrained_dir:      None,
            num_examples:        5,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.test_fraction) {
            bail!("test_fraction must be in [0, 1), got {}", self.test_fraction);
        }
        for (name, f) in [("train_data_fraction", self.train_data_fraction),
                          ("test_data_fraction",  self.test_data_fraction)] {
            if !(f > 0.0 && f <= 1.0) {
                bail!("{name} must be in (0, 1], got {f}");
            }
        }
        if self.batch_size == 0 || self.epochs == 0 {
            bail!("batch_size and epochs must be positive");
        }
        if self.num_heads == 0 || self.d_model % self.num_heads != 0 {
            bail!("d_model ({}) must be divisible by num_heads ({})", self.d_model, self.num_heads);
        }
        if self.trailing_piece_tag.is_empty() {
            bail!("trailing_piece_tag must not be empty");
        }
        Ok(())
    }
}

/// Everything a finished run reports back to the caller.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub evaluation: Evaluation,
    pub summary:    RunSummary,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute<B: AutodiffBackend>(&self, device: B::Device) -> Result<TrainOutcome> {
        let cfg = &self.config;
        cfg.validate()?;
        let seed = Some(cfg.random_seed);

        // ── Step 1: Sentences ─────────────────────────────────────────────────
        let sentences = self.load_sentences()?;
        if sentences.is_empty() {
            bail!("Dataset contains no sentences");
        }

        // ── Step 2: Train / test split ───────────────────────────────────────
        let (train, test) = split_train_test(sentences, cfg.test_fraction, seed);
        let train = subsample(train, cfg.train_data_fraction, seed);
        let test  = subsample(test, cfg.test_data_fraction, seed);
        tracing::info!("Split: {} train, {} test sentences", train.len(), test.len());

        // ── Step 3: Label map over both splits ───────────────────────────────
        let label_map = LabelMap::from_label_lists(
            train.iter().chain(&test).map(|s| &s.labels),
            &cfg.trailing_piece_tag,
        );
        tracing::info!("Labels: {:?}", label_map.labels());

        // ── Step 4: Tokenizer ────────────────────────────────────────────────
        let pretrained = cfg.pretrained_dir.as_ref().map(CheckpointManager::new);
        let explicit: Option<PathBuf> = cfg
            .tokenizer_file
            .as_ref()
            .map(PathBuf::from)
            .or_else(|| pretrained.as_ref().map(|p| TokenizerStore::new(p.dir()).path()));

        let words: Vec<&str> = train
            .iter()
            .flat_map(|s| s.tokens.iter().map(String::as_str))
            .collect();
        let tokenizer = TokenizerStore::new(&cfg.checkpoint_dir).load_or_build(
            explicit.as_deref(),
            &words,
            cfg.vocab_size,
            cfg.do_lower_case,
        )?;

        // ── Step 5: Sub-word alignment ───────────────────────────────────────
        let processor     = TokenClassificationProcessor::new(tokenizer, cfg.max_seq_len)?;
        let train_samples = processor.preprocess(&train, &label_map)?;
        let test_samples  = processor.preprocess(&test, &label_map)?;

        // ── Step 6: Persist what inference needs ─────────────────────────────
        let encoder_cfg = match &pretrained {
            Some(source) => pretrained_encoder(source, cfg, processor.vocab_size())?,
            None => EncoderConfig::new(
                processor.vocab_size(),
                cfg.max_seq_len,
                cfg.d_model,
                cfg.num_heads,
                cfg.num_layers,
                cfg.d_ff,
            )
            .with_dropout(cfg.dropout),
        };
        let model_cfg = TokenClassifierConfig::new(encoder_cfg, label_map.num_labels());

        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(cfg)?;
        ckpt_manager.save_model_config(&model_cfg)?;
        ckpt_manager.save_label_map(&label_map)?;

        // ── Step 7: Fit ──────────────────────────────────────────────────────
        let model = run_training::<B>(
            cfg,
            &model_cfg,
            TokenDataset::new(train_samples),
            TokenDataset::new(test_samples.clone()),
            &ckpt_manager,
            pretrained.as_ref(),
            device.clone(),
        )?;

        // ── Step 8: Predict and score the test split ─────────────────────────
        let tagger     = Tagger::<B::InnerBackend>::new(model, label_map, cfg.batch_size, device);
        let evaluation = evaluate(&tagger, &test, &test_samples, cfg.num_examples)?;

        // ── Step 9: Record ───────────────────────────────────────────────────
        let summary = RunSummary::new(&evaluation.report, evaluation.token_accuracy, train.len(), test.len());
        summary.save(&cfg.checkpoint_dir)?;
        tracing::info!(
            "precision={:.4} recall={:.4} f1={:.4}",
            summary.precision, summary.recall, summary.f1
        );

        Ok(TrainOutcome { evaluation, summary })
    }

    fn load_sentences(&self) -> Result<Vec<TaggedSentence>> {
        let cfg  = &self.config;
        let path = match &cfg.conll_file {
            Some(path) => PathBuf::from(path),
            None       => DatasetDownloader::new(&cfg.dataset_url, &cfg.cache_dir).fetch()?,
        };
        ConllFile::new(path)
            .with_separator(cfg.separator.as_str())
            .load_sentences()
    }
}

/// Architecture of a pretrained encoder, checked against this run.
fn pretrained_encoder(source: &CheckpointManager, cfg: &TrainConfig, vocab_size: usize) -> Result<EncoderConfig> {
    let encoder = source.load_model_config()?.encoder;
    if encoder.max_seq_len < cfg.max_seq_len {
        bail!(
            "Pretrained encoder supports sequences of {} pieces, max_seq_len is {}",
            encoder.max_seq_len, cfg.max_seq_len
        );
    }
    if encoder.vocab_size < vocab_size {
        bail!(
            "Tokenizer has {} entries but the pretrained encoder only embeds {}",
            vocab_size, encoder.vocab_size
        );
    }
    if (encoder.d_model, encoder.num_layers) != (cfg.d_model, cfg.num_layers) {
        tracing::warn!(
            "Using pretrained architecture (d_model={}, layers={}) instead of the configured one",
            encoder.d_model, encoder.num_layers
        );
    }
    Ok(encoder.with_dropout(cfg.dropout))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use std::{fs, path::Path};

    use crate::data::fixtures::{to_conll, toy_corpus};

    type B = Autodiff<NdArray>;

    /// A config that trains in well under a second on the toy corpus.
    pub(crate) fn tiny_config(dir: &Path) -> TrainConfig {
        let file = dir.join("toy.conll");
        fs::write(&file, to_conll(&toy_corpus())).unwrap();
        TrainConfig {
            conll_file:        Some(file.to_string_lossy().into_owned()),
            cache_dir:         dir.join("cache").to_string_lossy().into_owned(),
            checkpoint_dir:    dir.join("ckpt").to_string_lossy().into_owned(),
            max_seq_len:       8,
            batch_size:        4,
            epochs:            2,
            lr:                1e-3,
            warmup_proportion: 0.1,
            d_model:           16,
            num_heads:         2,
            num_layers:        1,
            d_ff:              32,
            vocab_size:        100,
            num_examples:      2,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_default_config_values() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.test_fraction, 0.5);
        assert_eq!(cfg.max_seq_len, 200);
        assert_eq!((cfg.batch_size, cfg.epochs, cfg.random_seed), (16, 5, 100));
        assert_eq!(cfg.trailing_piece_tag, "X");
        assert!(!cfg.do_lower_case);
        cfg.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            TrainConfig { test_fraction: 1.0, ..TrainConfig::default() },
            TrainConfig { train_data_fraction: 0.0, ..TrainConfig::default() },
            TrainConfig { train_data_fraction: f64::NAN, ..TrainConfig::default() },
            TrainConfig { test_data_fraction: f64::NAN, ..TrainConfig::default() },
            TrainConfig { test_fraction: f64::NAN, ..TrainConfig::default() },
            TrainConfig { batch_size: 0, ..TrainConfig::default() },
            TrainConfig { d_model: 250, ..TrainConfig::default() },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{cfg:?}");
        }
    }

    #[test]
    fn test_full_pipeline_writes_checkpoint_and_results() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());

        let outcome = TrainUseCase::new(cfg.clone())
            .execute::<B>(Default::default())
            .unwrap();

        assert_eq!((outcome.summary.train_size, outcome.summary.test_size), (8, 8));
        assert!((0.0..=1.0).contains(&outcome.summary.f1));
        assert_eq!(outcome.evaluation.examples.len(), 2);

        let ckpt = Path::new(&cfg.checkpoint_dir);
        for name in [
            "model_epoch_2.mpk", "encoder.mpk", "latest_epoch.json", "train_config.json",
            "model_config.json", "label_map.json", "tokenizer.json", "results.json",
        ] {
            assert!(ckpt.join(name).exists(), "missing {name}");
        }
        let csv = fs::read_to_string(ckpt.join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);

        let saved = CheckpointManager::new(ckpt).load_config().unwrap();
        assert_eq!(saved, cfg);
        let saved: RunSummary =
            serde_json::from_str(&fs::read_to_string(ckpt.join("results.json")).unwrap()).unwrap();
        assert_eq!(saved, outcome.summary);
    }

    #[test]
    fn test_pretrained_run_adopts_source_architecture() {
        let dir    = tempfile::tempdir().unwrap();
        let source = tiny_config(dir.path());
        TrainUseCase::new(source.clone()).execute::<B>(Default::default()).unwrap();

        let target_dir = dir.path().join("finetune");
        let target = TrainConfig {
            checkpoint_dir: target_dir.to_string_lossy().into_owned(),
            pretrained_dir: Some(source.checkpoint_dir.clone()),
            d_model:        8,
            epochs:         1,
            ..source.clone()
        };
        TrainUseCase::new(target).execute::<B>(Default::default()).unwrap();

        let model_cfg = CheckpointManager::new(&target_dir).load_model_config().unwrap();
        assert_eq!(model_cfg.encoder.d_model, 16);
        assert!(target_dir.join("tokenizer.json").exists());
    }

    #[test]
    fn test_file_without_sentences_is_error() {
        let dir  = tempfile::tempdir().unwrap();
        let file = dir.path().join("empty.conll");
        fs::write(&file, "-DOCSTART- O\n\n").unwrap();
        let cfg = TrainConfig {
            conll_file: Some(file.to_string_lossy().into_owned()),
            ..tiny_config(dir.path())
        };
        assert!(TrainUseCase::new(cfg).execute::<B>(Default::default()).is_err());
    }
}
