// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands `train`, `evaluate` and
// `predict` and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;
use crate::data::download::WIKIGOLD_URL;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune a tagger on a CoNLL dataset and score the held-out split
    Train(TrainArgs),

    /// Score a trained checkpoint on a labelled CoNLL file
    Evaluate(EvaluateArgs),

    /// Tag a sentence with a trained checkpoint
    Predict(PredictArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// URL of the CoNLL dataset to download
    #[arg(long, default_value = WIKIGOLD_URL)]
    pub dataset_url: String,

    /// Use a local CoNLL file instead of downloading
    #[arg(long)]
    pub conll_file: Option<String>,

    /// Field separator of the CoNLL file
    #[arg(long, default_value = " ")]
    pub separator: String,

    /// Where downloaded datasets are cached
    #[arg(long, default_value = "data")]
    pub cache_dir: String,

    /// Directory to save checkpoints, tokenizer, metrics and results
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Fraction of sentences held out for testing
    #[arg(long, default_value_t = 0.5)]
    pub test_size: f64,

    /// Keep only this fraction of the training split (quick runs)
    #[arg(long, default_value_t = 1.0)]
    pub train_data_fraction: f64,

    /// Keep only this fraction of the test split (quick runs)
    #[arg(long, default_value_t = 1.0)]
    pub test_data_fraction: f64,

    /// Seed for the split, shuffling and weight initialisation
    #[arg(long, default_value_t = 100)]
    pub random_seed: u64,

    /// Sub-word pieces per sequence including [CLS] and [SEP]
    #[arg(long, default_value_t = 200)]
    pub max_seq_len: usize,

    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 5)]
    pub epochs: usize,

    #[arg(long, default_value_t = 5e-5)]
    pub lr: f64,

    /// Fraction of optimiser steps spent warming the learning rate up
    #[arg(long, default_value_t = 0.0)]
    pub warmup_proportion: f64,

    #[arg(long, default_value_t = 0.01)]
    pub weight_decay: f64,

    /// Hidden dimension of the encoder
    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    /// d_model must be divisible by num_heads
    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    #[arg(long, default_value_t = 6)]
    pub num_layers: usize,

    /// Inner dimension of the feed-forward network
    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Vocabulary size when building a tokenizer from the data
    #[arg(long, default_value_t = 30000)]
    pub vocab_size: usize,

    /// Lower-case text before tokenising (uncased models)
    #[arg(long)]
    pub do_lower_case: bool,

    /// Tag given to the trailing sub-word pieces of a word
    #[arg(long, default_value = "X")]
    pub trailing_piece_tag: String,

    /// HuggingFace tokenizer.json to use instead of building one
    #[arg(long)]
    pub tokenizer_file: Option<String>,

    /// Checkpoint directory of an earlier run to start from
    #[arg(long)]
    pub pretrained_dir: Option<String>,

    /// Number of test sentences to print with their predictions
    #[arg(long, default_value_t = 5)]
    pub num_examples: usize,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            dataset_url:         a.dataset_url,
            conll_file:          a.conll_file,
            separator:           a.separator,
            cache_dir:           a.cache_dir,
            checkpoint_dir:      a.checkpoint_dir,
            test_fraction:       a.test_size,
            train_data_fraction: a.train_data_fraction,
            test_data_fraction:  a.test_data_fraction,
            random_seed:         a.random_seed,
            max_seq_len:         a.max_seq_len,
            batch_size:          a.batch_size,
            epochs:              a.epochs,
            lr:                  a.lr,
            warmup_proportion:   a.warmup_proportion,
            weight_decay:        a.weight_decay,
            d_model:             a.d_model,
            num_heads:           a.num_heads,
            num_layers:          a.num_layers,
            d_ff:                a.d_ff,
            dropout:             a.dropout,
            vocab_size:          a.vocab_size,
            do_lower_case:       a.do_lower_case,
            trailing_piece_tag:  a.trailing_piece_tag,
            tokenizer_file:      a.tokenizer_file,
            pretrained_dir:      a.pretrained_dir,
            num_examples:        a.num_examples,
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Labelled CoNLL file to score
    #[arg(long)]
    pub conll_file: String,

    #[arg(long, default_value = " ")]
    pub separator: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, default_value_t = 5)]
    pub num_examples: usize,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Text to tag; words are split on whitespace
    #[arg(long)]
    pub text: String,

    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}
