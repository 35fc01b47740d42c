// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a saved checkpoint on a labelled CoNLL file:
//
//   Step 1: Rebuild tokenizer + tagger  (Layer 6 / Layer 5)
//   Step 2: Parse the CoNLL file        (Layer 4)
//   Step 3: Encode words, predict tags  (Layer 4 / Layer 5)
//   Step 4: Entity-level report         (eval)
//
// Gold tags are never fed to the model here, so a file may use
// tags the model was not trained on; they simply score as misses.
//
// `evaluate` is shared with the training pipeline, which scores
// its own test split the same way.

use std::path::PathBuf;

use anyhow::Result;
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::{conll::ConllFile, dataset::TokenSample, processor::TokenClassificationProcessor};
use crate::domain::{sentence::TaggedSentence, traits::SentenceSource};
use crate::eval::{token_accuracy, ClassificationReport};
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::inferencer::Tagger;

/// One sentence with gold and predicted tags side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionExample {
    pub tokens:      Vec<String>,
    pub true_labels: Vec<String>,
    pub pred_labels: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub report:         ClassificationReport,
    pub token_accuracy: f64,
    /// The first few scored sentences
    pub examples:       Vec<PredictionExample>,
}

/// Predict every sample and score against the matching sentence.
/// Gold tags are cut to the words that survived truncation.
pub fn evaluate<B: Backend>(
    tagger:       &Tagger<B>,
    sentences:    &[TaggedSentence],
    samples:      &[TokenSample],
    num_examples: usize,
) -> Result<Evaluation> {
    let y_pred = tagger.predict(samples)?;

    let kept: Vec<usize> = samples.iter().map(TokenSample::word_count).collect();
    let y_true: Vec<Vec<String>> = sentences
        .iter()
        .zip(&kept)
        .map(|(s, &n)| s.labels[..n.min(s.word_count())].to_vec())
        .collect();

    let truncated = sentences.iter().zip(&kept).filter(|(s, n)| **n < s.word_count()).count();
    if truncated > 0 {
        tracing::warn!("{} sentences were truncated to the maximum sequence length", truncated);
    }

    let report         = ClassificationReport::from_sequences(&y_true, &y_pred)?;
    let token_accuracy = token_accuracy(&y_true, &y_pred)?;

    let examples = sentences
        .iter()
        .zip(y_true.iter().zip(&y_pred))
        .take(num_examples)
        .map(|(s, (gold, pred))| PredictionExample {
            tokens:      s.tokens[..gold.len()].to_vec(),
            true_labels: gold.clone(),
            pred_labels: pred.clone(),
        })
        .collect();

    Ok(Evaluation { report, token_accuracy, examples })
}

pub struct EvaluateUseCase {
    checkpoint_dir: PathBuf,
    conll_file:     PathBuf,
    separator:      String,
    num_examples:   usize,
}

impl EvaluateUseCase {
    pub fn new(
        checkpoint_dir: impl Into<PathBuf>,
        conll_file:     impl Into<PathBuf>,
        separator:      impl Into<String>,
        num_examples:   usize,
    ) -> Self {
        Self {
            checkpoint_dir: checkpoint_dir.into(),
            conll_file:     conll_file.into(),
            separator:      separator.into(),
            num_examples,
        }
    }

    pub fn execute<B: Backend>(&self, device: B::Device) -> Result<Evaluation> {
        let ckpt      = CheckpointManager::new(&self.checkpoint_dir);
        let cfg       = ckpt.load_config()?;
        let tokenizer = TokenizerStore::new(&self.checkpoint_dir).load()?;
        let processor = TokenClassificationProcessor::new(tokenizer, cfg.max_seq_len)?;
        let tagger    = Tagger::<B>::from_checkpoint(&ckpt, device)?;

        let sentences = ConllFile::new(&self.conll_file)
            .with_separator(self.separator.as_str())
            .load_sentences()?;

        let samples = sentences
            .iter()
            .map(|s| processor.encode_words(&s.tokens))
            .collect::<Result<Vec<_>>>()?;

        evaluate(&tagger, &sentences, &samples, self.num_examples)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use std::fs;

    use crate::application::train_use_case::{tests::tiny_config, TrainUseCase};
    use crate::data::fixtures::{sentence, to_conll, toy_corpus};

    type B = NdArray;

    #[test]
    fn test_scores_a_saved_checkpoint_on_a_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());
        TrainUseCase::new(cfg.clone())
            .execute::<burn::backend::Autodiff<B>>(Default::default())
            .unwrap();

        // "B-MISC" never appears in training; it must not be an error.
        let mut corpus = toy_corpus();
        corpus.push(sentence("Oslo in", "B-MISC O"));
        let file = dir.path().join("eval.conll");
        fs::write(&file, to_conll(&corpus)).unwrap();

        let evaluation = EvaluateUseCase::new(&cfg.checkpoint_dir, &file, " ", 3)
            .execute::<B>(Default::default())
            .unwrap();

        assert_eq!(evaluation.examples.len(), 3);
        assert!(evaluation.report.classes.iter().any(|(kind, _)| kind == "MISC"));
        assert!((0.0..=1.0).contains(&evaluation.token_accuracy));
        for ex in &evaluation.examples {
            assert_eq!(ex.tokens.len(), ex.true_labels.len());
            assert_eq!(ex.true_labels.len(), ex.pred_labels.len());
        }
    }

    #[test]
    fn test_missing_checkpoint_is_error() {
        let dir  = tempfile::tempdir().unwrap();
        let file = dir.path().join("eval.conll");
        fs::write(&file, to_conll(&toy_corpus())).unwrap();

        let result = EvaluateUseCase::new(dir.path().join("nothing"), &file, " ", 0)
            .execute::<B>(Default::default());
        assert!(result.is_err());
    }
}
