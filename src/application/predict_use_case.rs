// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Tags free text with a saved checkpoint. Text is split on
// whitespace into words; each word gets one tag back.

use std::path::Path;

use anyhow::Result;
use burn::prelude::*;

use crate::data::processor::TokenClassificationProcessor;
use crate::domain::traits::TokenTagger;
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::inferencer::Tagger;

pub struct PredictUseCase<B: Backend> {
    processor: TokenClassificationProcessor,
    tagger:    Tagger<B>,
}

impl<B: Backend> PredictUseCase<B> {
    pub fn new(checkpoint_dir: impl AsRef<Path>, device: B::Device) -> Result<Self> {
        let dir       = checkpoint_dir.as_ref();
        let ckpt      = CheckpointManager::new(dir);
        let cfg       = ckpt.load_config()?;
        let tokenizer = TokenizerStore::new(dir).load()?;
        let processor = TokenClassificationProcessor::new(tokenizer, cfg.max_seq_len)?;
        let tagger    = Tagger::from_checkpoint(&ckpt, device)?;
        Ok(Self { processor, tagger })
    }

    /// (word, tag) pairs for whitespace-separated `text`.
    pub fn tag_text(&self, text: &str) -> Result<Vec<(String, String)>> {
        let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        let tags = self.tag(&words)?;
        if tags.len() < words.len() {
            tracing::warn!(
                "Only the first {} of {} words fit in the model's sequence length",
                tags.len(), words.len()
            );
        }
        Ok(words.into_iter().zip(tags).collect())
    }
}

impl<B: Backend> TokenTagger for PredictUseCase<B> {
    fn tag(&self, words: &[String]) -> Result<Vec<String>> {
        let sample = self.processor.encode_words(words)?;
        let mut tags = self.tagger.predict(std::slice::from_ref(&sample))?;
        Ok(tags.pop().unwrap_or_default())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    use crate::application::train_use_case::{tests::tiny_config, TrainUseCase};

    #[test]
    fn test_tags_every_word_that_fits() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());
        TrainUseCase::new(cfg.clone())
            .execute::<Autodiff<NdArray>>(Default::default())
            .unwrap();

        let predictor = PredictUseCase::<NdArray>::new(&cfg.checkpoint_dir, Default::default()).unwrap();
        let labels    = ["I-PER", "I-LOC", "O"];

        let tagged = predictor.tag_text("Johanson lives in   Oslo").unwrap();
        let words: Vec<&str> = tagged.iter().map(|(w, _)| w.as_str()).collect();
        assert_eq!(words, vec!["Johanson", "lives", "in", "Oslo"]);
        assert!(tagged.iter().all(|(_, t)| labels.contains(&t.as_str())));

        // max_seq_len 8 leaves room for six pieces
        let long: Vec<String> = (0..10).map(|_| "in".to_string()).collect();
        assert_eq!(predictor.tag(&long).unwrap().len(), 6);
        assert!(predictor.tag(&[]).unwrap().is_empty());
    }
}
