use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One sentence, tokenised, label-aligned and padded to max_len.
/// Sequence format: [CLS] pieces... [SEP] [PAD]...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    /// Class id per position; 0 where `loss_mask` is 0
    pub label_ids:      Vec<u32>,
    /// 1 where the position contributes to the loss
    pub loss_mask:      Vec<u32>,
    /// True at the first piece of every word that survived truncation
    pub word_starts:    Vec<bool>,
}

impl TokenSample {
    /// Number of words represented in this sample
    pub fn word_count(&self) -> usize {
        self.word_starts.iter().filter(|s| **s).count()
    }
}

pub struct TokenDataset {
    samples: Vec<TokenSample>,
}

impl TokenDataset {
    pub fn new(samples: Vec<TokenSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<TokenSample> for TokenDataset {
    fn get(&self, index: usize) -> Option<TokenSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
