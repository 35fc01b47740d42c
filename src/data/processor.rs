// ============================================================
// Layer 4 — Token Classification Processor
// ============================================================
// Turns word-level sentences into fixed-length model inputs and
// aligns the word labels with the sub-word pieces.
//
// Layout of every sample (max_len = 10 in this example):
//
//   words:    Johanson          lives   in   Oslo
//   pieces:   [CLS] Johan ##son lives   in   Oslo  [SEP] [PAD] [PAD] [PAD]
//   labels:    -    I-PER  X    O       O    I-LOC  -     -     -     -
//   loss:      0    1      1    1       1    1      0     0     0     0
//   start:     -    y      n    y       y    y      -     -     -     -
//
// The first piece of a word carries the word's label, trailing
// pieces carry the trailing tag ("X"). Special tokens and
// padding are excluded from the loss. Only word-start positions
// are read back at prediction time.
//
// Sentences with more than max_len - 2 pieces are truncated at a
// word boundary: the first word whose pieces do not all fit is
// dropped along with every word after it.

use anyhow::{anyhow, bail, Result};
use tokenizers::Tokenizer;

use crate::data::dataset::TokenSample;
use crate::domain::label_map::LabelMap;
use crate::domain::sentence::TaggedSentence;

/// Special-token names tried in order (BERT style, then RoBERTa style).
const CLS_NAMES: [&str; 2] = ["[CLS]", "<s>"];
const SEP_NAMES: [&str; 2] = ["[SEP]", "</s>"];
const PAD_NAMES: [&str; 2] = ["[PAD]", "<pad>"];
const UNK_NAMES: [&str; 2] = ["[UNK]", "<unk>"];

pub struct TokenClassificationProcessor {
    tokenizer: Tokenizer,
    max_len:   usize,
    cls_id:    u32,
    sep_id:    u32,
    pad_id:    u32,
    unk_id:    u32,
}

impl TokenClassificationProcessor {
    pub fn new(tokenizer: Tokenizer, max_len: usize) -> Result<Self> {
        if max_len < 3 {
            bail!("max_len must leave room for [CLS], [SEP] and one piece (got {max_len})");
        }
        let cls_id = special_id(&tokenizer, &CLS_NAMES)?;
        let sep_id = special_id(&tokenizer, &SEP_NAMES)?;
        let pad_id = special_id(&tokenizer, &PAD_NAMES)?;
        let unk_id = special_id(&tokenizer, &UNK_NAMES)?;
        Ok(Self { tokenizer, max_len, cls_id, sep_id, pad_id, unk_id })
    }

    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }

    /// Encode labelled sentences for training or evaluation.
    pub fn preprocess(
        &self,
        sentences: &[TaggedSentence],
        label_map: &LabelMap,
    ) -> Result<Vec<TokenSample>> {
        sentences
            .iter()
            .map(|s| {
                let label_ids = s
                    .labels
                    .iter()
                    .map(|l| label_map.id_of(l))
                    .collect::<Result<Vec<_>>>()?;
                self.encode(&s.tokens, Some((label_ids.as_slice(), label_map.trailing_id())))
            })
            .collect()
    }

    /// Encode unlabelled words for prediction.
    pub fn encode_words(&self, words: &[String]) -> Result<TokenSample> {
        self.encode(words, None)
    }

    /// Sub-word pieces of each word, in word order.
    fn word_pieces(&self, words: &[String]) -> Result<Vec<Vec<u32>>> {
        let mut pieces = vec![Vec::new(); words.len()];
        if words.is_empty() {
            return Ok(pieces);
        }

        let encoding = self
            .tokenizer
            .encode(words, false)
            .map_err(|e| anyhow!("Tokenisation error: {e}"))?;

        for (id, word) in encoding.get_ids().iter().zip(encoding.get_word_ids()) {
            if let Some(w) = word {
                if let Some(p) = pieces.get_mut(*w as usize) {
                    p.push(*id);
                }
            }
        }
        for p in pieces.iter_mut().filter(|p| p.is_empty()) {
            p.push(self.unk_id);
        }
        Ok(pieces)
    }

    fn encode(&self, words: &[String], labels: Option<(&[u32], u32)>) -> Result<TokenSample> {
        let pieces   = self.word_pieces(words)?;
        let capacity = self.max_len - 1; // room for [SEP]

        let mut input_ids   = vec![self.cls_id];
        let mut label_ids   = vec![0u32];
        let mut loss_mask   = vec![0u32];
        let mut word_starts = vec![false];

        for (w, word_pieces) in pieces.iter().enumerate() {
            if input_ids.len() + word_pieces.len() > capacity {
                break;
            }
            for (j, &piece) in word_pieces.iter().enumerate() {
                let label = match labels {
                    Some((ids, _)) if j == 0 => ids[w],
                    Some((_, trailing))      => trailing,
                    None                     => 0,
                };
                input_ids.push(piece);
                label_ids.push(label);
                loss_mask.push(u32::from(labels.is_some()));
                word_starts.push(j == 0);
            }
        }

        input_ids.push(self.sep_id);
        label_ids.push(0);
        loss_mask.push(0);
        word_starts.push(false);

        let seq_len            = input_ids.len();
        let mut attention_mask = vec![1u32; seq_len];

        input_ids.resize(self.max_len, self.pad_id);
        attention_mask.resize(self.max_len, 0);
        label_ids.resize(self.max_len, 0);
        loss_mask.resize(self.max_len, 0);
        word_starts.resize(self.max_len, false);

        Ok(TokenSample { input_ids, attention_mask, label_ids, loss_mask, word_starts })
    }
}

fn special_id(tokenizer: &Tokenizer, names: &[&str]) -> Result<u32> {
    names
        .iter()
        .find_map(|n| tokenizer.token_to_id(n))
        .ok_or_else(|| anyhow!("Tokenizer has none of the special tokens {names:?}"))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{sentence, wordpiece_tokenizer};

    fn label_map(sentences: &[TaggedSentence]) -> LabelMap {
        LabelMap::from_label_lists(sentences.iter().map(|s| &s.labels), "X")
    }

    #[test]
    fn test_trailing_pieces_get_trailing_tag() {
        let s     = vec![sentence("Johanson lives in Oslo", "I-PER O O I-LOC")];
        let map   = label_map(&s);
        let proc  = TokenClassificationProcessor::new(wordpiece_tokenizer(), 10).unwrap();
        let out   = &proc.preprocess(&s, &map).unwrap()[0];

        assert_eq!(out.input_ids, vec![2, 4, 5, 6, 7, 8, 3, 0, 0, 0]);
        assert_eq!(out.attention_mask, vec![1, 1, 1, 1, 1, 1, 1, 0, 0, 0]);
        assert_eq!(out.loss_mask, vec![0, 1, 1, 1, 1, 1, 0, 0, 0, 0]);

        let per = map.id_of("I-PER").unwrap();
        let o   = map.id_of("O").unwrap();
        let loc = map.id_of("I-LOC").unwrap();
        assert_eq!(&out.label_ids[1..6], &[per, map.trailing_id(), o, o, loc]);
        assert_eq!(out.word_count(), 4);
    }

    #[test]
    fn test_truncation_drops_whole_words() {
        let s    = vec![sentence("lives Johanson Oslo", "O I-PER I-LOC")];
        let map  = label_map(&s);
        // Room for 3 pieces: "lives", "Johan", "##son".
        let proc = TokenClassificationProcessor::new(wordpiece_tokenizer(), 5).unwrap();
        let out  = &proc.preprocess(&s, &map).unwrap()[0];

        assert_eq!(out.input_ids, vec![2, 6, 4, 5, 3]);
        assert_eq!(out.word_count(), 2);
    }

    #[test]
    fn test_word_split_by_limit_is_dropped_with_its_first_piece() {
        let s    = vec![sentence("lives in Johanson", "O O I-PER")];
        let map  = label_map(&s);
        // "Johan" would fit, "##son" would not.
        let proc = TokenClassificationProcessor::new(wordpiece_tokenizer(), 5).unwrap();
        let out  = &proc.preprocess(&s, &map).unwrap()[0];

        assert_eq!(out.input_ids, vec![2, 6, 7, 3, 0]);
        assert_eq!(out.loss_mask, vec![0, 1, 1, 0, 0]);
        assert_eq!(out.word_count(), 2);
        assert!(!out.label_ids.contains(&map.trailing_id()));
    }

    #[test]
    fn test_unknown_word_becomes_single_unk_piece() {
        let proc = TokenClassificationProcessor::new(wordpiece_tokenizer(), 6).unwrap();
        let out  = proc.encode_words(&["Zzyzx".to_string(), "in".to_string()]).unwrap();
        assert_eq!(out.input_ids, vec![2, 1, 7, 3, 0, 0]);
        assert_eq!(out.word_count(), 2);
        assert!(out.loss_mask.iter().all(|&m| m == 0));
    }

    #[test]
    fn test_empty_sentence_is_cls_sep_only() {
        let proc = TokenClassificationProcessor::new(wordpiece_tokenizer(), 4).unwrap();
        let out  = proc.encode_words(&[]).unwrap();
        assert_eq!(out.input_ids, vec![2, 3, 0, 0]);
        assert_eq!(out.word_count(), 0);
    }

    #[test]
    fn test_unknown_label_is_error() {
        let train = vec![sentence("Oslo", "I-LOC")];
        let map   = label_map(&train);
        let proc  = TokenClassificationProcessor::new(wordpiece_tokenizer(), 8).unwrap();
        assert!(proc.preprocess(&[sentence("Oslo", "B-LOC")], &map).is_err());
    }

    #[test]
    fn test_max_len_too_small() {
        assert!(TokenClassificationProcessor::new(wordpiece_tokenizer(), 2).is_err());
    }
}
