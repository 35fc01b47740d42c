// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Decides which tokenizer a run uses and keeps a copy of it in
// the checkpoint directory so evaluation and prediction see the
// exact same vocabulary as training.
//
// Three sources, in priority order:
//   1. An explicit tokenizer file (e.g. a HuggingFace
//      `tokenizer.json` for bert-base-cased)
//   2. `tokenizer.json` already present in the store directory
//   3. A word-level vocabulary built from the training words
//
// For (3) we write the tokenizer JSON by hand and load it back,
// bypassing the trainer API. Vocabulary entries are counted after
// the same BertNormalizer and Whitespace pre-tokenizer the JSON
// declares, so "北京" becomes "北", "京" and "U.S." becomes
// "U", ".", "S", "." on both sides.
//
// Reference: HuggingFace tokenizers JSON format

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use tokenizers::{
    normalizers::BertNormalizer, pre_tokenizers::whitespace::Whitespace, Normalizer,
    OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer, Tokenizer,
};

const TOKENIZER_FILE: &str = "tokenizer.json";

/// Special tokens of the built vocabulary, ids 0..=4.
const SPECIAL_TOKENS: [&str; 5] = ["[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]"];

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    /// Resolve the tokenizer for a training run and persist it.
    pub fn load_or_build(
        &self,
        explicit:      Option<&Path>,
        words:         &[&str],
        vocab_size:    usize,
        do_lower_case: bool,
    ) -> Result<Tokenizer> {
        let tokenizer = if let Some(path) = explicit {
            tracing::info!("Loading tokenizer from '{}'", path.display());
            load_file(path)?
        } else if self.path().exists() {
            tracing::info!("Loading existing tokenizer from disk");
            self.load()?
        } else {
            tracing::info!("Building new tokenizer (vocab_size={})", vocab_size);
            build_word_level(words, vocab_size, do_lower_case)?
        };
        self.save(&tokenizer)?;
        Ok(tokenizer)
    }

    /// Load a previously saved tokenizer from the store
    pub fn load(&self) -> Result<Tokenizer> {
        load_file(&self.path())
    }

    pub fn save(&self, tokenizer: &Tokenizer) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;
        let path = self.path();
        tokenizer
            .save(&path, true)
            .map_err(|e| anyhow!("Cannot write tokenizer to '{}': {e}", path.display()))
    }
}

fn load_file(path: &Path) -> Result<Tokenizer> {
    Tokenizer::from_file(path)
        .map_err(|e| anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e))
}

/// Run a word through the same normalizer and pre-tokenizer the
/// built tokenizer uses, returning the pieces it will look up.
fn normalized_pieces(
    word:       &str,
    normalizer: &BertNormalizer,
    whitespace: &Whitespace,
) -> Result<Vec<String>> {
    let mut pretok = PreTokenizedString::from(word);
    pretok
        .normalize(|n| normalizer.normalize(n))
        .map_err(|e| anyhow!("Cannot normalize '{word}': {e}"))?;
    whitespace
        .pre_tokenize(&mut pretok)
        .map_err(|e| anyhow!("Cannot pre-tokenize '{word}': {e}"))?;
    Ok(pretok
        .get_splits(OffsetReferential::Original, OffsetType::Byte)
        .into_iter()
        .map(|(piece, _, _)| piece.to_string())
        .collect())
}

/// Build a word-level tokenizer over the most frequent pieces.
pub fn build_word_level(words: &[&str], vocab_size: usize, do_lower_case: bool) -> Result<Tokenizer> {
    let normalizer = BertNormalizer::new(true, true, Some(false), do_lower_case);
    let whitespace = Whitespace::default();

    let mut freq: HashMap<String, usize> = HashMap::new();
    for word in words {
        for piece in normalized_pieces(word, &normalizer, &whitespace)? {
            *freq.entry(piece).or_insert(0) += 1;
        }
    }

    // Most frequent first; ties by piece so the vocabulary is deterministic.
    let mut pieces: Vec<(String, usize)> = freq.into_iter().collect();
    pieces.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    pieces.truncate(vocab_size.saturating_sub(SPECIAL_TOKENS.len()));

    let mut vocab = serde_json::Map::new();
    for (id, tok) in SPECIAL_TOKENS.iter().enumerate() {
        vocab.insert(tok.to_string(), serde_json::json!(id));
    }
    for (piece, _) in pieces {
        if !vocab.contains_key(&piece) {
            let id = vocab.len();
            vocab.insert(piece, serde_json::json!(id));
        }
    }
    let size = vocab.len();

    let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
        .iter()
        .enumerate()
        .map(|(id, tok)| serde_json::json!({
            "id": id, "content": tok, "single_word": false, "lstrip": false,
            "rstrip": false, "normalized": false, "special": true
        }))
        .collect();

    let tokenizer_json = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": added_tokens,
        "normalizer": {
            "type": "BertNormalizer",
            "clean_text": true,
            "handle_chinese_chars": true,
            "strip_accents": false,
            "lowercase": do_lower_case
        },
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": vocab,
            "unk_token": "[UNK]"
        }
    });

    let tokenizer: Tokenizer = serde_json::to_string(&tokenizer_json)?
        .parse()
        .map_err(|e| anyhow!("Cannot build tokenizer: {e}"))?;

    tracing::info!("Tokenizer built with {} entries", size);
    Ok(tokenizer)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_pieces_follow_normalizer_and_whitespace() {
        let normalizer = BertNormalizer::new(true, true, Some(false), false);
        let whitespace = Whitespace::default();
        let split = |w: &str| normalized_pieces(w, &normalizer, &whitespace).unwrap();
        assert_eq!(split("U.S."), vec!["U", ".", "S", "."]);
        assert_eq!(split("well-known"), vec!["well", "-", "known"]);
        assert_eq!(split("北京"), vec!["北", "京"]);
        assert_eq!(split("Paris"), vec!["Paris"]);
        assert!(split("").is_empty());
    }

    #[test]
    fn test_training_words_encode_without_unknowns() {
        let words = ["北京", "U.S.", "well-known", "Paris", "Café"];
        for lower in [false, true] {
            let tok = build_word_level(&words, 100, lower).unwrap();
            let unk = tok.token_to_id("[UNK]").unwrap();
            for word in words {
                let enc = tok.encode(word, false).unwrap();
                assert!(!enc.get_ids().is_empty(), "{word} produced no pieces");
                assert!(!enc.get_ids().contains(&unk), "{word} (lower={lower}) hit [UNK]");
            }
        }
    }

    #[test]
    fn test_built_vocab_keeps_case_and_specials() {
        let tok = build_word_level(&["Paris", "paris", "Paris"], 100, false).unwrap();
        assert_eq!(tok.token_to_id("[PAD]"), Some(0));
        assert_eq!(tok.token_to_id("[CLS]"), Some(2));
        assert_eq!(tok.token_to_id("Paris"), Some(5));
        assert!(tok.token_to_id("paris").is_some());
    }

    #[test]
    fn test_vocab_size_is_respected() {
        let words = ["a", "b", "c", "d", "a", "b", "a"];
        let tok   = build_word_level(&words, 7, false).unwrap();
        assert_eq!(tok.get_vocab_size(true), 7);
        assert_eq!(tok.token_to_id("a"), Some(5));
        assert_eq!(tok.token_to_id("b"), Some(6));
        assert_eq!(tok.token_to_id("c"), None);
    }

    #[test]
    fn test_lower_case_vocab_encodes_mixed_case() {
        let tok = build_word_level(&["Berlin"], 50, true).unwrap();
        let enc = tok.encode("BERLIN", false).unwrap();
        assert_eq!(enc.get_ids(), &[tok.token_to_id("berlin").unwrap()]);
    }

    #[test]
    fn test_store_round_trips_through_disk() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let built = store.load_or_build(None, &["Rome", "is"], 50, false).unwrap();
        let again = store.load().unwrap();
        assert_eq!(built.get_vocab(true), again.get_vocab(true));
    }
}
