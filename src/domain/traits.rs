// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to these traits rather than to
// concrete loaders and models:
//   - ConllFile implements SentenceSource
//   - PredictUseCase implements TokenTagger
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::sentence::TaggedSentence;

// ─── SentenceSource ───────────────────────────────────────────────────────────
/// Any component that can produce labelled sentences.
pub trait SentenceSource {
    fn load_sentences(&self) -> Result<Vec<TaggedSentence>>;
}

// ─── TokenTagger ──────────────────────────────────────────────────────────────
/// Any component that assigns one entity tag per input word.
pub trait TokenTagger {
    /// Returns one tag per word. Words cut off by the model's
    /// maximum sequence length are not tagged, so the result may
    /// be shorter than `words`.
    fn tag(&self, words: &[String]) -> Result<Vec<String>>;
}
