// ============================================================
// Layer 3 — TaggedSentence Domain Type
// ============================================================
// One sentence from a CoNLL file: the words in order and the
// entity tag attached to each word.
//
// Example:
//   tokens: ["John", "lives", "in", "New", "York"]
//   labels: ["I-PER", "O",    "O",  "I-LOC", "I-LOC"]
//
// The two vectors are always the same length — every word has
// exactly one tag. The constructor enforces this.
//
// Reference: Rust Book §5 (Structs)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// A sentence with one label per word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedSentence {
    /// Words as they appear in the source file
    pub tokens: Vec<String>,

    /// Entity tag for each word, e.g. "I-PER" or "O"
    pub labels: Vec<String>,
}

impl TaggedSentence {
    /// Create a sentence, rejecting token/label count mismatches.
    pub fn new(tokens: Vec<String>, labels: Vec<String>) -> Result<Self> {
        if tokens.len() != labels.len() {
            bail!(
                "sentence has {} tokens but {} labels",
                tokens.len(),
                labels.len()
            );
        }
        Ok(Self { tokens, labels })
    }

    /// Number of words in the sentence
    pub fn word_count(&self) -> usize {
        self.tokens.len()
    }
}
