// ============================================================
// Layer 4 — CoNLL Reader
// ============================================================
// Parses the line-oriented CoNLL format into TaggedSentences.
//
// Format:
//   -DOCSTART- O          ← document marker, skipped
//                         ← blank line = sentence boundary
//   John I-PER            ← token first, tag last
//   lives O
//   in O
//   Paris I-LOC
//
// Files with extra middle columns (POS, chunk tags as in
// CoNLL-2003) are accepted: the first field is the token and
// the last field is the tag.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::domain::sentence::TaggedSentence;
use crate::domain::traits::SentenceSource;

const DOCSTART: &str = "-DOCSTART-";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConllError {
    #[error("line {line}: expected `<token>{separator}<tag>`, found {found:?}")]
    MissingTag { line: usize, separator: String, found: String },
}

/// Parse CoNLL text. `separator` splits a line into fields; a
/// plain space is the common case. Runs of separators count as one.
pub fn parse_conll(text: &str, separator: &str) -> Result<Vec<TaggedSentence>, ConllError> {
    let mut sentences = Vec::new();
    let mut tokens    = Vec::new();
    let mut labels    = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r').trim();

        if line.is_empty() {
            flush(&mut sentences, &mut tokens, &mut labels);
            continue;
        }

        let fields: Vec<&str> = line
            .split(separator)
            .filter(|f| !f.is_empty())
            .collect();

        if fields.first() == Some(&DOCSTART) {
            flush(&mut sentences, &mut tokens, &mut labels);
            continue;
        }

        match (fields.first(), fields.last()) {
            (Some(token), Some(tag)) if fields.len() >= 2 => {
                tokens.push(token.to_string());
                labels.push(tag.to_string());
            }
            _ => {
                return Err(ConllError::MissingTag {
                    line:      idx + 1,
                    separator: separator.to_string(),
                    found:     line.to_string(),
                })
            }
        }
    }
    flush(&mut sentences, &mut tokens, &mut labels);

    Ok(sentences)
}

fn flush(out: &mut Vec<TaggedSentence>, tokens: &mut Vec<String>, labels: &mut Vec<String>) {
    if tokens.is_empty() {
        return;
    }
    // Lengths match by construction: every line pushes one of each.
    out.push(TaggedSentence {
        tokens: std::mem::take(tokens),
        labels: std::mem::take(labels),
    });
}

// ─── ConllFile ────────────────────────────────────────────────────────────────
/// A CoNLL file on disk.
pub struct ConllFile {
    path:      PathBuf,
    separator: String,
}

impl ConllFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), separator: " ".to_string() }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }
}

impl SentenceSource for ConllFile {
    fn load_sentences(&self) -> Result<Vec<TaggedSentence>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read CoNLL file '{}'", self.path.display()))?;

        let sentences = parse_conll(&text, &self.separator)
            .with_context(|| format!("Malformed CoNLL file '{}'", self.path.display()))?;

        let words: usize = sentences.iter().map(TaggedSentence::word_count).sum();
        tracing::info!(
            "Parsed {} sentences ({} words) from '{}'",
            sentences.len(),
            words,
            self.path.display()
        );
        Ok(sentences)
    }
}
