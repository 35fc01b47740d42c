// Shared test fixtures for the data, ml and application layers.

use tokenizers::Tokenizer;

use crate::domain::sentence::TaggedSentence;

/// WordPiece tokenizer with a handful of pieces, so "Johanson"
/// really splits into "Johan" + "##son".
pub fn wordpiece_tokenizer() -> Tokenizer {
    let json = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "WhitespaceSplit" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordPiece",
            "unk_token": "[UNK]",
            "continuing_subword_prefix": "##",
            "max_input_chars_per_word": 100,
            "vocab": {
                "[PAD]": 0, "[UNK]": 1, "[CLS]": 2, "[SEP]": 3,
                "Johan": 4, "##son": 5, "lives": 6, "in": 7, "Oslo": 8
            }
        }
    });
    json.to_string().parse().expect("fixture tokenizer JSON is valid")
}

pub fn sentence(tokens: &str, labels: &str) -> TaggedSentence {
    TaggedSentence::new(
        tokens.split_whitespace().map(str::to_string).collect(),
        labels.split_whitespace().map(str::to_string).collect(),
    )
    .expect("fixture sentence lengths match")
}

/// Small repetitive corpus a tiny model can fit in a few steps.
pub fn toy_corpus() -> Vec<TaggedSentence> {
    let mut out = Vec::new();
    for _ in 0..8 {
        out.push(sentence("Johanson lives in Oslo", "I-PER O O I-LOC"));
        out.push(sentence("Oslo lives", "I-LOC O"));
    }
    out
}

/// Render sentences as a space-separated CoNLL file.
pub fn to_conll(sentences: &[TaggedSentence]) -> String {
    let mut out = String::from("-DOCSTART- O\n\n");
    for s in sentences {
        for (token, label) in s.tokens.iter().zip(&s.labels) {
            out.push_str(&format!("{token} {label}\n"));
        }
        out.push('\n');
    }
    out
}
