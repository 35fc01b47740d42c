// ============================================================
// Evaluation — NER metrics
// ============================================================
// Pure functions over tag sequences, no Burn types:
//
//   entities.rs — tag sequence → entity spans (seqeval rules)
//   report.rs   — entity-level precision / recall / F1 per type,
//                 micro / macro / weighted averages, and plain
//                 token accuracy
//
// Scores are entity-level: a prediction only counts when type
// and exact boundaries both match.

pub mod entities;
pub mod report;

pub use report::{token_accuracy, ClassificationReport};
