// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal each:
// train a tagger, score a saved one, or tag new text.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern

// Download → split → fit → score → record
pub mod train_use_case;

// Score a checkpoint on a labelled CoNLL file
pub mod evaluate_use_case;

// Tag free text with a checkpoint
pub mod predict_use_case;
