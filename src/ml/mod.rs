// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Burn-specific code for the tagger:
//
//   model.rs      — transformer encoder + per-token linear
//                   classification head, masked cross-entropy
//
//   trainer.rs    — "fit": AdamW loop with a warmup/decay
//                   schedule, held-out loss and token accuracy
//                   each epoch, checkpoint per epoch
//
//   inferencer.rs — "predict": batched argmax, mapped back to one
//                   tag per word
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Devlin et al. (2019) BERT

/// Encoder and token-classification head
pub mod model;

/// Training loop with held-out evaluation and checkpointing
pub mod trainer;

/// Batched prediction mapped back to word-level tags
pub mod inferencer;
