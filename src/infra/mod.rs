// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the checkpoint directory:
//
//   checkpoint.rs      — model weights (Burn CompactRecorder),
//                        run config, architecture and label map
//                        as JSON, so any later command can
//                        rebuild the exact model
//
//   tokenizer_store.rs — tokenizer.json persistence; builds a
//                        word-level vocabulary from the training
//                        split when no pretrained tokenizer is
//                        given
//
//   metrics.rs         — per-epoch CSV log and the final
//                        results.json
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Epoch metrics CSV and final results
pub mod metrics;
