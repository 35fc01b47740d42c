// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from a remote CoNLL file all
// the way to tensor batches.
//
// The pipeline flows in this order:
//
//   dataset URL
//       │
//       ▼
//   DatasetDownloader  → fetches the file into a local cache
//       │
//       ▼
//   ConllFile          → parses lines into TaggedSentences
//       │
//       ▼
//   splitter           → shuffles, splits train/test, subsamples
//       │
//       ▼
//   Processor          → sub-word tokenisation + label alignment
//       │
//       ▼
//   TokenDataset       → implements Burn's Dataset trait
//       │
//       ▼
//   TokenBatcher       → stacks samples into tensor batches
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Fetches and caches the raw dataset file
pub mod download;

/// Parses CoNLL-format text into tagged sentences
pub mod conll;

/// Shuffles and splits data into train/test sets
pub mod splitter;

/// Aligns word labels with sub-word tokens
pub mod processor;

/// Implements Burn's Dataset trait for token samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

#[cfg(test)]
pub mod fixtures;
