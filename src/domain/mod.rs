// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits describing what the system
// works with: tagged sentences and the label vocabulary.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A sentence with one entity tag per word
pub mod sentence;

// Bijection between tag strings and class ids
pub mod label_map;

// Core abstractions (traits) that other layers implement
pub mod traits;
