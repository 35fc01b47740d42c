// ============================================================
// Layer 4 — Train/Test Splitter
// ============================================================
// Randomly shuffles sentences and splits them into two sets:
//   - Training set: used to update model weights
//   - Test set:     held out, scored once training finishes
//
// Why shuffle before splitting?
//   CoNLL files are ordered by source document. Without
//   shuffling, the test set would only contain the last few
//   articles and their (possibly unusual) entity mix.
//
// A seed makes the split reproducible across runs; without one
// the thread RNG is used.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.
//
// Reference: rand crate documentation

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

fn shuffle<T>(items: &mut [T], seed: Option<u64>) {
    match seed {
        Some(seed) => items.shuffle(&mut StdRng::seed_from_u64(seed)),
        None       => items.shuffle(&mut rand::thread_rng()),
    }
}

/// Shuffle `samples` and split into (train, test).
///
/// The training set receives `round(len * (1 - test_fraction))`
/// items, clamped to the number available.
pub fn split_train_test<T>(
    mut samples:   Vec<T>,
    test_fraction: f64,
    seed:          Option<u64>,
) -> (Vec<T>, Vec<T>) {
    shuffle(&mut samples, seed);

    let total    = samples.len();
    let split_at = ((total as f64) * (1.0 - test_fraction)).round().max(0.0) as usize;
    let split_at = split_at.min(total);

    // split_off(n) removes elements [n..] from the Vec and returns them
    let test = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} test ({}% / {}%)",
        samples.len(),
        test.len(),
        (samples.len() * 100) / total.max(1),
        (test.len()    * 100) / total.max(1),
    );

    (samples, test)
}

/// Keep a random `fraction` of `samples` (for quick runs).
/// A fraction of 1.0 or more keeps everything, in original order.
pub fn subsample<T>(mut samples: Vec<T>, fraction: f64, seed: Option<u64>) -> Vec<T> {
    if fraction >= 1.0 {
        return samples;
    }
    shuffle(&mut samples, seed);
    let keep = ((samples.len() as f64) * fraction.max(0.0)).round() as usize;
    samples.truncate(keep);
    samples
}
