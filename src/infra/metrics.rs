// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Two records of a training run, both next to the checkpoints:
//
//   metrics.csv  — one row per epoch, appended as training runs
//   results.json — the final entity-level scores on the test split
//
// Example CSV output:
//   epoch,train_loss,test_loss,token_acc
//   1,1.204500,0.989200,0.712000
//   2,0.690100,0.654300,0.843000
//   ...
//
// test_loss and token_acc are computed over every sub-word piece
// that carries a label, trailing pieces included, so they move
// faster than the entity-level F1 in results.json.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::eval::ClassificationReport;

const CSV_HEADER: &str = "epoch,train_loss,test_loss,token_acc";
const RESULTS:    &str = "results.json";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Average masked cross-entropy over all training batches
    pub train_loss: f64,

    /// Average masked cross-entropy on the test split.
    /// NaN when the split is empty.
    pub test_loss: f64,

    /// Fraction of labelled pieces whose argmax matches the gold id
    pub token_acc: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, test_loss: f64, token_acc: f64) -> Self {
        Self { epoch, train_loss, test_loss, token_acc }
    }

    /// Returns true if this epoch improved over the previous best test_loss
    pub fn is_improvement(&self, best_test_loss: f64) -> bool {
        self.test_loss < best_test_loss
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet, so
    /// repeated runs in one directory append to the same log.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "{CSV_HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6}",
            m.epoch, m.train_loss, m.test_loss, m.token_acc,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, test_loss={:.4}",
            m.epoch, m.train_loss, m.test_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

/// Final scores of a run on the test split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub precision:      f64,
    pub recall:         f64,
    pub f1:             f64,
    pub token_accuracy: f64,
    pub train_size:     usize,
    pub test_size:      usize,
}

impl RunSummary {
    pub fn new(report: &ClassificationReport, token_accuracy: f64, train_size: usize, test_size: usize) -> Self {
        Self {
            precision: report.precision(),
            recall:    report.recall(),
            f1:        report.f1(),
            token_accuracy,
            train_size,
            test_size,
        }
    }

    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(RESULTS);
        fs::write(&path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::info!("Results written to '{}'", path.display());
        Ok(path)
    }
}
