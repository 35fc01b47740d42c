// ============================================================
// Entity-level classification report
// ============================================================
// An entity counts as correct only when both its type and its
// exact span match a gold entity. From those counts:
//
//   precision = correct / predicted
//   recall    = correct / gold
//   f1        = 2 * correct / (predicted + gold)
//
// Any ratio with a zero denominator is reported as 0.
//
// Per-type rows are followed by micro (pooled counts), macro
// (unweighted mean of rows) and weighted (mean of rows weighted
// by gold support) averages.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::eval::entities::{get_entities_nested, Entity};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Per entity type, sorted by type name
    pub classes:  Vec<(String, Scores)>,
    pub micro:    Scores,
    pub macro_:   Scores,
    pub weighted: Scores,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn scores(correct: usize, predicted: usize, gold: usize) -> Scores {
    Scores {
        precision: ratio(correct, predicted),
        recall:    ratio(correct, gold),
        f1:        ratio(2 * correct, predicted + gold),
        support:   gold,
    }
}

fn check_shapes<S: AsRef<str>>(y_true: &[Vec<S>], y_pred: &[Vec<S>]) -> Result<()> {
    if y_true.len() != y_pred.len() {
        bail!("{} gold sentences but {} predicted", y_true.len(), y_pred.len());
    }
    for (i, (t, p)) in y_true.iter().zip(y_pred).enumerate() {
        if t.len() != p.len() {
            bail!("sentence {i}: {} gold tags but {} predicted", t.len(), p.len());
        }
    }
    Ok(())
}

impl ClassificationReport {
    pub fn from_sequences<S: AsRef<str>>(y_true: &[Vec<S>], y_pred: &[Vec<S>]) -> Result<Self> {
        check_shapes(y_true, y_pred)?;

        let gold: HashSet<Entity> = get_entities_nested(y_true).into_iter().collect();
        let pred: HashSet<Entity> = get_entities_nested(y_pred).into_iter().collect();

        // kind → (correct, predicted, gold)
        let mut counts: BTreeMap<&str, (usize, usize, usize)> = BTreeMap::new();
        for e in &gold {
            counts.entry(e.kind.as_str()).or_default().2 += 1;
        }
        for e in &pred {
            let c = counts.entry(e.kind.as_str()).or_default();
            c.1 += 1;
            if gold.contains(e) {
                c.0 += 1;
            }
        }

        let classes: Vec<(String, Scores)> = counts
            .iter()
            .map(|(kind, &(c, p, g))| (kind.to_string(), scores(c, p, g)))
            .collect();

        let (c, p, g) = counts
            .values()
            .fold((0, 0, 0), |acc, v| (acc.0 + v.0, acc.1 + v.1, acc.2 + v.2));
        let micro = scores(c, p, g);

        let n = classes.len().max(1) as f64;
        let macro_ = Scores {
            precision: classes.iter().map(|(_, s)| s.precision).sum::<f64>() / n,
            recall:    classes.iter().map(|(_, s)| s.recall).sum::<f64>() / n,
            f1:        classes.iter().map(|(_, s)| s.f1).sum::<f64>() / n,
            support:   g,
        };

        let weight = |f: fn(&Scores) -> f64| {
            if g == 0 {
                0.0
            } else {
                classes.iter().map(|(_, s)| f(s) * s.support as f64).sum::<f64>() / g as f64
            }
        };
        let weighted = Scores {
            precision: weight(|s| s.precision),
            recall:    weight(|s| s.recall),
            f1:        weight(|s| s.f1),
            support:   g,
        };

        Ok(Self { classes, micro, macro_, weighted })
    }

    pub fn precision(&self) -> f64 { self.micro.precision }
    pub fn recall(&self) -> f64 { self.micro.recall }
    pub fn f1(&self) -> f64 { self.micro.f1 }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|(k, _)| k.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}\n",
            "", "precision", "recall", "f1-score", "support"
        )?;

        for (kind, s) in &self.classes {
            write_row(f, width, kind, s)?;
        }
        writeln!(f)?;
        write_row(f, width, "micro avg", &self.micro)?;
        write_row(f, width, "macro avg", &self.macro_)?;
        write_row(f, width, "weighted avg", &self.weighted)
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, width: usize, name: &str, s: &Scores) -> fmt::Result {
    writeln!(
        f,
        "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
        name, s.precision, s.recall, s.f1, s.support
    )
}

/// Fraction of word positions tagged exactly right.
pub fn token_accuracy<S: AsRef<str>>(y_true: &[Vec<S>], y_pred: &[Vec<S>]) -> Result<f64> {
    check_shapes(y_true, y_pred)?;
    let (mut hit, mut total) = (0usize, 0usize);
    for (t, p) in y_true.iter().zip(y_pred) {
        for (a, b) in t.iter().zip(p) {
            total += 1;
            if a.as_ref() == b.as_ref() {
                hit += 1;
            }
        }
    }
    Ok(ratio(hit, total))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn seqs(rows: &[&str]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_seqeval_reference_example() {
        // The example from the seqeval README.
        let y_true = seqs(&["O O O B-MISC I-MISC I-MISC O", "B-PER I-PER O"]);
        let y_pred = seqs(&["O O B-MISC I-MISC I-MISC I-MISC O", "B-PER I-PER O"]);
        let r = ClassificationReport::from_sequences(&y_true, &y_pred).unwrap();

        assert!(close(r.precision(), 0.5));
        assert!(close(r.recall(), 0.5));
        assert!(close(r.f1(), 0.5));

        let (kind, misc) = &r.classes[0];
        assert_eq!(kind, "MISC");
        assert!(close(misc.f1, 0.0));
        assert_eq!(misc.support, 1);
        assert!(close(r.macro_.f1, 0.5));
        assert!(close(r.weighted.f1, 0.5));
    }

    #[test]
    fn test_predicted_only_type_gets_zero_support_row() {
        let y_true = seqs(&["I-PER O"]);
        let y_pred = seqs(&["I-PER I-LOC"]);
        let r = ClassificationReport::from_sequences(&y_true, &y_pred).unwrap();

        assert_eq!(r.classes.len(), 2);
        let (kind, loc) = &r.classes[0];
        assert_eq!(kind, "LOC");
        assert_eq!(loc.support, 0);
        assert!(close(loc.recall, 0.0));
        assert!(close(r.precision(), 0.5));
        assert!(close(r.recall(), 1.0));
    }

    #[test]
    fn test_no_entities_anywhere_scores_zero() {
        let r = ClassificationReport::from_sequences(&seqs(&["O O"]), &seqs(&["O O"])).unwrap();
        assert!(r.classes.is_empty());
        assert!(close(r.f1(), 0.0));
        assert!(close(r.weighted.f1, 0.0));
    }

    #[test]
    fn test_shape_mismatch_is_error() {
        assert!(ClassificationReport::from_sequences(&seqs(&["O O"]), &seqs(&["O"])).is_err());
        assert!(ClassificationReport::from_sequences(&seqs(&["O"]), &seqs(&[])).is_err());
    }

    #[test]
    fn test_display_has_rows_and_averages() {
        let y = seqs(&["I-PER O I-LOC"]);
        let text = ClassificationReport::from_sequences(&y, &y).unwrap().to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("PER"));
        assert!(text.contains("weighted avg"));
        assert!(text.contains("1.00"));
    }

    #[test]
    fn test_token_accuracy() {
        let acc = token_accuracy(&seqs(&["O I-PER", "O"]), &seqs(&["O O", "O"])).unwrap();
        assert!(close(acc, 2.0 / 3.0));
    }
}
