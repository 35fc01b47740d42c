// ============================================================
// Layer 3 — Label Map
// ============================================================
// The model predicts integer class ids, the dataset speaks in
// string tags. LabelMap is the bijection between the two.
//
// Ids are assigned to the sorted set of tags seen in the data,
// so the same corpus always produces the same mapping. The
// trailing-piece tag ("X" by default) is appended last: it
// labels the 2nd, 3rd, ... sub-word pieces of a word and never
// appears in the CoNLL file itself.
//
// Example for WikiGold:
//   I-LOC=0  I-MISC=1  I-ORG=2  I-PER=3  O=4  X=5

use std::collections::BTreeSet;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMap {
    /// Index = class id
    labels: Vec<String>,
    trailing_tag: String,
}

impl LabelMap {
    /// Build the map from every label sequence in the corpus.
    pub fn from_label_lists<'a, I, S>(label_lists: I, trailing_tag: &str) -> Self
    where
        I: IntoIterator<Item = &'a S>,
        S: AsRef<[String]> + 'a + ?Sized,
    {
        let mut set: BTreeSet<&str> = BTreeSet::new();
        for labels in label_lists {
            set.extend(labels.as_ref().iter().map(String::as_str));
        }
        let mut labels: Vec<String> = set
            .into_iter()
            .filter(|l| *l != trailing_tag)
            .map(str::to_string)
            .collect();
        labels.push(trailing_tag.to_string());

        Self { labels, trailing_tag: trailing_tag.to_string() }
    }

    pub fn id_of(&self, label: &str) -> Result<u32> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| i as u32)
            .ok_or_else(|| anyhow!("label '{label}' is not in the label map"))
    }

    pub fn label_of(&self, id: u32) -> Option<&str> {
        self.labels.get(id as usize).map(String::as_str)
    }

    pub fn trailing_id(&self) -> u32 {
        // Always the last entry, see from_label_lists.
        (self.labels.len() - 1) as u32
    }

    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn tags(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_labels_sorted_with_trailing_tag_last() {
        let lists = vec![tags("O I-PER O"), tags("I-LOC O I-ORG")];
        let map   = LabelMap::from_label_lists(&lists, "X");
        assert_eq!(map.labels(), &tags("I-LOC I-ORG I-PER O X")[..]);
        assert_eq!(map.trailing_id(), 4);
        assert_eq!(map.id_of("O").unwrap(), 3);
        assert_eq!(map.label_of(0), Some("I-LOC"));
    }

    #[test]
    fn test_trailing_tag_not_duplicated() {
        let lists = vec![tags("X O")];
        let map   = LabelMap::from_label_lists(&lists, "X");
        assert_eq!(map.num_labels(), 2);
        assert_eq!(map.label_of(map.trailing_id()), Some("X"));
    }

    #[test]
    fn test_unknown_label_is_error() {
        let map = LabelMap::from_label_lists(&vec![tags("O")], "X");
        assert!(map.id_of("B-PER").is_err());
        assert_eq!(map.label_of(99), None);
    }
}
