//! TF-IDF weighting of bag-of-words vectors.
//!
//! weight(t, d) = count(t, d) * log2(N / df(t)), then the whole vector is
//! scaled to unit length. A term present in every document gets idf 0 and
//! drops out of the vector.

use crate::vocab::{BagOfWords, TermId, Vocabulary};
use serde::{Deserialize, Serialize};

/// Sparse TF-IDF vector, entries ordered by term id with no zero weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightedVector {
    entries: Vec<(TermId, f64)>,
}

impl WeightedVector {
    pub fn iter(&self) -> impl Iterator<Item = (TermId, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn get(&self, id: TermId) -> Option<f64> {
        self.entries
            .binary_search_by_key(&id, |&(tid, _)| tid)
            .ok()
            .map(|i| self.entries[i].1)
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no known, discriminating term survived weighting.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dot product of two sparse vectors.
    pub fn dot(&self, other: &WeightedVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a, wa) = self.entries[i];
            let (b, wb) = other.entries[j];
            match a.cmp(&b) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += wa * wb;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Inverse document frequency, 0 for terms seen in no document.
pub fn idf(df: u32, num_docs: u32) -> f64 {
    if df == 0 || num_docs == 0 {
        0.0
    } else {
        (num_docs as f64 / df as f64).log2()
    }
}

/// Weight a document's raw counts against corpus statistics.
pub fn weight(bow: &BagOfWords, vocab: &Vocabulary) -> WeightedVector {
    let mut entries: Vec<(TermId, f64)> = bow
        .iter()
        .map(|(&tid, &count)| (tid, count as f64 * idf(vocab.df(tid), vocab.num_docs())))
        .filter(|&(_, w)| w != 0.0)
        .collect();
    let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for (_, w) in entries.iter_mut() {
            *w /= norm;
        }
    }
    WeightedVector { entries }
}
