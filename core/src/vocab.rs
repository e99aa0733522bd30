use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

pub type TermId = u32;

/// Sparse term id -> raw count for one document, ordered by id.
pub type BagOfWords = BTreeMap<TermId, u32>;

/// Bidirectional term <-> id mapping with per-term corpus statistics.
///
/// Ids are assigned in first-seen order while walking the documents in the
/// order given, so the same corpus always produces the same ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: Vec<String>,
    dictionary: HashMap<String, TermId>,
    /// Number of documents containing each term at least once.
    df: Vec<u32>,
    /// Total occurrences of each term across the corpus.
    cf: Vec<u64>,
    num_docs: u32,
}

impl Vocabulary {
    pub fn build<D, T>(documents: &[D]) -> Self
    where
        D: AsRef<[T]>,
        T: AsRef<str>,
    {
        let mut vocab = Vocabulary::default();
        for doc in documents {
            let mut seen_in_doc: HashSet<TermId> = HashSet::new();
            for term in doc.as_ref() {
                let tid = vocab.intern(term.as_ref());
                vocab.cf[tid as usize] += 1;
                if seen_in_doc.insert(tid) {
                    vocab.df[tid as usize] += 1;
                }
            }
        }
        vocab.num_docs = documents.len() as u32;
        vocab
    }

    fn intern(&mut self, term: &str) -> TermId {
        if let Some(&tid) = self.dictionary.get(term) {
            return tid;
        }
        let tid = self.terms.len() as TermId;
        self.terms.push(term.to_string());
        self.dictionary.insert(term.to_string(), tid);
        self.df.push(0);
        self.cf.push(0);
        tid
    }

    /// Count known terms; terms missing from the vocabulary are ignored.
    pub fn doc2bow<T: AsRef<str>>(&self, terms: &[T]) -> BagOfWords {
        let mut bow = BagOfWords::new();
        for term in terms {
            if let Some(&tid) = self.dictionary.get(term.as_ref()) {
                *bow.entry(tid).or_insert(0) += 1;
            }
        }
        bow
    }

    pub fn id(&self, term: &str) -> Option<TermId> {
        self.dictionary.get(term).copied()
    }

    pub fn term(&self, id: TermId) -> Option<&str> {
        self.terms.get(id as usize).map(String::as_str)
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn df(&self, id: TermId) -> u32 {
        self.df.get(id as usize).copied().unwrap_or(0)
    }

    pub fn cf(&self, id: TermId) -> u64 {
        self.cf.get(id as usize).copied().unwrap_or(0)
    }

    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Most frequent terms across the corpus, ties broken by first-seen order.
    pub fn most_common(&self, limit: usize) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(TermId, u64)> = self.cf.iter().enumerate().map(|(i, &c)| (i as TermId, c)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
            .into_iter()
            .take(limit)
            .map(|(tid, count)| (self.terms[tid as usize].as_str(), count))
            .collect()
    }

    /// Whether the parallel tables agree with each other.
    pub(crate) fn is_consistent(&self) -> bool {
        let n = self.terms.len();
        self.dictionary.len() == n
            && self.df.len() == n
            && self.cf.len() == n
            && self.terms.iter().enumerate().all(|(i, t)| self.dictionary.get(t) == Some(&(i as TermId)))
    }
}
