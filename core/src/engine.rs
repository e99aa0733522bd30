//! Fit/search lifecycle.
//!
//! A fit produces an immutable [`Snapshot`]; the engine publishes it by
//! swapping an `Arc` under a short write lock. Searches clone the current
//! `Arc` and run without holding the lock, so a concurrent re-fit or reload
//! never exposes a half-built model.

use crate::analyzer::Analyzer;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::lsi::TopicModel;
use crate::persist::{self, ArtifactPaths};
use crate::source::Document;
use crate::stopwords::StopwordList;
use crate::vocab::Vocabulary;
use crate::weighting::{weight, WeightedVector};
use nalgebra::DVector;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Position of the document in the fitted corpus.
    pub index: usize,
    pub id: String,
    pub score: f64,
}

/// Intermediate values of a query, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub stems: Vec<String>,
    pub bag_of_words: Vec<(String, u32)>,
    pub weights: Vec<(String, f64)>,
    pub topic_vector: Vec<f64>,
    pub singular_values: Vec<f64>,
    pub hits: Vec<SearchHit>,
}

/// Everything produced by one fit: the corpus, its vocabulary and the topic model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    created_at: String,
    documents: Vec<Document>,
    vocabulary: Vocabulary,
    model: TopicModel,
}

impl Snapshot {
    /// Build from documents and their analyzed terms (same order, same length).
    pub fn build(documents: Vec<Document>, analyzed: &[Vec<String>], num_topics: usize) -> Result<Self> {
        if documents.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        debug_assert_eq!(documents.len(), analyzed.len());
        let vocabulary = Vocabulary::build(analyzed);
        if vocabulary.is_empty() {
            return Err(Error::EmptyVocabulary { num_docs: documents.len() });
        }
        let vectors: Vec<WeightedVector> = analyzed.iter().map(|terms| weight(&vocabulary.doc2bow(terms), &vocabulary)).collect();
        let model = TopicModel::fit(&vectors, vocabulary.len(), num_topics)?;
        let created_at = format_created_at(OffsetDateTime::now_utc());
        Ok(Self { created_at, documents, vocabulary, model })
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn model(&self) -> &TopicModel {
        &self.model
    }

    pub fn weigh(&self, stems: &[String]) -> WeightedVector {
        weight(&self.vocabulary.doc2bow(stems), &self.vocabulary)
    }

    pub fn query_vector(&self, stems: &[String]) -> DVector<f64> {
        self.model.project_query(&self.weigh(stems))
    }

    /// Rank the corpus against already-analyzed query terms.
    pub fn search(&self, stems: &[String], top_n: usize) -> Vec<SearchHit> {
        let q = self.query_vector(stems);
        self.model
            .rank(&q, top_n)
            .into_iter()
            .map(|r| SearchHit { index: r.index, id: self.documents[r.index].id.clone(), score: r.score })
            .collect()
    }

    pub fn explain(&self, stems: Vec<String>, top_n: usize) -> Explanation {
        let bow = self.vocabulary.doc2bow(&stems);
        let weighted = weight(&bow, &self.vocabulary);
        let topic_vector = self.model.project_query(&weighted);
        let term = |tid| self.vocabulary.term(tid).unwrap_or_default().to_string();
        let hits = self.search(&stems, top_n);
        Explanation {
            bag_of_words: bow.iter().map(|(&tid, &count)| (term(tid), count)).collect(),
            weights: weighted.iter().map(|(tid, w)| (term(tid), w)).collect(),
            topic_vector: topic_vector.iter().copied().collect(),
            singular_values: self.model.singular_values().iter().copied().collect(),
            stems,
            hits,
        }
    }

    /// Reject snapshots whose parts disagree, e.g. a corrupted or hand-edited artifact.
    pub fn validate(&self) -> Result<()> {
        if self.documents.is_empty() {
            return Err(Error::ArtifactMismatch("no documents".into()));
        }
        if !self.vocabulary.is_consistent() {
            return Err(Error::ArtifactMismatch("vocabulary tables disagree".into()));
        }
        if self.vocabulary.num_docs() as usize != self.documents.len() {
            return Err(Error::ArtifactMismatch(format!(
                "vocabulary counts {} documents, artifact holds {}",
                self.vocabulary.num_docs(),
                self.documents.len()
            )));
        }
        self.model.check_shape(self.vocabulary.len(), self.documents.len())
    }
}

/// RFC 3339, or unix seconds if the instant has no RFC 3339 form.
fn format_created_at(at: OffsetDateTime) -> String {
    match at.format(&Rfc3339) {
        Ok(s) => s,
        Err(err) => {
            tracing::warn!(error = %err, "fit time has no RFC 3339 form, storing unix seconds");
            at.unix_timestamp().to_string()
        }
    }
}

enum State {
    Unfitted,
    Fitted(Arc<Snapshot>),
}

/// Blocking fit/search entry point; share it behind an `Arc`.
pub struct SearchEngine {
    analyzer: Analyzer,
    config: EngineConfig,
    state: RwLock<State>,
}

impl SearchEngine {
    /// Engine with stopwords from `config.stopwords_path` (empty if unreadable).
    pub fn new(config: EngineConfig) -> Self {
        let stopwords = StopwordList::load_or_empty(&config.stopwords_path);
        Self::with_analyzer(Analyzer::new(stopwords), config)
    }

    pub fn with_analyzer(analyzer: Analyzer, config: EngineConfig) -> Self {
        Self { analyzer, config, state: RwLock::new(State::Unfitted) }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn is_fitted(&self) -> bool {
        matches!(*self.state.read(), State::Fitted(_))
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Result<Arc<Snapshot>> {
        match &*self.state.read() {
            State::Fitted(snapshot) => Ok(Arc::clone(snapshot)),
            State::Unfitted => Err(Error::NotFitted),
        }
    }

    /// Publish `snapshot`, replacing any previous one.
    pub fn install(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        *self.state.write() = State::Fitted(Arc::clone(&snapshot));
        snapshot
    }

    /// Fit a fresh model over `documents` in the given order and publish it.
    ///
    /// On error the previous snapshot, if any, stays in place.
    pub fn fit(&self, documents: Vec<Document>, num_topics: usize) -> Result<Arc<Snapshot>> {
        if documents.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let texts: Vec<&str> = documents.iter().map(|d| d.text.as_str()).collect();
        let analyzed = self.analyzer.analyze_all(&texts, self.config.parallel);
        let snapshot = Snapshot::build(documents, &analyzed, num_topics)?;
        tracing::info!(
            num_docs = snapshot.documents.len(),
            num_terms = snapshot.vocabulary.len(),
            num_topics = snapshot.model.num_topics(),
            "model fitted"
        );
        Ok(self.install(snapshot))
    }

    pub fn search(&self, query: &str, top_n: usize) -> Result<Vec<SearchHit>> {
        let snapshot = self.snapshot()?;
        let stems = self.analyzer.analyze(query);
        tracing::debug!(query, ?stems, "search");
        Ok(snapshot.search(&stems, top_n))
    }

    pub fn explain(&self, query: &str, top_n: usize) -> Result<Explanation> {
        let snapshot = self.snapshot()?;
        Ok(snapshot.explain(self.analyzer.analyze(query), top_n))
    }

    /// Most frequent stems in the fitted corpus.
    pub fn term_statistics(&self, limit: usize) -> Result<Vec<(String, u64)>> {
        let snapshot = self.snapshot()?;
        Ok(snapshot
            .vocabulary
            .most_common(limit)
            .into_iter()
            .map(|(term, count)| (term.to_string(), count))
            .collect())
    }

    /// Persist the current snapshot. A failed save leaves the in-memory model usable.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let snapshot = self.snapshot()?;
        persist::save_snapshot(&ArtifactPaths::new(path), &snapshot)
    }

    /// Load a snapshot from disk and publish it. On error the current state is kept.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Arc<Snapshot>> {
        let snapshot = persist::load_snapshot(&ArtifactPaths::new(path))?;
        Ok(self.install(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SearchEngine {
        let cfg = EngineConfig { parallel: false, ..EngineConfig::default() };
        SearchEngine::with_analyzer(Analyzer::new(StopwordList::new(["yang", "di", "dan", "ini"])), cfg)
    }

    fn docs() -> Vec<Document> {
        vec![
            Document::new("olahraga.txt", "Pemain sepakbola mencetak gol di pertandingan final liga"),
            Document::new("politik.txt", "Partai politik berkampanye menjelang pemilu presiden dan legislatif"),
            Document::new("cuaca.txt", "Hujan deras dan angin kencang melanda kota, cuaca ekstrem berlanjut"),
        ]
    }

    #[test]
    fn search_before_fit_fails() {
        let e = engine();
        assert!(!e.is_fitted());
        assert!(matches!(e.search("gol", 10), Err(Error::NotFitted)));
        assert!(matches!(e.term_statistics(5), Err(Error::NotFitted)));
    }

    #[test]
    fn empty_corpus_is_rejected_and_keeps_state() {
        let e = engine();
        assert!(matches!(e.fit(vec![], 3), Err(Error::EmptyCorpus)));
        e.fit(docs(), 3).unwrap();
        assert!(matches!(e.fit(vec![Document::new("x", "yang di dan")], 3), Err(Error::EmptyVocabulary { num_docs: 1 })));
        assert_eq!(e.snapshot().unwrap().documents().len(), 3);
    }

    #[test]
    fn refit_replaces_snapshot_but_old_handle_stays_valid() {
        let e = engine();
        let first = e.fit(docs(), 3).unwrap();
        let second = e.fit(docs()[..2].to_vec(), 3).unwrap();
        assert_eq!(first.documents().len(), 3);
        assert_eq!(second.documents().len(), 2);
        assert_eq!(e.snapshot().unwrap().documents().len(), 2);
        assert_eq!(first.search(&["gol".to_string()], 3).len(), 3);
    }

    #[test]
    fn explain_reports_each_stage() {
        let e = engine();
        e.fit(docs(), 3).unwrap();
        let ex = e.explain("gol gol hujan salju", 2).unwrap();
        assert_eq!(ex.stems, vec!["gol", "gol", "hujan", "salju"]);
        assert_eq!(ex.bag_of_words, vec![("gol".to_string(), 2), ("hujan".to_string(), 1)]);
        assert_eq!(ex.weights.len(), 2);
        assert_eq!(ex.topic_vector.len(), 3);
        assert_eq!(ex.singular_values.len(), 3);
        assert_eq!(ex.hits.len(), 2);
    }

    #[test]
    fn created_at_falls_back_to_unix_seconds() {
        use time::macros::datetime;
        assert_eq!(format_created_at(datetime!(2024-01-01 0:00 UTC)), "2024-01-01T00:00:00Z");
        // RFC 3339 offsets cannot carry seconds
        let odd = datetime!(2024-01-01 0:00 +01:00:30);
        assert_eq!(format_created_at(odd), odd.unix_timestamp().to_string());
    }

    #[test]
    fn term_statistics_counts_stems() {
        let e = engine();
        e.fit(vec![Document::new("a", "hujan hujan angin"), Document::new("b", "hujan petir")], 2).unwrap();
        let stats = e.term_statistics(2).unwrap();
        assert_eq!(stats, vec![("hujan".to_string(), 3), ("angin".to_string(), 1)]);
    }
}
