//! Latent semantic indexing over TF-IDF document vectors.
//!
//! The term x document matrix A is factored as A ~ U_k S_k V_k^T by an
//! eigendecomposition of the smaller of the two Gram matrices (A^T A when
//! there are fewer documents than terms, A A^T otherwise). Documents and
//! queries are both mapped into topic space with the same projection U_k^T x,
//! so a document's coordinates are S_k times its row of V_k.

use crate::error::{Error, Result};
use crate::vocab::TermId;
use crate::weighting::WeightedVector;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Instant;

/// Singular values at or below this fraction of the largest are treated as zero.
///
/// Both routes recover sigma as the square root of a Gram eigenvalue, so
/// rounding of order eps * lambda_max surfaces as sqrt(eps) * sigma_max.
fn relative_cutoff(num_terms: usize, num_docs: usize) -> f64 {
    f64::EPSILON.sqrt() * num_terms.max(num_docs) as f64
}

/// A document and its cosine similarity to a query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ranked {
    pub index: usize,
    pub score: f64,
}

/// Fitted SVD artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicModel {
    /// terms x k
    term_topics: DMatrix<f64>,
    singular_values: DVector<f64>,
    /// documents x k
    doc_topics: DMatrix<f64>,
}

impl TopicModel {
    /// Factor the weighted corpus into `k` topics.
    ///
    /// `k` is clamped to `min(num_terms, documents.len())`.
    pub fn fit(documents: &[WeightedVector], num_terms: usize, k: usize) -> Result<Self> {
        if documents.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        if num_terms == 0 {
            return Err(Error::EmptyVocabulary { num_docs: documents.len() });
        }
        if k == 0 {
            return Err(Error::InvalidTopicCount);
        }
        let num_docs = documents.len();
        let k = k.min(num_terms).min(num_docs);
        let start = Instant::now();

        let cutoff = relative_cutoff(num_terms, num_docs);
        let (mut term_topics, sigmas) = if num_docs <= num_terms {
            left_vectors_via_doc_gram(documents, num_terms, k, cutoff)
        } else {
            left_vectors_via_term_gram(documents, num_terms, k, cutoff)
        };
        fix_signs(&mut term_topics);
        let singular_values = DVector::from_vec(sigmas);

        let mut doc_topics = DMatrix::zeros(num_docs, k);
        for (j, doc) in documents.iter().enumerate() {
            let coords = project(&term_topics, doc);
            doc_topics.row_mut(j).copy_from(&coords.transpose());
        }

        tracing::info!(
            num_docs,
            num_terms,
            k,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "fitted topic model"
        );
        Ok(Self { term_topics, singular_values, doc_topics })
    }

    pub fn num_topics(&self) -> usize {
        self.singular_values.len()
    }

    pub fn num_terms(&self) -> usize {
        self.term_topics.nrows()
    }

    pub fn num_docs(&self) -> usize {
        self.doc_topics.nrows()
    }

    pub fn term_topics(&self) -> &DMatrix<f64> {
        &self.term_topics
    }

    pub fn singular_values(&self) -> &DVector<f64> {
        &self.singular_values
    }

    pub fn doc_topics(&self) -> &DMatrix<f64> {
        &self.doc_topics
    }

    /// Map a weighted query into topic space. Ids outside the model are ignored.
    pub fn project_query(&self, query: &WeightedVector) -> DVector<f64> {
        project(&self.term_topics, query)
    }

    /// Cosine-rank every document against `query`, best first.
    ///
    /// Ties keep corpus order. A zero query scores 0 against every document.
    pub fn rank(&self, query: &DVector<f64>, top_n: usize) -> Vec<Ranked> {
        let mut ranked: Vec<Ranked> = self
            .doc_topics
            .row_iter()
            .enumerate()
            .map(|(index, row)| Ranked { index, score: cosine(query, &row.transpose()) })
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
        ranked.truncate(top_n);
        ranked
    }

    /// Check that the matrices agree on k and on the expected row counts.
    pub(crate) fn check_shape(&self, num_terms: usize, num_docs: usize) -> Result<()> {
        let k = self.num_topics();
        if self.term_topics.shape() != (num_terms, k) {
            return Err(Error::ArtifactMismatch(format!(
                "term-topic matrix is {:?}, expected ({num_terms}, {k})",
                self.term_topics.shape()
            )));
        }
        if self.doc_topics.shape() != (num_docs, k) {
            return Err(Error::ArtifactMismatch(format!(
                "document-topic matrix is {:?}, expected ({num_docs}, {k})",
                self.doc_topics.shape()
            )));
        }
        Ok(())
    }
}

fn project(term_topics: &DMatrix<f64>, v: &WeightedVector) -> DVector<f64> {
    let mut out = DVector::zeros(term_topics.ncols());
    for (tid, w) in v.iter() {
        let row = tid as usize;
        if row < term_topics.nrows() {
            out += term_topics.row(row).transpose() * w;
        }
    }
    out
}

/// Cosine similarity, defined as 0 when either side is the zero vector.
pub fn cosine(a: &DVector<f64>, b: &DVector<f64>) -> f64 {
    let (na, nb) = (a.norm(), b.norm());
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        a.dot(b) / (na * nb)
    }
}

/// Eigen-pairs of a symmetric matrix, largest eigenvalue first.
fn top_eigenpairs(gram: DMatrix<f64>, k: usize) -> Vec<(f64, DVector<f64>)> {
    let eig = gram.symmetric_eigen();
    let mut order: Vec<usize> = (0..eig.eigenvalues.len()).collect();
    order.sort_by(|&a, &b| {
        eig.eigenvalues[b]
            .partial_cmp(&eig.eigenvalues[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    order
        .into_iter()
        .take(k)
        .map(|i| (eig.eigenvalues[i].max(0.0), eig.eigenvectors.column(i).clone_owned()))
        .collect()
}

/// A^T A route: right singular vectors first, then u = A v / sigma.
fn left_vectors_via_doc_gram(
    documents: &[WeightedVector],
    num_terms: usize,
    k: usize,
    cutoff: f64,
) -> (DMatrix<f64>, Vec<f64>) {
    let n = documents.len();
    let mut gram = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in i..n {
            let d = documents[i].dot(&documents[j]);
            gram[(i, j)] = d;
            gram[(j, i)] = d;
        }
    }
    let pairs = top_eigenpairs(gram, k);
    let sigma_max = pairs.first().map_or(0.0, |(l, _)| l.sqrt());

    let mut u = DMatrix::zeros(num_terms, k);
    let mut sigmas = vec![0.0; k];
    for (c, (lambda, v)) in pairs.iter().enumerate() {
        let sigma = lambda.sqrt();
        if sigma == 0.0 || sigma <= sigma_max * cutoff {
            continue;
        }
        for (j, doc) in documents.iter().enumerate() {
            let vj = v[j];
            for (tid, w) in doc.iter() {
                u[(tid as usize, c)] += w * vj;
            }
        }
        u.column_mut(c).scale_mut(1.0 / sigma);
        sigmas[c] = sigma;
    }
    (u, sigmas)
}

/// A A^T route: the eigenvectors are the left singular vectors directly.
fn left_vectors_via_term_gram(
    documents: &[WeightedVector],
    num_terms: usize,
    k: usize,
    cutoff: f64,
) -> (DMatrix<f64>, Vec<f64>) {
    let mut gram = DMatrix::zeros(num_terms, num_terms);
    for doc in documents {
        let entries: Vec<(TermId, f64)> = doc.iter().collect();
        for &(s, ws) in &entries {
            for &(t, wt) in &entries {
                gram[(s as usize, t as usize)] += ws * wt;
            }
        }
    }
    let pairs = top_eigenpairs(gram, k);
    let sigma_max = pairs.first().map_or(0.0, |(l, _)| l.sqrt());

    let mut u = DMatrix::zeros(num_terms, k);
    let mut sigmas = vec![0.0; k];
    for (c, (lambda, vec)) in pairs.iter().enumerate() {
        let sigma = lambda.sqrt();
        if sigma == 0.0 || sigma <= sigma_max * cutoff {
            continue;
        }
        u.set_column(c, vec);
        sigmas[c] = sigma;
    }
    (u, sigmas)
}

/// Flip each axis so its largest-magnitude term weight is positive.
///
/// Eigenvectors are only defined up to sign; this makes the stored model
/// independent of that choice.
fn fix_signs(u: &mut DMatrix<f64>) {
    for mut col in u.column_iter_mut() {
        let mut pivot = 0.0f64;
        for &x in col.iter() {
            if x.abs() > pivot.abs() {
                pivot = x;
            }
        }
        if pivot < 0.0 {
            col.neg_mut();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::Vocabulary;
    use crate::weighting::weight;

    fn weighted(corpus: &[Vec<&str>]) -> (Vocabulary, Vec<WeightedVector>) {
        let vocab = Vocabulary::build(corpus);
        let vectors = corpus.iter().map(|d| weight(&vocab.doc2bow(d), &vocab)).collect();
        (vocab, vectors)
    }

    fn corpus() -> Vec<Vec<&'static str>> {
        vec![
            vec!["bola", "gol", "pemain", "gol"],
            vec!["partai", "pemilu", "suara"],
            vec!["hujan", "angin", "cuaca", "hujan"],
            vec!["bola", "pemain", "latih"],
        ]
    }

    #[test]
    fn rejects_degenerate_input() {
        assert!(matches!(TopicModel::fit(&[], 3, 2), Err(Error::EmptyCorpus)));
        let docs = vec![WeightedVector::default()];
        assert!(matches!(TopicModel::fit(&docs, 0, 2), Err(Error::EmptyVocabulary { num_docs: 1 })));
        let (vocab, vectors) = weighted(&corpus());
        assert!(matches!(TopicModel::fit(&vectors, vocab.len(), 0), Err(Error::InvalidTopicCount)));
    }

    #[test]
    fn clamps_topic_count() {
        let (vocab, vectors) = weighted(&corpus());
        let model = TopicModel::fit(&vectors, vocab.len(), 50).unwrap();
        assert_eq!(model.num_topics(), 4);
        assert_eq!(model.term_topics().shape(), (vocab.len(), 4));
        assert_eq!(model.doc_topics().shape(), (4, 4));
    }

    #[test]
    fn topic_axes_are_orthonormal() {
        let (vocab, vectors) = weighted(&corpus());
        let model = TopicModel::fit(&vectors, vocab.len(), 3).unwrap();
        let gram = model.term_topics().transpose() * model.term_topics();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((gram[(i, j)] - expected).abs() < 1e-9, "({i},{j}) = {}", gram[(i, j)]);
            }
        }
    }

    #[test]
    fn singular_values_descend() {
        let (vocab, vectors) = weighted(&corpus());
        let model = TopicModel::fit(&vectors, vocab.len(), 4).unwrap();
        let s = model.singular_values();
        for i in 1..s.len() {
            assert!(s[i - 1] >= s[i]);
        }
        assert!(s[0] > 0.0);
    }

    #[test]
    fn both_gram_routes_agree_on_ranking() {
        // more documents than terms forces the A A^T route
        let wide: Vec<Vec<&str>> = vec![
            vec!["bola", "gol"],
            vec!["bola"],
            vec!["hujan", "angin"],
            vec!["hujan"],
            vec!["gol", "gol", "bola"],
        ];
        let (vocab, vectors) = weighted(&wide);
        assert!(vectors.len() > vocab.len());
        let model = TopicModel::fit(&vectors, vocab.len(), 2).unwrap();
        let q = weight(&vocab.doc2bow(&["hujan"]), &vocab);
        let ranked = model.rank(&model.project_query(&q), 5);
        assert!(ranked[0].index == 2 || ranked[0].index == 3);
        assert!(ranked[0].score > 0.9);
    }

    #[test]
    fn duplicate_documents_leave_zero_axes() {
        let dup: Vec<Vec<&str>> = vec![
            vec!["bola", "gol"],
            vec!["bola", "gol"],
            vec!["hujan", "angin"],
            vec!["hujan", "angin"],
            vec!["partai"],
        ];
        let (vocab, vectors) = weighted(&dup);
        let model = TopicModel::fit(&vectors, vocab.len(), 15).unwrap();
        assert_eq!(model.num_topics(), 5);

        let s = model.singular_values();
        assert_eq!(s.iter().filter(|&&x| x > 0.0).count(), 3);
        let gram = model.term_topics().transpose() * model.term_topics();
        for i in 0..5 {
            if s[i] == 0.0 {
                assert!(model.term_topics().column(i).iter().all(|&x| x == 0.0));
            } else {
                assert!((gram[(i, i)] - 1.0).abs() < 1e-9, "axis {i} has norm {}", gram[(i, i)]);
            }
            for j in 0..5 {
                if i != j {
                    assert!(gram[(i, j)].abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn documents_rank_themselves_first() {
        let (vocab, vectors) = weighted(&corpus());
        let model = TopicModel::fit(&vectors, vocab.len(), 4).unwrap();
        for (i, v) in vectors.iter().enumerate() {
            let ranked = model.rank(&model.project_query(v), 1);
            assert_eq!(ranked[0].index, i);
            assert!((ranked[0].score - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_query_scores_zero_in_corpus_order() {
        let (vocab, vectors) = weighted(&corpus());
        let model = TopicModel::fit(&vectors, vocab.len(), 2).unwrap();
        let q = model.project_query(&WeightedVector::default());
        assert!(q.iter().all(|&x| x == 0.0));
        let ranked = model.rank(&q, 10);
        assert_eq!(ranked.iter().map(|r| r.index).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert!(ranked.iter().all(|r| r.score == 0.0));
    }

    #[test]
    fn fitting_is_deterministic() {
        let (vocab, vectors) = weighted(&corpus());
        let a = TopicModel::fit(&vectors, vocab.len(), 3).unwrap();
        let b = TopicModel::fit(&vectors, vocab.len(), 3).unwrap();
        assert_eq!(a, b);
    }
}
