//! Latent semantic retrieval for Indonesian text.
//!
//! Documents go through [`tokenizer`], [`stopwords`] and [`stemmer`], are
//! counted against a [`vocab::Vocabulary`], weighted with TF-IDF and factored
//! into a low-rank topic space by [`lsi::TopicModel`]. [`SearchEngine`] ties
//! the stages together and owns the fitted [`Snapshot`].

pub mod analyzer;
pub mod config;
pub mod engine;
pub mod error;
pub mod lsi;
pub mod persist;
pub mod source;
pub mod stemmer;
pub mod stopwords;
pub mod tokenizer;
pub mod vocab;
pub mod weighting;

pub use analyzer::Analyzer;
pub use config::EngineConfig;
pub use engine::{Explanation, SearchEngine, SearchHit, Snapshot};
pub use error::{Error, Result};
pub use source::{BatchOutcome, DirectorySource, Document, DocumentSource, ItemOutcome, SkipReason};
pub use vocab::{TermId, Vocabulary};
