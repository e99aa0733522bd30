use crate::error::{Error, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Set of words dropped before stemming.
///
/// Matching is exact and case-sensitive; tokens are already lowercase when
/// they reach the filter.
#[derive(Debug, Clone, Default)]
pub struct StopwordList {
    words: HashSet<String>,
}

impl StopwordList {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { words: words.into_iter().map(Into::into).collect() }
    }

    /// Read one stopword per line, ignoring blank lines.
    pub fn from_reader<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let mut words = HashSet::new();
        for line in reader.lines() {
            let line = line?;
            let word = line.trim();
            if !word.is_empty() {
                words.insert(word.to_string());
            }
        }
        Ok(Self { words })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| Error::io(path, e))?;
        Self::from_reader(BufReader::new(f)).map_err(|e| Error::io(path, e))
    }

    /// Like [`load`](Self::load), but an unreadable file yields an empty list and a warning.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(list) => {
                tracing::info!(path = %path.display(), words = list.len(), "loaded stopwords");
                list
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "stopword list unavailable, no stopwords will be removed");
                Self::default()
            }
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    /// Drop stopwords from `tokens`, keeping the remaining tokens in order.
    pub fn remove<'a, I>(&self, tokens: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        tokens.into_iter().filter(|t| !self.contains(t)).collect()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
