use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_NUM_TOPICS: usize = 15;
pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_STOPWORDS_PATH: &str = "data/tala-stopwords-indonesia.txt";

/// Settings shared by the indexer and the server.
///
/// `num_topics` is only an upper bound: fitting clamps it to what the corpus
/// can support.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub num_topics: usize,
    pub top_n: usize,
    pub stopwords_path: PathBuf,
    pub snippet_chars: usize,
    /// Preprocess documents on the rayon pool during fit.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            num_topics: DEFAULT_NUM_TOPICS,
            top_n: DEFAULT_TOP_N,
            stopwords_path: PathBuf::from(DEFAULT_STOPWORDS_PATH),
            snippet_chars: 200,
            parallel: true,
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file; missing keys take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let buf = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_str(&buf).map_err(|source| Error::Json { path: path.to_path_buf(), source })
    }
}
