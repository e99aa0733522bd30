use crate::stemmer::stem;
use crate::stopwords::StopwordList;
use crate::tokenizer::tokenize;
use rayon::prelude::*;

/// Text processing shared by indexing and querying: tokenize, drop stopwords, stem.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    stopwords: StopwordList,
}

impl Analyzer {
    pub fn new(stopwords: StopwordList) -> Self {
        Self { stopwords }
    }

    pub fn analyze(&self, text: &str) -> Vec<String> {
        let tokens = tokenize(text);
        self.stopwords.remove(tokens.iter()).into_iter().map(stem).collect()
    }

    /// Analyze many texts, optionally on the rayon pool. Output order always
    /// matches input order.
    pub fn analyze_all<T>(&self, texts: &[T], parallel: bool) -> Vec<Vec<String>>
    where
        T: AsRef<str> + Sync,
    {
        if parallel {
            texts.par_iter().map(|t| self.analyze(t.as_ref())).collect()
        } else {
            texts.iter().map(|t| self.analyze(t.as_ref())).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_filters_and_stems() {
        let analyzer = Analyzer::new(StopwordList::new(["yang", "di", "dan"]));
        let stems = analyzer.analyze("Pembangunan jalan yang DIRESMIKAN di Bandung, dan kesulitannya.");
        assert_eq!(stems, vec!["bangun", "jalan", "resmi", "bandung", "sulit"]);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let analyzer = Analyzer::default();
        let texts: Vec<String> = (0..64).map(|i| format!("dokumen {i} membahas pertandingan sepakbola")).collect();
        assert_eq!(analyzer.analyze_all(&texts, true), analyzer.analyze_all(&texts, false));
    }
}
