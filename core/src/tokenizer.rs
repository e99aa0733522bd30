use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[a-z0-9]+").expect("valid regex");
}

/// Normalized text ready to be split into tokens.
///
/// Holds the lowercased buffer; `iter` can be called any
/// number of times and yields the same tokens each time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    buffer: String,
}

impl Tokens {
    /// Lazily yield every maximal `[a-z0-9]+` run in the buffer.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        RE.find_iter(&self.buffer).map(|m| m.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(str::to_owned).collect()
    }
}

impl<'a> IntoIterator for &'a Tokens {
    type Item = &'a str;
    type IntoIter = Box<dyn Iterator<Item = &'a str> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Tokenize text: lowercase, then split on anything outside `[a-z0-9]`.
///
/// Characters outside ASCII are separators even when they look like letters
/// or digits (ligatures, superscripts, fullwidth forms).
pub fn tokenize(text: &str) -> Tokens {
    if text.is_empty() {
        return Tokens::default();
    }
    Tokens { buffer: text.to_lowercase() }
}
