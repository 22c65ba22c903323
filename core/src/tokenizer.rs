use crate::index::Position;
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use std::io;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<String> = {
        let words: &[&str] = &[
            "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any",
            "are", "aren't", "as", "at", "be", "because", "been", "before", "being", "below",
            "between", "both", "but", "by", "can", "can't", "cannot", "could", "couldn't", "did",
            "didn't", "do", "does", "doesn't", "doing", "don't", "down", "during", "each", "few",
            "for", "from", "further", "had", "hadn't", "has", "hasn't", "have", "haven't", "having",
            "he", "he'd", "he'll", "he's", "her", "here", "here's", "hers", "herself", "him",
            "himself", "his", "how", "how's", "i", "i'd", "i'll", "i'm", "i've", "if", "in", "into",
            "is", "isn't", "it", "it's", "its", "itself", "let's", "me", "more", "most", "mustn't",
            "my", "myself", "no", "nor", "not", "of", "off", "on", "once", "only", "or", "other",
            "ought", "our", "ours", "ourselves", "out", "over", "own", "same", "she", "she'd",
            "she'll", "she's", "should", "shouldn't", "so", "some", "such", "than", "that",
            "that's", "the", "their", "theirs", "them", "themselves", "then", "there", "there's",
            "these", "they", "they'd", "they'll", "they're", "they've", "this", "those", "through",
            "to", "too", "under", "until", "up", "very", "was", "wasn't", "we", "we'd", "we'll",
            "we're", "we've", "were", "weren't", "what", "what's", "when", "when's", "where",
            "where's", "which", "while", "who", "who's", "whom", "why", "why's", "with", "won't",
            "would", "wouldn't", "you", "you'd", "you'll", "you're", "you've", "your", "yours",
            "yourself", "yourselves"
        ];
        words.iter().map(|w| w.to_string()).collect()
    };
}

fn trim_word(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Stem a lowercased, NFKC-normalized word after trimming surrounding punctuation.
fn canonical(word: &str) -> Option<String> {
    let word = trim_word(word);
    if word.is_empty() {
        return None;
    }
    Some(STEMMER.stem(word).into_owned())
}

/// The normalization applied to query terms. Indexed tokens go through the same steps, so a
/// term found in a document always resolves here.
pub fn normalize_term(raw: &str) -> Option<String> {
    let folded = raw.nfkc().collect::<String>().to_lowercase();
    canonical(&folded)
}

/// Splits text into normalized terms with 1-based positions counted over the kept tokens.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    custom_stopwords: Option<HashSet<String>>,
}

impl Tokenizer {
    pub fn new() -> Self { Self::default() }

    pub fn with_stopwords(stopwords: HashSet<String>) -> Self {
        Self { custom_stopwords: Some(stopwords) }
    }

    /// One stopword per line; blank lines are ignored.
    pub fn from_stopword_file(path: &Path) -> io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let words = text
            .lines()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .collect();
        Ok(Self::with_stopwords(words))
    }

    fn is_stopword(&self, token: &str) -> bool {
        match &self.custom_stopwords {
            Some(words) => words.contains(token),
            None => STOPWORDS.contains(token),
        }
    }

    /// NFKC normalization, lowercase, stopword and single-letter removal, stemming.
    pub fn tokenize(&self, text: &str) -> Vec<(String, Position)> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        let mut tokens = Vec::new();
        let mut pos: Position = 0;
        for mat in RE.find_iter(&normalized) {
            let token = trim_word(mat.as_str());
            if token.chars().count() < 2 || self.is_stopword(token) {
                continue;
            }
            if let Some(stem) = canonical(token) {
                pos += 1;
                tokens.push((stem, pos));
            }
        }
        tokens
    }
}

/// Tokenize with the built-in English stopword list.
pub fn tokenize(text: &str) -> Vec<(String, Position)> {
    Tokenizer::default().tokenize(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Running, runner's run!");
        assert!(t.iter().any(|(w, _)| w == "run"));
    }

    #[test]
    fn positions_are_one_based_over_kept_tokens() {
        let t = tokenize("The cat and the hat");
        assert_eq!(t, vec![("cat".to_string(), 1), ("hat".to_string(), 2)]);
    }

    #[test]
    fn query_normalization_matches_indexing() {
        for raw in ["Searching", "INDEXES", "quickly;", "databases'", "Café"] {
            let indexed = tokenize(raw);
            assert_eq!(indexed.len(), 1, "{raw}");
            assert_eq!(normalize_term(raw).as_deref(), Some(indexed[0].0.as_str()));
        }
        assert_eq!(normalize_term("Running!").as_deref(), Some("run"));
        assert_eq!(normalize_term("..."), None);
    }

    #[test]
    fn filters_apply_after_trimming_punctuation() {
        let t = tokenize("the' a' cat'");
        assert_eq!(t, vec![("cat".to_string(), 1)]);
    }

    #[test]
    fn custom_stopwords() {
        let tk = Tokenizer::with_stopwords(["cat".to_string()].into_iter().collect());
        let words: Vec<String> = tk.tokenize("the cat sat").into_iter().map(|(w, _)| w).collect();
        assert_eq!(words, vec!["the".to_string(), "sat".to_string()]);
    }
}
