//! Candidate answer extraction
//!
//! Every contiguous run of one to three words in a sentence is a candidate
//! answer, once the words of the query itself have been removed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest n-gram considered as an answer
pub const MAX_NGRAM: usize = 3;

/// An ordered run of words, casing preserved; identity is the exact sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate(Vec<String>);

impl Candidate {
    pub fn new<S: Into<String>>(words: impl IntoIterator<Item = S>) -> Self {
        Self(words.into_iter().map(Into::into).collect())
    }

    pub fn words(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Words joined by single spaces
    pub fn text(&self) -> String {
        self.0.join(" ")
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// All `n`-grams of `words`, in order. Empty when `words` is shorter than `n`.
pub fn ngrams(words: &[String], n: usize) -> Vec<Candidate> {
    if n == 0 {
        return Vec::new();
    }
    words.windows(n).map(|w| Candidate(w.to_vec())).collect()
}

/// Words of `sentence` whose lowercase form does not occur in `query`
///
/// The check is a substring test against the rendered query text, so short
/// words such as "a" are dropped whenever they appear inside any query word.
pub fn filter_query_words(sentence: &str, query: &str) -> Vec<String> {
    sentence
        .split_whitespace()
        .filter(|word| !query.contains(word.to_lowercase().as_str()))
        .map(str::to_string)
        .collect()
}

/// 1-, 2- and 3-grams of a sentence after query-word filtering
///
/// Unigrams come first, then bigrams, then trigrams. Repeats are kept.
pub fn candidate_answers(sentence: &str, query: &str) -> Vec<Candidate> {
    let words = filter_query_words(sentence, query);
    (1..=MAX_NGRAM).flat_map(|n| ngrams(&words, n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grams(items: &[&[&str]]) -> Vec<Candidate> {
        items.iter().map(|words| Candidate::new(words.iter().copied())).collect()
    }

    #[test]
    fn test_ngrams() {
        let words: Vec<String> = ["the", "quick", "brown"].iter().map(|s| s.to_string()).collect();
        assert_eq!(ngrams(&words, 2), grams(&[&["the", "quick"], &["quick", "brown"]]));
        assert!(ngrams(&words, 4).is_empty());
        assert!(ngrams(&words, 0).is_empty());
    }

    #[test]
    fn test_candidate_answers_drop_query_words() {
        let candidates = candidate_answers(
            "The quick brown fox jumped over the lazy grey dogs",
            "brown dogs",
        );

        let expected = grams(&[
            &["The"], &["quick"], &["fox"], &["jumped"], &["over"], &["the"], &["lazy"], &["grey"],
            &["The", "quick"], &["quick", "fox"], &["fox", "jumped"], &["jumped", "over"],
            &["over", "the"], &["the", "lazy"], &["lazy", "grey"],
            &["The", "quick", "fox"], &["quick", "fox", "jumped"], &["fox", "jumped", "over"],
            &["jumped", "over", "the"], &["over", "the", "lazy"], &["the", "lazy", "grey"],
        ]);
        assert_eq!(candidates, expected);
        assert!(!candidates.iter().any(|c| c.words().iter().any(|w| w == "brown")));
    }

    #[test]
    fn test_query_match_ignores_case() {
        let candidates = candidate_answers("Homer WROTE it", "\"wrote the iliad\"");
        assert_eq!(candidates, grams(&[&["Homer"], &["it"], &["Homer", "it"]]));
    }

    #[test]
    fn test_repeats_are_kept() {
        let candidates = candidate_answers("Homer Homer", "\"wrote\"");
        assert_eq!(candidates, grams(&[&["Homer"], &["Homer"], &["Homer", "Homer"]]));
    }

    #[test]
    fn test_candidate_text() {
        let candidate = Candidate::new(["Roger", "Bannister"]);
        assert_eq!(candidate.text(), "Roger Bannister");
        assert_eq!(candidate.to_string(), "Roger Bannister");
        assert_eq!(candidate.len(), 2);
    }
}
