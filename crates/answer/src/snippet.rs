//! Search snippet normalization
//!
//! Turns a raw result snippet (which may carry markup) into sentence-like
//! units holding only ASCII letters and spaces.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use whoqa_common::config::ScoringConfig;

/// One search-result excerpt, as returned by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snippet(pub String);

impl Snippet {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn raw(&self) -> &str {
        &self.0
    }
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

/// Strip markup tags and decode the entities search engines commonly emit
pub fn visible_text(raw: &str) -> String {
    tag_pattern()
        .replace_all(raw, "")
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Splits snippets into clean sentences
#[derive(Debug, Clone)]
pub struct SnippetNormalizer {
    boilerplate: Vec<String>,
}

impl Default for SnippetNormalizer {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}

impl SnippetNormalizer {
    pub fn new(boilerplate: Vec<String>) -> Self {
        Self { boilerplate }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.boilerplate_words.clone())
    }

    /// Remove every occurrence of the boilerplate words
    pub fn remove_boilerplate(&self, text: &str) -> String {
        self.boilerplate
            .iter()
            .filter(|word| !word.is_empty())
            .fold(text.to_string(), |acc, word| acc.replace(word.as_str(), ""))
    }

    /// Sentences of a snippet, letters and spaces only
    pub fn sentences(&self, snippet: &Snippet) -> Vec<String> {
        let text = self.remove_boilerplate(&visible_text(snippet.raw()));

        text.split('.')
            .filter(|unit| !unit.is_empty())
            .map(|unit| {
                unit.chars()
                    .filter(|c| c.is_ascii_alphabetic() || *c == ' ')
                    .collect()
            })
            .collect()
    }
}
