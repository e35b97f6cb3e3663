//! Evidence aggregation and ranking
//!
//! Each candidate emitted for a question contributes
//! `query_weight * factor^k`, where `k` counts its capitalized words.
//! Totals accumulate per exact candidate and are ranked with ties kept in
//! first-seen order, so identical inputs always rank identically.

use crate::candidates::Candidate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A ranked candidate answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAnswer {
    pub text: String,
    pub score: f64,
}

/// True when the word equals its own capitalized form: an uppercase first
/// character followed only by lowercase characters
pub fn is_capitalized(word: &str) -> bool {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let rest = chars.as_str();

    let capitalized: String = first.to_uppercase().chain(rest.to_lowercase().chars()).collect();
    capitalized == word
}

/// Score of one emission of `candidate` from a query of weight `weight`
pub fn ngram_score(candidate: &Candidate, weight: f64, capitalization_factor: f64) -> f64 {
    let capitalized = candidate.words().iter().filter(|w| is_capitalized(w)).count();
    weight * capitalization_factor.powi(capitalized as i32)
}

/// Per-question score table
#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    capitalization_factor: f64,
    index: HashMap<Candidate, usize>,
    entries: Vec<(Candidate, f64)>,
}

impl ScoreAggregator {
    pub fn new(capitalization_factor: f64) -> Self {
        Self {
            capitalization_factor,
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Add one emission of `candidate` at base weight `weight`
    pub fn add(&mut self, candidate: Candidate, weight: f64) {
        let contribution = ngram_score(&candidate, weight, self.capitalization_factor);
        self.accumulate(candidate, contribution);
    }

    pub fn extend<I>(&mut self, candidates: I, weight: f64)
    where
        I: IntoIterator<Item = Candidate>,
    {
        for candidate in candidates {
            self.add(candidate, weight);
        }
    }

    fn accumulate(&mut self, candidate: Candidate, amount: f64) {
        match self.index.get(&candidate) {
            Some(&slot) => self.entries[slot].1 += amount,
            None => {
                self.index.insert(candidate.clone(), self.entries.len());
                self.entries.push((candidate, amount));
            }
        }
    }

    /// Fold a partial table into this one. Keys new to `self` are appended
    /// in `other`'s order.
    pub fn merge(&mut self, other: ScoreAggregator) {
        for (candidate, total) in other.entries {
            self.accumulate(candidate, total);
        }
    }

    /// Accumulated total for a candidate
    pub fn score(&self, candidate: &Candidate) -> Option<f64> {
        self.index.get(candidate).map(|&slot| self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Candidates by descending score; equal scores keep first-seen order
    pub fn rank(self) -> Vec<RankedAnswer> {
        let mut entries = self.entries;
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));

        entries
            .into_iter()
            .map(|(candidate, score)| RankedAnswer {
                text: candidate.text(),
                score,
            })
            .collect()
    }
}
