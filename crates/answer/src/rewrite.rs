//! Question to search-query rewriting
//!
//! Questions are assumed to read "Who <verb> <rest>?", so the token at
//! position 1 is taken as the verb. Each rewrite is a phrase the answer is
//! likely to sit next to in a web page. Questions of other shapes still
//! produce rewrites, just poor ones.

use serde::{Deserialize, Serialize};
use whoqa_common::config::ScoringConfig;
use whoqa_common::errors::{AppError, Result};

/// A search query derived from a question, with the weight given to
/// every candidate it yields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewrittenQuery {
    pub text: String,
    pub weight: f64,
}

impl RewrittenQuery {
    pub fn new(text: impl Into<String>, weight: f64) -> Self {
        Self {
            text: text.into(),
            weight,
        }
    }
}

/// Produces the weighted rewrites for a tokenized question
#[derive(Debug, Clone)]
pub struct QueryRewriter {
    quoted_weight: f64,
    unquoted_weight: f64,
}

impl Default for QueryRewriter {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}

impl QueryRewriter {
    pub fn new(quoted_weight: f64, unquoted_weight: f64) -> Self {
        Self {
            quoted_weight,
            unquoted_weight,
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.quoted_weight, config.unquoted_weight)
    }

    /// Rewrite tokens into queries, in this order:
    /// - `"<verb> <rest>"`
    /// - `"<rest[..=j]> <verb> <rest[j+1..]>"` for every split point
    /// - `<rest>` unquoted, at the lower weight
    pub fn rewrite(&self, tokens: &[String]) -> Result<Vec<RewrittenQuery>> {
        if tokens.len() < 2 {
            return Err(AppError::InvalidQuestion {
                token_count: tokens.len(),
            });
        }

        let verb = &tokens[1];
        let rest = &tokens[2..];
        let mut rewrites = Vec::with_capacity(tokens.len());

        rewrites.push(RewrittenQuery::new(
            format!("\"{} {}\"", verb, rest.join(" ")),
            self.quoted_weight,
        ));

        for j in 2..tokens.len() {
            rewrites.push(RewrittenQuery::new(
                format!(
                    "\"{} {} {}\"",
                    tokens[2..=j].join(" "),
                    verb,
                    tokens[j + 1..].join(" ")
                ),
                self.quoted_weight,
            ));
        }

        rewrites.push(RewrittenQuery::new(rest.join(" "), self.unquoted_weight));

        Ok(rewrites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    #[test]
    fn test_rewrites_for_simple_question() {
        let rewriter = QueryRewriter::default();
        let queries = rewriter.rewrite(&tokenize("Who wrote the Iliad?")).unwrap();

        let texts: Vec<&str> = queries.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "\"wrote the iliad\"",
                "\"the wrote iliad\"",
                "\"the iliad wrote \"",
                "the iliad",
            ]
        );

        let weights: Vec<f64> = queries.iter().map(|q| q.weight).collect();
        assert_eq!(weights, vec![5.0, 5.0, 5.0, 2.0]);
    }

    #[test]
    fn test_rewrite_is_deterministic() {
        let rewriter = QueryRewriter::new(4.0, 1.0);
        let tokens = tokenize("Who invented the C programming language?");
        assert_eq!(rewriter.rewrite(&tokens).unwrap(), rewriter.rewrite(&tokens).unwrap());
    }

    #[test]
    fn test_unquoted_variant_always_last() {
        let rewriter = QueryRewriter::default();
        let queries = rewriter.rewrite(&tokenize("Who won")).unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].text, "\"won \"");
        assert_eq!(queries[1], RewrittenQuery::new("", 2.0));
    }

    #[test]
    fn test_too_few_tokens_fails_fast() {
        let rewriter = QueryRewriter::default();
        let err = rewriter.rewrite(&tokenize("Who?")).unwrap_err();
        assert!(matches!(err, AppError::InvalidQuestion { token_count: 1 }));
        assert!(rewriter.rewrite(&[]).is_err());
    }
}
