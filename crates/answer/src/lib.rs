//! WhoQA Answer Pipeline
//!
//! Answers "Who <verb> ...?" questions by mining web-search snippets:
//! - Question tokenization and query rewriting
//! - Snippet normalization and n-gram candidate extraction
//! - Weighted evidence aggregation with a proper-noun bias
//! - Hybrid resolution against a structured answer engine
//! - Offline evaluation over known question/answer pairs

pub mod candidates;
pub mod evaluation;
pub mod free_text;
pub mod hybrid;
pub mod providers;
pub mod rewrite;
pub mod scoring;
pub mod snippet;
pub mod source;
pub mod tokenizer;

pub use candidates::Candidate;
pub use free_text::FreeTextAnswerer;
pub use hybrid::{HybridResolver, StructuredOutcome};
pub use providers::{SearchProvider, StructuredAnswerEngine};
pub use rewrite::{QueryRewriter, RewrittenQuery};
pub use scoring::{RankedAnswer, ScoreAggregator};
pub use snippet::{Snippet, SnippetNormalizer};
pub use source::{Answer, AnswerSource, Answerer};
pub use tokenizer::tokenize;

/// Questions answered when the binary runs without arguments
pub const SAMPLE_QUESTIONS: &[&str] = &[
    "Who ran the first four-minute mile?",
    "Who makes the best pizza in New York?",
    "Who invented the C programming language?",
    "Who wrote the Iliad?",
    "Who caused the financial crash of 2008?",
    "Who caused the Great Depression?",
    "Who is the most evil person in the world?",
    "Who wrote the plays of Wiliam Shakespeare?",
    "Who is the world's best tennis player?",
    "Who is the richest person in the world?",
];
