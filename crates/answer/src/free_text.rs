//! Free-text answering from web search snippets
//!
//! tokenize -> rewrite -> (cached) search per rewrite -> sentences ->
//! candidates -> weighted aggregation -> ranking.

use crate::candidates::candidate_answers;
use crate::providers::{call_with_retry, CallPolicy, SearchProvider};
use crate::rewrite::{QueryRewriter, RewrittenQuery};
use crate::scoring::{RankedAnswer, ScoreAggregator};
use crate::snippet::{Snippet, SnippetNormalizer};
use crate::tokenizer::tokenize;
use futures::{stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};
use whoqa_common::cache::{self, keys, ResultCache};
use whoqa_common::config::ScoringConfig;
use whoqa_common::errors::Result;
use whoqa_common::metrics::QuestionMetrics;

/// Ranks candidate answers mined from search snippets
pub struct FreeTextAnswerer {
    search: Arc<dyn SearchProvider>,
    cache: Arc<dyn ResultCache>,
    rewriter: QueryRewriter,
    normalizer: SnippetNormalizer,
    capitalization_factor: f64,
    policy: CallPolicy,
    concurrency: usize,
}

impl FreeTextAnswerer {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        cache: Arc<dyn ResultCache>,
        scoring: &ScoringConfig,
    ) -> Self {
        Self {
            search,
            cache,
            rewriter: QueryRewriter::from_config(scoring),
            normalizer: SnippetNormalizer::from_config(scoring),
            capitalization_factor: scoring.capitalization_factor,
            policy: CallPolicy::default(),
            concurrency: 1,
        }
    }

    pub fn with_call_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Rewritten queries retrieved at once; results are still aggregated
    /// in rewrite order
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Rank candidate answers to `question`, best first
    pub async fn rank_answers(&self, question: &str) -> Result<Vec<RankedAnswer>> {
        let metrics = QuestionMetrics::start("free_text");
        let queries = self.rewriter.rewrite(&tokenize(question))?;
        debug!(question, rewrites = queries.len(), "Question rewritten");

        let retrieved: Vec<(RewrittenQuery, Vec<Snippet>)> = stream::iter(queries)
            .map(|query| async move {
                let snippets = self.snippets_for(&query.text).await;
                (query, snippets)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut table = ScoreAggregator::new(self.capitalization_factor);
        for (query, snippets) in &retrieved {
            for snippet in snippets {
                for sentence in self.normalizer.sentences(snippet) {
                    table.extend(candidate_answers(&sentence, &query.text), query.weight);
                }
            }
        }

        let ranked = table.rank();
        info!(
            question,
            queries = retrieved.len(),
            candidates = ranked.len(),
            "Free-text answers ranked"
        );
        metrics.finish(ranked.len());
        Ok(ranked)
    }

    /// Snippets for one rewritten query, from cache when present. Provider
    /// failures degrade to no snippets and are not cached.
    async fn snippets_for(&self, query_text: &str) -> Vec<Snippet> {
        if query_text.trim().is_empty() {
            debug!("Skipping blank rewritten query");
            return Vec::new();
        }

        let key = keys::search_query(query_text);
        if let Some(snippets) = cache::get_json::<Vec<Snippet>>(self.cache.as_ref(), &key).await {
            return snippets;
        }

        let search = self.search.as_ref();
        match call_with_retry(search.name(), self.policy, || search.search(query_text)).await {
            Ok(snippets) => {
                cache::put_json(self.cache.as_ref(), &key, &snippets).await;
                snippets
            }
            Err(e) => {
                warn!(query = query_text, error = %e, "Search failed, continuing without snippets");
                Vec::new()
            }
        }
    }
}
