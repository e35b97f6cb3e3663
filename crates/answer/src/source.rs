//! Answer sources and the top-level answering facade

use crate::free_text::FreeTextAnswerer;
use crate::hybrid::HybridResolver;
use crate::providers::{
    CallPolicy, DisabledEngine, DisabledSearch, SearchProvider, StructuredAnswerEngine, StructuredEngineClient,
    WebSearchClient,
};
use crate::scoring::RankedAnswer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;
use whoqa_common::cache::ResultCache;
use whoqa_common::config::AppConfig;
use whoqa_common::errors::{AppError, Result};

/// Where an answer comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    /// Ranked candidates mined from web search snippets
    FreeText,
    /// The structured answer engine alone
    Structured,
    /// Structured engine, falling back to the top free-text candidate
    Hybrid,
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerSource::FreeText => "free_text",
            AnswerSource::Structured => "structured",
            AnswerSource::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for AnswerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnswerSource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free_text" | "free-text" | "search" => Ok(AnswerSource::FreeText),
            "structured" => Ok(AnswerSource::Structured),
            "hybrid" => Ok(AnswerSource::Hybrid),
            _ => Err(AppError::UnknownAnswerSource { name: s.to_string() }),
        }
    }
}

/// Shape of an answer depends on its source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Ranked(Vec<RankedAnswer>),
    Single(Option<String>),
}

/// Answers questions from any [`AnswerSource`]
pub struct Answerer {
    free_text: Arc<FreeTextAnswerer>,
    hybrid: HybridResolver,
    search_enabled: bool,
}

impl Answerer {
    pub fn new(free_text: Arc<FreeTextAnswerer>, hybrid: HybridResolver) -> Self {
        Self {
            free_text,
            hybrid,
            search_enabled: true,
        }
    }

    /// Wire the pipeline from injected collaborators
    pub fn from_parts(
        search: Arc<dyn SearchProvider>,
        engine: Arc<dyn StructuredAnswerEngine>,
        cache: Arc<dyn ResultCache>,
        config: &AppConfig,
    ) -> Self {
        let search_policy = CallPolicy::new(config.search.timeout(), config.search.max_retries);
        let structured_policy =
            CallPolicy::new(config.structured.timeout(), config.structured.max_retries);

        let search_enabled = search.is_enabled();
        let free_text = Arc::new(
            FreeTextAnswerer::new(search, cache.clone(), &config.scoring)
                .with_call_policy(search_policy)
                .with_concurrency(config.search.concurrency),
        );
        let hybrid = HybridResolver::new(engine, cache, free_text.clone())
            .with_call_policy(structured_policy);

        Self {
            free_text,
            hybrid,
            search_enabled,
        }
    }

    /// Build the HTTP-backed pipeline described by `config`
    pub fn from_config(config: &AppConfig, cache: Arc<dyn ResultCache>) -> Result<Self> {
        let search: Arc<dyn SearchProvider> = if config.search.api_key.is_some() {
            Arc::new(WebSearchClient::new(&config.search)?)
        } else {
            warn!("search.api_key not set, free-text answers disabled");
            Arc::new(DisabledSearch)
        };

        let engine: Arc<dyn StructuredAnswerEngine> = if config.structured.app_id.is_some() {
            Arc::new(StructuredEngineClient::new(&config.structured)?)
        } else {
            warn!("structured.app_id not set, structured answers disabled");
            Arc::new(DisabledEngine)
        };

        Ok(Self::from_parts(search, engine, cache, config))
    }

    /// The free-text stage shared with the hybrid resolver
    pub fn free_text(&self) -> &FreeTextAnswerer {
        &self.free_text
    }

    /// Fails when no search provider is configured
    pub fn require_search(&self) -> Result<()> {
        if self.search_enabled {
            Ok(())
        } else {
            Err(AppError::Configuration {
                message: "search.api_key is required for free-text answers".to_string(),
            })
        }
    }

    /// Ranked free-text answers
    pub async fn rank_answers(&self, question: &str) -> Result<Vec<RankedAnswer>> {
        self.require_search()?;
        self.free_text.rank_answers(question).await
    }

    /// Single best answer, structured engine first
    pub async fn resolve(&self, question: &str) -> Result<Option<String>> {
        self.require_search()?;
        self.hybrid.resolve(question).await
    }

    pub async fn answer(&self, question: &str, source: AnswerSource) -> Result<Answer> {
        match source {
            AnswerSource::FreeText => Ok(Answer::Ranked(self.rank_answers(question).await?)),
            AnswerSource::Structured => Ok(Answer::Single(self.hybrid.structured_answer(question).await)),
            AnswerSource::Hybrid => Ok(Answer::Single(self.resolve(question).await?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::free_text::tests::StubSearch;
    use whoqa_common::cache::InMemoryCache;

    fn answerer(search: Arc<StubSearch>) -> Answerer {
        Answerer::from_parts(
            search,
            Arc::new(DisabledEngine),
            Arc::new(InMemoryCache::new()),
            &AppConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_structured_source_works_without_search_key() {
        let answerer =
            Answerer::from_config(&AppConfig::default(), Arc::new(InMemoryCache::new())).unwrap();

        assert_eq!(
            answerer.answer("Who wrote the Iliad?", AnswerSource::Structured).await.unwrap(),
            Answer::Single(None)
        );
        for source in [AnswerSource::FreeText, AnswerSource::Hybrid] {
            assert!(matches!(
                answerer.answer("Who wrote the Iliad?", source).await,
                Err(AppError::Configuration { .. })
            ));
        }
    }

    #[test]
    fn test_source_parsing() {
        assert_eq!("hybrid".parse::<AnswerSource>().unwrap(), AnswerSource::Hybrid);
        assert_eq!(" Free_Text ".parse::<AnswerSource>().unwrap(), AnswerSource::FreeText);
        assert_eq!("structured".parse::<AnswerSource>().unwrap(), AnswerSource::Structured);
        assert!(matches!(
            "oracle".parse::<AnswerSource>(),
            Err(AppError::UnknownAnswerSource { .. })
        ));
    }

    #[test]
    fn test_source_display_roundtrip() {
        for source in [AnswerSource::FreeText, AnswerSource::Structured, AnswerSource::Hybrid] {
            assert_eq!(source.to_string().parse::<AnswerSource>().unwrap(), source);
        }
    }

    #[tokio::test]
    async fn test_answer_shapes_follow_source() {
        let answerer = answerer(Arc::new(StubSearch::with_fallback(&["by Homer."])));

        match answerer.answer("Who wrote the Iliad?", AnswerSource::FreeText).await.unwrap() {
            Answer::Ranked(ranked) => assert_eq!(ranked[0].text, "Homer"),
            other => panic!("unexpected answer {:?}", other),
        }

        assert_eq!(
            answerer.answer("Who wrote the Iliad?", AnswerSource::Structured).await.unwrap(),
            Answer::Single(None)
        );
        assert_eq!(
            answerer.answer("Who wrote the Iliad?", AnswerSource::Hybrid).await.unwrap(),
            Answer::Single(Some("Homer".to_string()))
        );
    }
}
