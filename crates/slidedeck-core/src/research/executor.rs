use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_SEARCH_CONCURRENCY, MAX_FACTS_PER_SEARCH};
use crate::content::strip_bullet_marker;
use crate::llm::{CompletionOptions, SharedLLM};

use super::prompts::{build_search_prompt, SEARCH_SYSTEM_PROMPT};

/// Facts per query text.
pub type SearchResults = BTreeMap<String, Vec<String>>;

const MIN_FACT_CHARS: usize = 20;

/// Runs plan queries against the model, which stands in for a web search.
#[derive(Clone)]
pub struct SearchExecutor {
    llm: SharedLLM,
    concurrency: usize,
    source: Option<Arc<str>>,
}

impl SearchExecutor {
    pub fn new(llm: SharedLLM) -> Self {
        Self {
            llm,
            concurrency: DEFAULT_SEARCH_CONCURRENCY,
            source: None,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Restricts answers to uploaded source material.
    pub fn with_source(mut self, source: Option<&str>) -> Self {
        self.source = source.filter(|s| !s.trim().is_empty()).map(Arc::from);
        self
    }

    /// Facts for one query. Never fails; a model error yields a single
    /// placeholder fact. Transient errors are retried once.
    pub async fn search(&self, query: &str) -> Vec<String> {
        let prompt = build_search_prompt(query, self.source.as_deref());
        let options = CompletionOptions::temperature(0.1).with_max_tokens(500);
        let mut retried = false;
        loop {
            match self
                .llm
                .complete_with_options(SEARCH_SYSTEM_PROMPT, &prompt, &options)
                .await
            {
                Ok(text) => {
                    let facts = parse_facts(&text);
                    debug!(query, count = facts.len(), "search completed");
                    return facts;
                }
                Err(e) if e.is_transient() && !retried => {
                    debug!(error = %e, query, "search failed, retrying");
                    retried = true;
                }
                Err(e) => {
                    warn!(error = %e, query, "search failed");
                    return vec![format!("{query}: See latest financial reports")];
                }
            }
        }
    }

    /// Runs every distinct query with bounded parallelism.
    ///
    /// A task that panics contributes a placeholder fact instead of failing
    /// the batch.
    pub async fn execute_searches<I, S>(&self, queries: I) -> SearchResults
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let unique: Vec<String> = queries
            .into_iter()
            .map(|q| q.as_ref().trim().to_string())
            .filter(|q| !q.is_empty() && seen.insert(q.clone()))
            .collect();
        info!(queries = unique.len(), concurrency = self.concurrency, "executing searches");

        let jobs: Vec<_> = unique
            .into_iter()
            .map(|query| {
                let executor = self.clone();
                async move {
                    let task_query = query.clone();
                    let handle = tokio::spawn(async move { executor.search(&task_query).await });
                    match handle.await {
                        Ok(facts) => (query, facts),
                        Err(e) => {
                            warn!(error = %e, query = %query, "search task failed");
                            let fact = format!("Data for {query}: See latest reports");
                            (query, vec![fact])
                        }
                    }
                }
            })
            .collect();
        let results: Vec<(String, Vec<String>)> = stream::iter(jobs)
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        results.into_iter().collect()
    }
}

/// Keeps substantive lines of a search response, without list markers.
pub fn parse_facts(text: &str) -> Vec<String> {
    text.lines()
        .map(strip_bullet_marker)
        .map(str::trim)
        .filter(|line| line.chars().count() > MIN_FACT_CHARS)
        .take(MAX_FACTS_PER_SEARCH)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_facts_filters_short_lines() {
        let text = "Here you go:\n- Revenue: $119.6B (Q4 2024)\n- ok\n2. Gross margin: 46.9% (Q4 2024)\n";
        let facts = parse_facts(text);
        assert_eq!(
            facts,
            vec![
                "Revenue: $119.6B (Q4 2024)".to_string(),
                "Gross margin: 46.9% (Q4 2024)".to_string()
            ]
        );
    }

    #[test]
    fn test_parse_facts_caps_count() {
        let text = (0..9)
            .map(|i| format!("Metric number {i}: {i}00 units (FY2024)"))
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(parse_facts(&text).len(), MAX_FACTS_PER_SEARCH);
    }

    struct Flaky {
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl crate::llm::LLM for Flaky {
        async fn complete(&self, prompt: &str) -> Result<String, crate::llm::LLMError> {
            self.complete_with_system("", prompt).await
        }

        async fn complete_with_system(&self, _system: &str, _prompt: &str) -> Result<String, crate::llm::LLMError> {
            match self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) {
                0 => Err(crate::llm::LLMError::RateLimited),
                _ => Ok("- Cloud spend: $4.9M in Q3 2024".to_string()),
            }
        }
    }

    #[tokio::test]
    async fn test_search_retries_transient_error() {
        let llm = Arc::new(Flaky {
            calls: std::sync::atomic::AtomicUsize::new(0),
        });
        let executor = SearchExecutor::new(llm.clone());
        let results = executor.execute_searches(["cloud spend", "cloud spend ", ""]).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results["cloud spend"], vec!["Cloud spend: $4.9M in Q3 2024".to_string()]);
        assert_eq!(llm.calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
