//! The four ingestion stages and the [`Pipeline`] that runs them in order:
//! fetch-and-filter, retrieve, extract, persist.

pub mod fetcher;
pub mod stages;


pub use fetcher::{HttpFetcher, ResourceFetcher};
pub use stages::{extract_texts, fetch_candidates, persist_records, retrieve_resources};

use database::DocumentStore;
use feedscribe_core::{CoreError, RunReport, ScraperConfig};
use ocr_engine::TextExtractor;
use reddit_client::FeedSource;
use tracing::info;

pub struct Pipeline<'a, F, R, X, S> {
    config: &'a ScraperConfig,
    feed: &'a F,
    fetcher: &'a R,
    extractor: &'a X,
    store: &'a S,
}

impl<'a, F, R, X, S> Pipeline<'a, F, R, X, S>
where
    F: FeedSource,
    R: ResourceFetcher,
    X: TextExtractor,
    S: DocumentStore,
{
    pub fn new(
        config: &'a ScraperConfig,
        feed: &'a F,
        fetcher: &'a R,
        extractor: &'a X,
        store: &'a S,
    ) -> Self {
        Self {
            config,
            feed,
            fetcher,
            extractor,
            store,
        }
    }

    /// Runs one batch. Only a failure to list the feed or read the known ids
    /// is returned as an error; item failures end up in the report.
    pub async fn run(&self) -> Result<RunReport, CoreError> {
        info!(
            "Starting run for r/{} (limit {})",
            self.config.subreddit_name, self.config.limit
        );

        let (listed, candidates) = fetch_candidates(self.feed, self.store, self.config).await?;
        let candidate_count = candidates.len();

        let retrieved = retrieve_resources(candidates, self.fetcher, self.config).await;
        let retrieved_count = retrieved.len();

        let extracted = extract_texts(retrieved.items, self.extractor).await;
        let extracted_count = extracted.len();

        let persisted =
            persist_records(extracted.items, self.store, self.config.min_text_length).await;

        let mut failures = retrieved.failures;
        failures.extend(extracted.failures);
        failures.extend(persisted.failures);

        Ok(RunReport {
            listed,
            candidates: candidate_count,
            retrieved: retrieved_count,
            extracted: extracted_count,
            persisted: persisted.inserted,
            below_threshold: persisted.below_threshold,
            failures,
        })
    }
}
