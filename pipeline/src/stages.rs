use crate::fetcher::ResourceFetcher;
use database::DocumentStore;
use feedscribe_core::{
    normalize_text, passes_quality_threshold, select_candidates, Candidate, CoreError, ErrorExt,
    Extracted, ItemFailure, PersistOutcome, PostRecord, Retrieved, ScraperConfig, Stage,
    StageReport,
};
use ocr_engine::TextExtractor;
use reddit_client::FeedSource;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const FALLBACK_EXTENSION: &str = "jpeg";

/// Lists the hot feed and keeps the new image posts.
///
/// Returns how many items the feed listed alongside the candidates. Failing
/// to read the known ids or to list the feed aborts the run.
pub async fn fetch_candidates<F, S>(
    feed: &F,
    store: &S,
    config: &ScraperConfig,
) -> Result<(usize, Vec<Candidate>), CoreError>
where
    F: FeedSource,
    S: DocumentStore,
{
    let known_ids = store.find_existing_ids().await?;
    info!("Skipping {} existing posts", known_ids.len());

    let items = feed
        .list_hot_items(&config.subreddit_name, config.limit)
        .await?;
    let listed = items.len();

    let candidates = select_candidates(
        items,
        &known_ids,
        &config.allow_list(),
        config.limit as usize,
    );
    info!(
        "Selected {} candidate(s) from {} listed post(s) in r/{}",
        candidates.len(),
        listed,
        config.subreddit_name
    );
    Ok((listed, candidates))
}

/// Downloads each candidate's image, saving it under `image_dir` when one
/// is configured.
pub async fn retrieve_resources<R>(
    candidates: Vec<Candidate>,
    fetcher: &R,
    config: &ScraperConfig,
) -> StageReport<Retrieved>
where
    R: ResourceFetcher,
{
    let mut report = StageReport::new(Stage::Retrieve);
    let allow_list = config.allow_list();

    if let Some(dir) = &config.image_dir {
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!("Could not create image directory {}: {}", dir.display(), e);
        }
    }

    for (index, candidate) in candidates.into_iter().enumerate() {
        if index > 0 {
            if let Some(pause) = config.sleep_interval() {
                tokio::time::sleep(pause).await;
            }
        }

        let post_id = candidate.post_id.clone();
        let extension = allow_list
            .matched_extension(&candidate.url)
            .unwrap_or(FALLBACK_EXTENSION)
            .to_string();

        let outcome = async {
            let image = fetcher.fetch(&candidate.url).await?;
            let image_path = match &config.image_dir {
                Some(dir) => Some(save_image(dir, &post_id, &extension, &image).await?),
                None => None,
            };
            Ok::<_, CoreError>(candidate.retrieved(image, image_path))
        }
        .await;

        report.record(&post_id, outcome);
    }

    info!(
        "Retrieved {} image(s), {} failed",
        report.len(),
        report.failures.len()
    );
    report
}

async fn save_image(
    dir: &Path,
    post_id: &str,
    extension: &str,
    image: &[u8],
) -> Result<PathBuf, CoreError> {
    let path = dir.join(format!("{}.{}", post_id, extension));
    tokio::fs::write(&path, image).await?;
    debug!("Saved {}", path.display());
    Ok(path)
}

/// Runs OCR over each downloaded image and normalizes the text.
pub async fn extract_texts<X>(retrieved: Vec<Retrieved>, extractor: &X) -> StageReport<Extracted>
where
    X: TextExtractor,
{
    let mut report = StageReport::new(Stage::Extract);

    for item in retrieved {
        let post_id = item.post_id().to_string();
        let outcome = match extractor.extract_text(&item.image).await {
            Ok(raw) => Ok(item.extracted(normalize_text(&raw))),
            Err(e) => Err(CoreError::from(e)),
        };
        report.record(&post_id, outcome);
    }

    info!(
        "Extracted text from {} image(s), {} failed",
        report.len(),
        report.failures.len()
    );
    report
}

/// Stores every record whose text passes the quality threshold.
pub async fn persist_records<S>(
    extracted: Vec<Extracted>,
    store: &S,
    threshold: usize,
) -> PersistOutcome
where
    S: DocumentStore,
{
    let mut outcome = PersistOutcome::default();

    for item in extracted {
        if !passes_quality_threshold(&item.text, threshold) {
            debug!(
                "Dropping post {}: {} character(s) of text",
                item.post_id(),
                item.text.chars().count()
            );
            outcome.below_threshold += 1;
            continue;
        }

        let record = PostRecord::from(item);
        match store.insert_one(&record).await {
            Ok(()) => outcome.inserted += 1,
            Err(error) => {
                warn!(
                    "[{}] Failed to store post {}: {}",
                    error.error_code(),
                    record.post_id,
                    error
                );
                outcome
                    .failures
                    .push(ItemFailure::new(record.post_id, Stage::Persist, error));
            }
        }
    }

    info!(
        "Stored {} record(s), {} below threshold, {} failed",
        outcome.inserted,
        outcome.below_threshold,
        outcome.failures.len()
    );
    outcome
}
