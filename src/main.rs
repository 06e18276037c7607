use database::Database;
use feedscribe_core::{CoreError, ErrorReporter, RunReport, ScraperConfig};
use ocr_engine::TesseractExtractor;
use pipeline::{HttpFetcher, Pipeline};
use reddit_client::{RedditClient, RedditOAuth2Config};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "feedscribe=info,pipeline=info,reddit_client=info,database=info,ocr_engine=info";

#[tokio::main]
async fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting Feedscribe");

    match run().await {
        Ok(report) => {
            report.log_summary();
            ExitCode::SUCCESS
        }
        Err(e) => {
            ErrorReporter::new().report_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<RunReport, CoreError> {
    let config = ScraperConfig::load()?;
    tracing::debug!("Loaded configuration: {:?}", config);

    let extractor = TesseractExtractor::new(config.ocr.clone());
    match extractor.check_available().await {
        Ok(version) => tracing::info!("Using {}", version),
        Err(e) => ErrorReporter::new().report_warning(&CoreError::from(e)),
    }

    let mut database = Database::new(config.store.clone());
    database.connect().await?;

    let result = ingest(&config, &extractor, &database).await;
    database.close().await;
    result
}

async fn ingest(
    config: &ScraperConfig,
    extractor: &TesseractExtractor,
    database: &Database,
) -> Result<RunReport, CoreError> {
    database.run_migrations().await?;

    let mut reddit = RedditClient::new(RedditOAuth2Config::from(&config.reddit))?;
    reddit.authenticate().await?;

    let fetcher = HttpFetcher::new(config.download_timeout(), &config.reddit.user_agent)?;

    Pipeline::new(config, &reddit, &fetcher, extractor, database)
        .run()
        .await
}
