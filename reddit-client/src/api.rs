use feedscribe_core::{CoreError, FeedItem, RedditApiError};
use reqwest::header::HeaderValue;
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Reddit serves at most this many items per listing page.
pub const MAX_LISTING_LIMIT: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: u64,
    #[serde(default)]
    pub upvote_ratio: Option<f64>,
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    user_agent: String,
    base_url: String,
}

impl RedditApiClient {
    pub fn new(user_agent: String, timeout: Duration) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            user_agent,
            base_url: REDDIT_API_BASE.to_string(),
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub(crate) fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: Option<&[(&str, &str)]>,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token);

        if let Some(params) = query_params {
            request_builder = request_builder.query(params);
        }

        info!("Making Reddit API request: {} {}", method, endpoint);
        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    return Err(CoreError::RedditApi(RedditApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!("Request successful: {} {}", status, endpoint);
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        let retry_after = response.headers().get("retry-after");
        Err(status_error(status, endpoint, retry_after).into())
    }

    /// Fetches one page of the subreddit's hot listing.
    pub async fn get_hot_posts(
        &self,
        access_token: &str,
        subreddit: &str,
        limit: u32,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let endpoint = format!("/r/{}/hot", subreddit);
        let limit = listing_limit(limit).to_string();
        let params = [("limit", limit.as_str()), ("raw_json", "1")];

        let response = self
            .make_request(Method::GET, &endpoint, access_token, Some(&params[..]))
            .await?;

        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!("Failed to parse subreddit posts: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse posts for r/{}", subreddit),
            })
        })?;

        info!(
            "Retrieved {} posts from r/{}",
            listing.data.children.len(),
            subreddit
        );
        Ok(listing)
    }
}

/// Maps a non-success status to the matching API error.
pub fn status_error(
    status: StatusCode,
    endpoint: &str,
    retry_after: Option<&HeaderValue>,
) -> RedditApiError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = retry_after
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .unwrap_or(60);
            warn!("Rate limited, retry after {} seconds", retry_after);
            RedditApiError::RateLimitExceeded { retry_after }
        }
        StatusCode::UNAUTHORIZED => RedditApiError::InvalidToken,
        StatusCode::FORBIDDEN => RedditApiError::Forbidden {
            resource: endpoint.to_string(),
        },
        StatusCode::NOT_FOUND => match subreddit_of(endpoint) {
            Some(subreddit) => RedditApiError::SubredditNotFound {
                subreddit: subreddit.to_string(),
            },
            None => RedditApiError::InvalidResponse {
                details: format!("Resource not found: {}", endpoint),
            },
        },
        status if status.is_server_error() => RedditApiError::ServerError {
            status_code: status.as_u16(),
        },
        status => RedditApiError::InvalidResponse {
            details: format!("Unexpected status {} for {}", status, endpoint),
        },
    }
}

/// Clamps a requested page size to what the listing endpoint serves.
fn listing_limit(limit: u32) -> u32 {
    let clamped = limit.clamp(1, MAX_LISTING_LIMIT);
    if clamped != limit {
        warn!(
            "Listing limit {} is outside 1..={}, requesting {}",
            limit, MAX_LISTING_LIMIT, clamped
        );
    }
    clamped
}

fn subreddit_of(endpoint: &str) -> Option<&str> {
    endpoint
        .strip_prefix("/r/")
        .and_then(|rest| rest.split('/').next())
        .filter(|name| !name.is_empty())
}

impl From<RedditPostData> for FeedItem {
    fn from(post_data: RedditPostData) -> Self {
        Self {
            id: post_data.id,
            title: post_data.title,
            score: post_data.score,
            url: post_data.url.filter(|url| !url.is_empty()),
            num_comments: post_data.num_comments,
            upvote_ratio: post_data.upvote_ratio,
        }
    }
}

impl RedditListing<RedditPostData> {
    pub fn into_feed_items(self) -> Vec<FeedItem> {
        self.data
            .children
            .into_iter()
            .map(|child| child.data.into())
            .collect()
    }
}
