use feedscribe_core::CoreError;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Downloads the resource behind a candidate URL.
#[allow(async_fn_in_trait)]
pub trait ResourceFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CoreError>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http_client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http_client,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CoreError> {
        let response = self.http_client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                CoreError::Timeout {
                    seconds: self.timeout.as_secs(),
                }
            } else {
                CoreError::Network(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::RequestFailed {
                message: format!("GET {} returned {}", url, status),
                status_code: Some(status.as_u16()),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                CoreError::Timeout {
                    seconds: self.timeout.as_secs(),
                }
            } else {
                CoreError::Network(e)
            }
        })?;
        debug!("Downloaded {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_fetcher_creation() {
        let fetcher = HttpFetcher::new(Duration::from_secs(10), "feedscribe-test/0.1").unwrap();
        assert_eq!(fetcher.timeout(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_invalid_url_is_network_error() {
        let fetcher = HttpFetcher::new(Duration::from_secs(1), "feedscribe-test/0.1").unwrap();
        let result = fetcher.fetch("not a url").await;
        assert!(matches!(result, Err(CoreError::Network(_))));
    }
}
