pub mod api;

#[cfg(test)]
mod tests;

use api::RedditApiClient;
use feedscribe_core::{CoreError, FeedItem, RedditApiError, RedditCredentials};
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, Scope, TokenResponse, TokenUrl,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Treat tokens as expired slightly early so a listing call never races expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Lists posts from a feed. Implemented by [`RedditClient`].
#[allow(async_fn_in_trait)]
pub trait FeedSource {
    async fn list_hot_items(&self, subreddit: &str, limit: u32)
        -> Result<Vec<FeedItem>, CoreError>;
}

#[derive(Debug, Clone)]
pub struct RedditOAuth2Config {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl RedditOAuth2Config {
    pub fn new(client_id: String, client_secret: String, user_agent: String) -> Self {
        Self {
            client_id,
            client_secret,
            user_agent,
        }
    }
}

impl From<&RedditCredentials> for RedditOAuth2Config {
    fn from(credentials: &RedditCredentials) -> Self {
        Self::new(
            credentials.client_id.clone(),
            credentials.client_secret.clone(),
            credentials.user_agent.clone(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditToken {
    pub access_token: String,
    pub expires_at: SystemTime,
    pub scope: Vec<String>,
}

impl RedditToken {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() + EXPIRY_MARGIN >= self.expires_at
    }
}

#[derive(Debug, Clone)]
pub enum AuthState {
    NotAuthenticated,
    Authenticated { token: RedditToken },
    TokenExpired { token: RedditToken },
}

/// Application-only Reddit client using the client-credentials grant.
pub struct RedditClient {
    config: RedditOAuth2Config,
    oauth_client: BasicClient,
    api: RedditApiClient,
    auth_state: AuthState,
}

impl RedditClient {
    pub fn new(config: RedditOAuth2Config) -> Result<Self, CoreError> {
        let oauth_client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::new(REDDIT_AUTH_URL.to_string()).map_err(invalid_url)?,
            Some(TokenUrl::new(REDDIT_TOKEN_URL.to_string()).map_err(invalid_url)?),
        );
        let api = RedditApiClient::new(config.user_agent.clone(), DEFAULT_REQUEST_TIMEOUT)?;

        Ok(Self {
            config,
            oauth_client,
            api,
            auth_state: AuthState::NotAuthenticated,
        })
    }

    pub fn get_required_scopes() -> Vec<&'static str> {
        vec!["read"]
    }

    pub fn get_auth_state(&self) -> &AuthState {
        &self.auth_state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.auth_state, AuthState::Authenticated { .. })
    }

    pub fn needs_refresh(&self) -> bool {
        matches!(self.auth_state, AuthState::TokenExpired { .. })
    }

    pub fn set_token(&mut self, token: RedditToken) {
        self.auth_state = if token.is_expired() {
            AuthState::TokenExpired { token }
        } else {
            AuthState::Authenticated { token }
        };
    }

    /// Exchanges the client credentials for an application-only token.
    pub async fn authenticate(&mut self) -> Result<(), CoreError> {
        info!("Authenticating with Reddit as {}", self.config.user_agent);

        let http_client = self.api.http_client().clone();
        let mut request = self.oauth_client.exchange_client_credentials();
        for scope in Self::get_required_scopes() {
            request = request.add_scope(Scope::new(scope.to_string()));
        }

        let response = request
            .request_async(move |request| send_token_request(http_client, request))
            .await
            .map_err(|e| {
                warn!("Reddit token exchange failed: {}", e);
                RedditApiError::AuthenticationFailed {
                    reason: e.to_string(),
                }
            })?;

        let expires_in = response
            .expires_in()
            .unwrap_or_else(|| Duration::from_secs(3600));
        let scope = response
            .scopes()
            .map(|scopes| scopes.iter().map(|s| s.as_str().to_owned()).collect())
            .unwrap_or_else(|| {
                Self::get_required_scopes()
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            });

        self.set_token(RedditToken {
            access_token: response.access_token().secret().clone(),
            expires_at: SystemTime::now() + expires_in,
            scope,
        });
        debug!("Reddit token valid for {:?}", expires_in);
        Ok(())
    }

    fn access_token(&self) -> Result<&str, CoreError> {
        match &self.auth_state {
            AuthState::Authenticated { token } if !token.is_expired() => {
                Ok(token.access_token.as_str())
            }
            AuthState::Authenticated { .. } | AuthState::TokenExpired { .. } => {
                Err(RedditApiError::InvalidToken.into())
            }
            AuthState::NotAuthenticated => Err(RedditApiError::AuthenticationFailed {
                reason: "Not authenticated; call authenticate() first".to_string(),
            }
            .into()),
        }
    }
}

impl FeedSource for RedditClient {
    async fn list_hot_items(
        &self,
        subreddit: &str,
        limit: u32,
    ) -> Result<Vec<FeedItem>, CoreError> {
        let access_token = self.access_token()?;
        let listing = self.api.get_hot_posts(access_token, subreddit, limit).await?;
        Ok(listing.into_feed_items())
    }
}

async fn send_token_request(
    http_client: Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let response = http_client
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}

fn invalid_url(e: url::ParseError) -> CoreError {
    CoreError::Internal {
        message: format!("Invalid Reddit OAuth URL: {}", e),
    }
}
