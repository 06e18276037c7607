#[cfg(test)]
mod tests {
    use crate::{AuthState, FeedSource, RedditClient, RedditOAuth2Config, RedditToken};
    use feedscribe_core::{CoreError, RedditApiError, RedditCredentials};
    use std::time::{Duration, SystemTime};

    fn create_test_config() -> RedditOAuth2Config {
        RedditOAuth2Config::new(
            "test_client_id".to_string(),
            "test_client_secret".to_string(),
            "feedscribe/1.0 by test_user".to_string(),
        )
    }

    fn token_expiring_at(expires_at: SystemTime) -> RedditToken {
        RedditToken {
            access_token: "token".to_string(),
            expires_at,
            scope: vec!["read".to_string()],
        }
    }

    #[test]
    fn test_config_from_credentials() {
        let credentials = RedditCredentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            user_agent: "feedscribe/1.0".to_string(),
        };
        let config = RedditOAuth2Config::from(&credentials);
        assert_eq!(config.client_id, "id");
        assert_eq!(config.client_secret, "secret");
        assert_eq!(config.user_agent, "feedscribe/1.0");
    }

    #[test]
    fn test_client_creation() {
        let client = RedditClient::new(create_test_config());
        assert!(client.is_ok());

        let client = client.unwrap();
        assert!(!client.is_authenticated());
        assert!(!client.needs_refresh());
        assert!(matches!(
            client.get_auth_state(),
            AuthState::NotAuthenticated
        ));
    }

    #[test]
    fn test_required_scopes() {
        assert_eq!(RedditClient::get_required_scopes(), vec!["read"]);
    }

    #[test]
    fn test_token_creation_and_expiry() {
        let now = SystemTime::now();
        let mut client = RedditClient::new(create_test_config()).unwrap();

        client.set_token(token_expiring_at(now + Duration::from_secs(3600)));
        assert!(client.is_authenticated());
        assert!(!client.needs_refresh());

        client.set_token(token_expiring_at(now - Duration::from_secs(3600)));
        assert!(!client.is_authenticated());
        assert!(client.needs_refresh());
        assert!(matches!(
            client.get_auth_state(),
            AuthState::TokenExpired { .. }
        ));

        // Inside the expiry margin counts as expired.
        client.set_token(token_expiring_at(now + Duration::from_secs(5)));
        assert!(client.needs_refresh());
    }

    #[test]
    fn test_listing_requires_authentication() {
        let client = RedditClient::new(create_test_config()).unwrap();
        let result = tokio_test::block_on(client.list_hot_items("LinkedInLunatics", 10));

        match result {
            Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed { reason })) => {
                assert!(reason.contains("Not authenticated"));
            }
            other => panic!("Expected AuthenticationFailed error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_listing_with_expired_token() {
        let mut client = RedditClient::new(create_test_config()).unwrap();
        client.set_token(token_expiring_at(
            SystemTime::now() - Duration::from_secs(10),
        ));

        let result = client.list_hot_items("LinkedInLunatics", 10).await;
        assert!(matches!(
            result,
            Err(CoreError::RedditApi(RedditApiError::InvalidToken))
        ));
    }

    #[test]
    fn test_token_serialization() {
        let token = RedditToken {
            access_token: "test_access_token".to_string(),
            expires_at: SystemTime::UNIX_EPOCH + Duration::from_secs(1640995200),
            scope: vec!["read".to_string()],
        };

        let serialized = serde_json::to_string(&token).unwrap();
        assert!(serialized.contains("test_access_token"));

        let deserialized: RedditToken = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized.access_token, token.access_token);
        assert_eq!(deserialized.expires_at, token.expires_at);
        assert_eq!(deserialized.scope, token.scope);
    }
}
