//! HTTP remote source

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use quotebox_store::{Quote, RemoteError, RemoteSource};

/// How many remote records are kept per fetch
pub const DEFAULT_LIMIT: usize = 10;

/// One record as served by the remote endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePost {
    pub id: u64,
    pub title: String,
    pub user_id: u64,
}

impl From<RemotePost> for Quote {
    fn from(post: RemotePost) -> Self {
        Quote {
            id: post.id,
            text: post.title,
            category: format!("User {}", post.user_id),
        }
    }
}

pub struct HttpRemote {
    client: reqwest::Client,
    url: Url,
    limit: usize,
}

impl HttpRemote {
    pub fn new(url: Url, limit: usize, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(Self { client, url, limit })
    }
}

#[async_trait]
impl RemoteSource for HttpRemote {
    async fn fetch_quotes(&self) -> Result<Vec<Quote>, RemoteError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(transport_error)?;
        let quotes = decode_posts(&body, self.limit)?;

        tracing::debug!(url = %self.url, count = quotes.len(), "Fetched remote quotes");

        Ok(quotes)
    }

    async fn post_quote(&self, quote: &Quote) -> Result<(), RemoteError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(quote)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(quote_id = quote.id, response = %body, "Remote accepted quote");

        Ok(())
    }
}

/// Decode a JSON array of post records, keeping the first `limit`.
pub(crate) fn decode_posts(body: &str, limit: usize) -> Result<Vec<Quote>, RemoteError> {
    let posts: Vec<RemotePost> =
        serde_json::from_str(body).map_err(|e| RemoteError::Decode(e.to_string()))?;

    Ok(posts.into_iter().take(limit).map(Quote::from).collect())
}

fn transport_error(e: reqwest::Error) -> RemoteError {
    let kind = if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else if e.is_decode() {
        "decode"
    } else {
        "request"
    };
    RemoteError::Transport(format!("{kind}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const POSTS: &str = r#"[
        {"userId": 1, "id": 1, "title": "sunt aut facere", "body": "quia et suscipit"},
        {"userId": 1, "id": 2, "title": "qui est esse", "body": "est rerum tempore"},
        {"userId": 2, "id": 11, "title": "et ea vero quia", "body": "delectus reiciendis"}
    ]"#;

    #[test]
    fn test_decode_posts_maps_fields() {
        let quotes = decode_posts(POSTS, DEFAULT_LIMIT).unwrap();
        assert_eq!(
            quotes,
            vec![
                Quote {
                    id: 1,
                    text: "sunt aut facere".into(),
                    category: "User 1".into()
                },
                Quote {
                    id: 2,
                    text: "qui est esse".into(),
                    category: "User 1".into()
                },
                Quote {
                    id: 11,
                    text: "et ea vero quia".into(),
                    category: "User 2".into()
                },
            ]
        );
    }

    #[test]
    fn test_decode_posts_applies_limit() {
        let quotes = decode_posts(POSTS, 2).unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[1].id, 2);
    }

    #[test]
    fn test_decode_posts_rejects_bad_payloads() {
        assert!(matches!(
            decode_posts(r#"{"id": 1}"#, 10),
            Err(RemoteError::Decode(_))
        ));
        assert!(matches!(
            decode_posts("<html>", 10),
            Err(RemoteError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Port 9 (discard) on localhost is closed in test environments
        let url = Url::parse("http://127.0.0.1:9/posts").unwrap();
        let remote = HttpRemote::new(url, DEFAULT_LIMIT, Duration::from_secs(2)).unwrap();

        let err = remote.fetch_quotes().await.unwrap_err();
        assert!(matches!(err, RemoteError::Transport(_)));
    }
}
