use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::warn;

use super::feed::{fetch_news, NewsItem, NEWS_ENDPOINT};
use crate::core::error::LauncherResult;

pub const NEWS_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Default)]
struct NewsCache {
    items: Vec<NewsItem>,
    fetched_at: Option<Instant>,
}

/// Time-cached front for the blog feed. Serves stale posts when a refresh
/// fails and something was fetched before.
pub struct NewsService {
    client: reqwest::Client,
    endpoint: String,
    ttl: Duration,
    cache: Mutex<NewsCache>,
}

impl NewsService {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_endpoint(client, NEWS_ENDPOINT)
    }

    pub fn with_endpoint(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            ttl: NEWS_CACHE_TTL,
            cache: Mutex::new(NewsCache::default()),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub async fn get_news(&self, limit: usize) -> LauncherResult<Vec<NewsItem>> {
        let mut cache = self.cache.lock().await;

        let fresh = cache
            .fetched_at
            .is_some_and(|at| at.elapsed() < self.ttl);
        if fresh && !cache.items.is_empty() {
            return Ok(truncated(&cache.items, limit));
        }

        match fetch_news(&self.client, &self.endpoint, limit).await {
            Ok(items) => {
                cache.items = items.clone();
                cache.fetched_at = Some(Instant::now());
                Ok(items)
            }
            Err(e) if !cache.items.is_empty() => {
                warn!("News refresh failed, serving cached posts: {}", e);
                Ok(truncated(&cache.items, limit))
            }
            Err(e) => Err(e),
        }
    }
}

fn truncated(items: &[NewsItem], limit: usize) -> Vec<NewsItem> {
    items.iter().take(limit).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const BODY: &str = r#"[
        { "title": "One", "slug": "one", "publishedAt": "2026-02-01T10:00:00Z", "coverImage": { "s3Key": "1.png" } },
        { "title": "Two", "slug": "two", "publishedAt": "2026-02-02T10:00:00Z", "coverImage": { "s3Key": "2.png" } },
        { "title": "Three", "slug": "three", "publishedAt": "2026-02-03T10:00:00Z", "coverImage": { "s3Key": "3.png" } }
    ]"#;

    #[tokio::test]
    async fn second_call_is_served_from_cache() {
        let server = MockServer::start_async().await;
        let feed = server
            .mock_async(|when, then| {
                when.method(GET).path("/posts").query_param("limit", "3");
                then.status(200).body(BODY);
            })
            .await;

        let service = NewsService::with_endpoint(reqwest::Client::new(), server.url("/posts"));
        let first = service.get_news(3).await.unwrap();
        let second = service.get_news(2).await.unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 2);
        assert_eq!(second[0].title, "One");
        assert_eq!(feed.hits_async().await, 1);
    }

    #[tokio::test]
    async fn failed_refresh_serves_stale_posts() {
        let server = MockServer::start_async().await;
        let mut feed = server
            .mock_async(|when, then| {
                when.method(GET).path("/posts");
                then.status(200).body(BODY);
            })
            .await;

        let service = NewsService::with_endpoint(reqwest::Client::new(), server.url("/posts"))
            .with_ttl(Duration::ZERO);
        assert_eq!(service.get_news(3).await.unwrap().len(), 3);

        feed.delete_async().await;
        feed = server
            .mock_async(|when, then| {
                when.method(GET).path("/posts");
                then.status(503);
            })
            .await;

        let stale = service.get_news(1).await.unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].slug, "one");
        assert_eq!(feed.hits_async().await, 1);
    }

    #[tokio::test]
    async fn failure_without_cache_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/posts");
                then.status(500);
            })
            .await;

        let service = NewsService::with_endpoint(reqwest::Client::new(), server.url("/posts"));
        assert!(service.get_news(5).await.is_err());
    }
}
