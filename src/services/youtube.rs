//! YouTube search proxy client
//!
//! Thin wrapper over the YouTube Data API search endpoint, used by the
//! dashboard to attach videos to programs without shipping the API key to
//! the browser. Responses are mapped down to the fields the dashboard
//! shows.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::services::ai::AiClientError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One mapped search result
#[derive(Debug, Clone, Serialize)]
pub struct YoutubeSearchResult {
    pub video_id: String,
    pub title: String,
    pub channel: String,
    pub thumbnail: Option<String>,
    pub published_at: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: SearchSnippet,
}

#[derive(Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Deserialize)]
struct SearchSnippet {
    title: String,
    #[serde(rename = "channelTitle")]
    channel_title: String,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    thumbnails: Option<SearchThumbnails>,
}

#[derive(Deserialize)]
struct SearchThumbnails {
    medium: Option<SearchThumbnail>,
    default: Option<SearchThumbnail>,
}

#[derive(Deserialize)]
struct SearchThumbnail {
    url: String,
}

/// Client for the YouTube Data API search endpoint
pub struct YoutubeClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl YoutubeClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// Search for videos matching the query.
    pub async fn search(
        &self,
        query: &str,
        max_results: u8,
    ) -> Result<Vec<YoutubeSearchResult>, AiClientError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("q", query),
                ("maxResults", &max_results.to_string()),
                ("key", &self.api_key),
            ])
            .send()
            .await
            .map_err(|e| AiClientError::ConnectionFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AiClientError::ConnectionFailed(format!(
                "status {}",
                response.status()
            )));
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| AiClientError::BadResponse(e.to_string()))?;

        Ok(search
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                let thumbnail = item
                    .snippet
                    .thumbnails
                    .and_then(|t| t.medium.or(t.default))
                    .map(|t| t.url);
                Some(YoutubeSearchResult {
                    video_id,
                    title: item.snippet.title,
                    channel: item.snippet.channel_title,
                    thumbnail,
                    published_at: item.snippet.published_at,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connection_failed() {
        let client = YoutubeClient::new("http://127.0.0.1:1/search", "key");
        let result = client.search("campus radio", 5).await;
        assert!(matches!(result, Err(AiClientError::ConnectionFailed(_))));
    }

    #[test]
    fn test_response_mapping_skips_items_without_video_id() {
        let payload = serde_json::json!({
            "items": [
                {
                    "id": { "videoId": "abc123" },
                    "snippet": {
                        "title": "Live set",
                        "channelTitle": "Station",
                        "publishedAt": "2026-01-01T00:00:00Z",
                        "thumbnails": { "medium": { "url": "https://img/1.jpg" } }
                    }
                },
                {
                    "id": {},
                    "snippet": { "title": "Playlist", "channelTitle": "Station" }
                }
            ]
        });

        let search: SearchResponse = serde_json::from_value(payload).unwrap();
        let mapped: Vec<YoutubeSearchResult> = search
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                Some(YoutubeSearchResult {
                    video_id,
                    title: item.snippet.title,
                    channel: item.snippet.channel_title,
                    thumbnail: None,
                    published_at: item.snippet.published_at,
                })
            })
            .collect();

        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].video_id, "abc123");
    }
}
