//! Google API request builders.
//!
//! Each call resolves its credentials through the [`SecretProvider`] at call
//! time, so a rotated key is picked up once the cached value ages out.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::BrokerError;
use crate::secrets::{names, SecretProvider};
use crate::upstream::client::ApiClient;
use crate::upstream::error::ApiError;

/// YouTube Data API caps `maxResults` at 50.
pub const MAX_VIDEO_RESULTS: u32 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub thumbnail_url: Option<String>,
}

pub struct Upstreams {
    client: ApiClient,
    secrets: Arc<SecretProvider>,
    config: UpstreamConfig,
}

impl Upstreams {
    pub fn new(client: ApiClient, secrets: Arc<SecretProvider>, config: UpstreamConfig) -> Self {
        Self {
            client,
            secrets,
            config,
        }
    }

    pub fn secrets(&self) -> &Arc<SecretProvider> {
        &self.secrets
    }

    /// Generate text for `prompt` with the configured Gemini model.
    pub async fn gemini_generate(&self, prompt: &str) -> Result<String, BrokerError> {
        let key = self.secrets.get(names::GEMINI_API_KEY).await?;
        let mut url = parse_url(&format!(
            "{}/models/{}:generateContent",
            self.config.gemini_base_url.trim_end_matches('/'),
            self.config.gemini_model
        ))?;
        url.query_pairs_mut().append_pair("key", &key);

        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });
        let response = self.client.post_json(url, &body).await?;
        Ok(generated_text(&response)?)
    }

    /// Web results for `query` from the Custom Search JSON API.
    pub async fn custom_search(&self, query: &str) -> Result<Vec<SearchItem>, BrokerError> {
        let key = self.secrets.get(names::SEARCH_API_KEY).await?;
        let engine = self.secrets.get(names::SEARCH_ENGINE_ID).await?;
        let mut url = parse_url(&self.config.custom_search_url)?;
        url.query_pairs_mut()
            .append_pair("key", &key)
            .append_pair("cx", &engine)
            .append_pair("q", query);

        let response = self.client.get_json(url).await?;
        Ok(search_items(&response)?)
    }

    /// Video results for `query`; `max_results` is clamped to 1..=50.
    pub async fn youtube_search(&self, query: &str, max_results: u32) -> Result<Vec<VideoItem>, BrokerError> {
        let key = self.secrets.get(names::YOUTUBE_API_KEY).await?;
        let max_results = max_results.clamp(1, MAX_VIDEO_RESULTS);
        let mut url = parse_url(&format!("{}/search", self.config.youtube_base_url.trim_end_matches('/')))?;
        url.query_pairs_mut()
            .append_pair("part", "snippet")
            .append_pair("type", "video")
            .append_pair("maxResults", &max_results.to_string())
            .append_pair("q", query)
            .append_pair("key", &key);

        let response = self.client.get_json(url).await?;
        Ok(video_items(&response)?)
    }
}

impl std::fmt::Debug for Upstreams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upstreams").field("config", &self.config).finish()
    }
}

fn parse_url(raw: &str) -> Result<Url, ApiError> {
    Url::parse(raw).map_err(|e| ApiError::InvalidRequest(format!("{}: {}", raw, e)))
}

/// Concatenated text parts of the first candidate.
pub fn generated_text(response: &Value) -> Result<String, ApiError> {
    let parts = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            let reason = response
                .pointer("/promptFeedback/blockReason")
                .and_then(Value::as_str)
                .unwrap_or("no candidates");
            ApiError::Decode(format!("generation returned no text ({})", reason))
        })?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    if text.is_empty() {
        return Err(ApiError::Decode("generation returned empty text".to_string()));
    }
    Ok(text)
}

/// Custom Search omits `items` entirely when nothing matches.
pub fn search_items(response: &Value) -> Result<Vec<SearchItem>, ApiError> {
    match response.get("items") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(items) => serde_json::from_value(items.clone()).map_err(|e| ApiError::Decode(e.to_string())),
    }
}

pub fn video_items(response: &Value) -> Result<Vec<VideoItem>, ApiError> {
    let Some(items) = response.get("items").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    Ok(items
        .iter()
        .filter_map(|item| {
            let video_id = item.pointer("/id/videoId")?.as_str()?;
            let snippet = item.get("snippet")?;
            Some(VideoItem {
                video_id: video_id.to_string(),
                title: snippet.get("title").and_then(Value::as_str).unwrap_or_default().to_string(),
                channel_title: snippet
                    .get("channelTitle")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                thumbnail_url: snippet
                    .pointer("/thumbnails/medium/url")
                    .or_else(|| snippet.pointer("/thumbnails/default/url"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_text_joins_parts() {
        let response = json!({
            "candidates": [{ "content": { "parts": [{ "text": "비가 " }, { "text": "온다" }] } }]
        });
        assert_eq!(generated_text(&response).unwrap(), "비가 온다");
    }

    #[test]
    fn test_blocked_prompt_is_decode_error() {
        let response = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = generated_text(&response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_search_items_absent_means_empty() {
        assert!(search_items(&json!({ "searchInformation": {} })).unwrap().is_empty());

        let items = search_items(&json!({
            "items": [{ "title": "Rain", "link": "https://example.com/rain", "snippet": "a poem" }]
        }))
        .unwrap();
        assert_eq!(items[0].title, "Rain");
    }

    #[test]
    fn test_video_items_skip_non_videos() {
        let response = json!({
            "items": [
                { "id": { "kind": "youtube#channel", "channelId": "c1" }, "snippet": { "title": "chan" } },
                {
                    "id": { "kind": "youtube#video", "videoId": "abc123" },
                    "snippet": {
                        "title": "Calm piano",
                        "channelTitle": "Lofi",
                        "thumbnails": { "default": { "url": "https://i.ytimg.com/vi/abc123/default.jpg" } }
                    }
                }
            ]
        });
        let videos = video_items(&response).unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].video_id, "abc123");
        assert_eq!(videos[0].thumbnail_url.as_deref(), Some("https://i.ytimg.com/vi/abc123/default.jpg"));
    }
}
