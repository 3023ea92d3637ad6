//! Channel probing against the YouTube Data API v3 `search` endpoint.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::model::VideoInfo;

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3/";

// There are no retries, so a stalled probe would otherwise block the polling
// loop indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-channel probe failure. Never fatal for a cycle: the channel is skipped
/// and retried on the next one.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("channel id must be non-empty")]
    EmptyChannelId,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("unreadable api response: {source}; body: {body}")]
    Json {
        source: serde_json::Error,
        body: String,
    },
    #[error("no video in api response: {body}")]
    NoItems { body: String },
}

/// Seam for the metadata API so cycles can be driven by scripted probes in
/// tests.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// The most recently published video for the channel, as reported at
    /// query time.
    async fn latest_video(&self, channel_id: &str) -> Result<VideoInfo, ProbeError>;
}

#[derive(Clone)]
pub struct YoutubeClient {
    http: Client,
    search_url: Url,
    api_key: String,
}

impl fmt::Debug for YoutubeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YoutubeClient")
            .field("search_url", &self.search_url)
            .finish_non_exhaustive()
    }
}

impl YoutubeClient {
    pub fn new(api_key: String) -> Self {
        let base_url = Url::parse(YOUTUBE_API_BASE).expect("valid default YouTube URL");
        Self::with_base_url(api_key, base_url)
    }

    pub fn with_base_url(api_key: String, base_url: Url) -> Self {
        let http = Client::builder()
            .user_agent("vidwatch/0.1")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client");
        let search_url = base_url.join("search").expect("valid search endpoint");
        Self {
            http,
            search_url,
            api_key,
        }
    }

    /// Canonical watch URL for a video id.
    pub fn watch_url(video_id: &str) -> String {
        format!("https://www.youtube.com/watch?v={video_id}")
    }

    fn build_search_request(&self, channel_id: &str) -> Result<reqwest::Request, ProbeError> {
        let request = self
            .http
            .get(self.search_url.clone())
            .query(&[
                ("key", self.api_key.as_str()),
                ("channelId", channel_id),
                ("part", "snippet,id"),
                ("order", "date"),
                ("maxResults", "1"),
            ])
            .build()?;
        Ok(request)
    }
}

#[async_trait]
impl VideoSource for YoutubeClient {
    async fn latest_video(&self, channel_id: &str) -> Result<VideoInfo, ProbeError> {
        if channel_id.trim().is_empty() {
            return Err(ProbeError::EmptyChannelId);
        }

        let request = self.build_search_request(channel_id)?;
        let res = self.http.execute(request).await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(ProbeError::Status { status, body });
        }

        parse_search_response(&body)
    }
}

/// Extract the single newest video from a `search` response body. An empty
/// item list, or an item without a `videoId` (the endpoint also surfaces
/// channels and playlists), carries the raw body back for diagnosis.
fn parse_search_response(body: &str) -> Result<VideoInfo, ProbeError> {
    let parsed: SearchResponse = serde_json::from_str(body).map_err(|source| ProbeError::Json {
        source,
        body: body.to_string(),
    })?;

    let Some(item) = parsed.items.into_iter().next() else {
        return Err(ProbeError::NoItems {
            body: body.to_string(),
        });
    };
    let Some(video_id) = item.id.video_id else {
        return Err(ProbeError::NoItems {
            body: body.to_string(),
        });
    };

    Ok(VideoInfo {
        url: YoutubeClient::watch_url(&video_id),
        id: video_id,
        title: item.snippet.title,
        published_at: item.snippet.published_at,
    })
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchSnippet {
    title: String,
    #[serde(rename = "publishedAt")]
    published_at: Option<DateTime<Utc>>,
}
