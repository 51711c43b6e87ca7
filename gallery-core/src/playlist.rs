//! Video-playlist enrichment backed by the YouTube Data API v3.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const PAGE_SIZE: &str = "50";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistKind {
    Youtube,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    #[serde(rename = "type")]
    pub kind: PlaylistKind,
    pub id: String,
    pub thumb: String,
    pub caption: String,
}

#[async_trait]
pub trait PlaylistSource: Send + Sync {
    /// Every entry of the playlist named `name`; empty when there is none.
    async fn fetch_playlist(&self, name: &str) -> Result<Vec<PlaylistEntry>>;
}

#[derive(Debug, Clone)]
pub struct YoutubeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    channel_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    next_page_token: Option<String>,
    // Vec::new keeps serde from demanding `T: Default`
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Playlist {
    id: String,
    snippet: PlaylistSnippet,
}

#[derive(Debug, Deserialize)]
struct PlaylistSnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: ItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemSnippet {
    title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
    resource_id: ResourceId,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: Option<String>,
}

impl Thumbnails {
    fn best(&self) -> Option<&str> {
        self.high
            .as_ref()
            .or(self.medium.as_ref())
            .or(self.default.as_ref())
            .map(|t| t.url.as_str())
    }
}

impl YoutubeClient {
    pub fn new(api_key: String, channel_id: String) -> Self {
        Self::with_base_url(YOUTUBE_API_BASE.to_string(), api_key, channel_id)
    }

    pub fn with_base_url(base_url: String, api_key: String, channel_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            channel_id,
        }
    }

    async fn get_page<T: serde::de::DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, &str)],
        page_token: Option<&str>,
    ) -> Result<Page<T>> {
        let url = format!("{}/{}", self.base_url, resource);
        let mut request = self
            .http
            .get(&url)
            .query(&[("part", "snippet"), ("maxResults", PAGE_SIZE), ("key", self.api_key.as_str())])
            .query(params);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let page = request
            .send()
            .await
            .with_context(|| format!("Failed to call YouTube {resource}"))?
            .error_for_status()
            .with_context(|| format!("YouTube {resource} returned an error"))?
            .json::<Page<T>>()
            .await
            .with_context(|| format!("Failed to decode YouTube {resource} response"))?;

        Ok(page)
    }

    async fn find_playlist_id(&self, name: &str) -> Result<Option<String>> {
        let mut page_token: Option<String> = None;

        loop {
            let page: Page<Playlist> = self
                .get_page(
                    "playlists",
                    &[("channelId", self.channel_id.as_str())],
                    page_token.as_deref(),
                )
                .await?;

            if let Some(found) = page.items.into_iter().find(|p| p.snippet.title == name) {
                return Ok(Some(found.id));
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => return Ok(None),
            }
        }
    }

    async fn list_items(&self, playlist_id: &str) -> Result<Vec<PlaylistEntry>> {
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page: Page<PlaylistItem> = self
                .get_page(
                    "playlistItems",
                    &[("playlistId", playlist_id)],
                    page_token.as_deref(),
                )
                .await?;

            // Deleted and private videos come back without thumbnails.
            entries.extend(page.items.into_iter().filter_map(|item| {
                let snippet = item.snippet;
                let thumb = snippet.thumbnails.best()?.to_string();
                Some(PlaylistEntry {
                    kind: PlaylistKind::Youtube,
                    id: snippet.resource_id.video_id?,
                    thumb,
                    caption: snippet.title,
                })
            }));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(entries)
    }
}

#[async_trait]
impl PlaylistSource for YoutubeClient {
    async fn fetch_playlist(&self, name: &str) -> Result<Vec<PlaylistEntry>> {
        tracing::debug!("YouTube playlist lookup: channel={}, name={}", self.channel_id, name);

        let Some(playlist_id) = self.find_playlist_id(name).await? else {
            tracing::debug!("No YouTube playlist named {}", name);
            return Ok(Vec::new());
        };

        let entries = self.list_items(&playlist_id).await?;
        tracing::debug!("YouTube playlist {} has {} entries", playlist_id, entries.len());
        Ok(entries)
    }
}
