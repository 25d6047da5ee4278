use std::time::Duration;

use crate::{
    assets::decode::{PreparedImage, decode_image},
    foundation::error::{ChatreelError, ChatreelResult},
};

const YOUTUBE_CHANNELS_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/channels";
const USER_AGENT: &str = concat!("chatreel/", env!("CARGO_PKG_VERSION"));

/// Byte-level HTTP access used by image resolution.
///
/// Normalization is sequential, so implementations may block.
pub trait HttpClient {
    fn get_bytes(&self, url: &str) -> ChatreelResult<Vec<u8>>;
}

/// Blocking `reqwest` client.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    pub fn new() -> ChatreelResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| ChatreelError::fetch(format!("failed to build http client: {e}")))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get_bytes(&self, url: &str) -> ChatreelResult<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| ChatreelError::fetch(format!("GET {url}: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ChatreelError::fetch(format!("GET {url}: status {status}")));
        }
        let bytes = resp
            .bytes()
            .map_err(|e| ChatreelError::fetch(format!("GET {url}: reading body: {e}")))?;
        Ok(bytes.to_vec())
    }
}

/// Download `url` and decode it.
pub fn fetch_image(http: &dyn HttpClient, url: &str) -> ChatreelResult<PreparedImage> {
    let bytes = http.get_bytes(url)?;
    decode_image(&bytes)
}

#[derive(serde::Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(serde::Deserialize)]
struct ChannelItem {
    snippet: Option<ChannelSnippet>,
}

#[derive(serde::Deserialize)]
struct ChannelSnippet {
    thumbnails: Option<ChannelThumbnails>,
}

#[derive(serde::Deserialize)]
struct ChannelThumbnails {
    default: Option<ThumbnailUrl>,
    medium: Option<ThumbnailUrl>,
    high: Option<ThumbnailUrl>,
}

#[derive(serde::Deserialize)]
struct ThumbnailUrl {
    url: String,
}

/// Look up a channel's avatar URL through the YouTube Data API.
///
/// `Ok(None)` means the API answered but had no thumbnail for the channel.
pub fn channel_thumbnail_url(
    http: &dyn HttpClient,
    channel_id: &str,
    api_key: &str,
) -> ChatreelResult<Option<String>> {
    let url = channel_lookup_url(channel_id, api_key)?;
    let body = http.get_bytes(&url)?;
    let resp: ChannelListResponse = serde_json::from_slice(&body)
        .map_err(|e| ChatreelError::fetch(format!("channel lookup for {channel_id}: {e}")))?;

    Ok(resp
        .items
        .into_iter()
        .filter_map(|item| item.snippet?.thumbnails)
        .find_map(|t| t.default.or(t.medium).or(t.high))
        .map(|t| t.url))
}

fn channel_lookup_url(channel_id: &str, api_key: &str) -> ChatreelResult<String> {
    let url = reqwest::Url::parse_with_params(
        YOUTUBE_CHANNELS_ENDPOINT,
        &[("part", "snippet"), ("id", channel_id), ("key", api_key)],
    )
    .map_err(|e| ChatreelError::fetch(format!("channel lookup url: {e}")))?;
    Ok(url.into())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fetch.rs"]
mod tests;
