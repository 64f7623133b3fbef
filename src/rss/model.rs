use chrono::{DateTime, Utc};
use url::Url;

/// Feeds are always published as Italian.
pub const PODCAST_LANGUAGE: &str = "it";

/// A podcast channel ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct PodcastModel {
    pub title: String,
    pub description: String,
    pub language: &'static str,
    pub image: Url,
    /// Same order as the cards they were built from.
    pub items: Vec<PodcastItem>,
}

/// One episode of a [`PodcastModel`].
#[derive(Debug, Clone, PartialEq)]
pub struct PodcastItem {
    pub title: String,
    pub description: String,
    pub guid: String,
    pub pub_date: DateTime<Utc>,
    pub media_url: Url,
    pub media_size: u64,
    pub media_content_type: String,
    pub image: Url,
}
