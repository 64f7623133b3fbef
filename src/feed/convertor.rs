use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use url::Url;

use super::error::{CardError, FeedError};
use super::fetcher::FeedFetcher;
use super::schema::{validate_feed, Card};
use crate::media::{MediaResolver, ResolveStrategy};
use crate::rss::{render, PodcastItem, PodcastModel, PODCAST_LANGUAGE};
use crate::transport::Transport;
use crate::util::{parse_publish_date, resolve_against};

pub const DEFAULT_POOL_SIZE: usize = 5;

/// How an item's `<guid>` is derived.
///
/// `EpisodeTitle` reproduces the historical behaviour: two episodes sharing
/// a title share a GUID, which some podcast clients treat as one episode.
/// `Hashed` mixes in the publish date and media URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidStrategy {
    #[default]
    EpisodeTitle,
    Hashed,
}

impl GuidStrategy {
    pub fn derive(self, title: &str, pub_date: &DateTime<Utc>, media_url: &Url) -> String {
        match self {
            GuidStrategy::EpisodeTitle => title.to_string(),
            GuidStrategy::Hashed => {
                let mut hasher = Sha256::new();
                hasher.update(title.as_bytes());
                hasher.update(b"\n");
                hasher.update(pub_date.to_rfc3339().as_bytes());
                hasher.update(b"\n");
                hasher.update(media_url.as_str().as_bytes());
                format!("{:x}", hasher.finalize())
            }
        }
    }
}

/// Parameters of a conversion, passed in explicitly by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    /// Provider origin; feed paths and relative images resolve against it.
    pub rai_base_url: Url,
    /// Public origin of this service.
    pub base_url: Url,
    /// Maximum media resolutions in flight at once.
    pub pool_size: usize,
    pub resolve_strategy: ResolveStrategy,
    pub guid_strategy: GuidStrategy,
}

impl ConvertConfig {
    pub fn new(rai_base_url: Url, base_url: Url) -> Self {
        Self {
            rai_base_url,
            base_url,
            pool_size: DEFAULT_POOL_SIZE,
            resolve_strategy: ResolveStrategy::default(),
            guid_strategy: GuidStrategy::default(),
        }
    }
}

/// Turns provider feed JSON into podcast RSS.
///
/// One `Convertor` can serve any number of conversions; it holds no
/// per-conversion state.
#[derive(Clone)]
pub struct Convertor {
    config: ConvertConfig,
    fetcher: FeedFetcher,
    resolver: MediaResolver,
}

impl Convertor {
    pub fn new(config: ConvertConfig, transport: Arc<dyn Transport>) -> Self {
        let fetcher = FeedFetcher::new(config.rai_base_url.clone(), Arc::clone(&transport));
        let resolver = MediaResolver::new(transport, config.resolve_strategy);
        Self {
            config,
            fetcher,
            resolver,
        }
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &FeedFetcher {
        &self.fetcher
    }

    /// Fetches the feed at `relative_path` from the provider and converts it.
    pub async fn convert_path(&self, relative_path: &str) -> Result<String, FeedError> {
        let json = self.fetcher.fetch(relative_path).await?;
        self.convert(&json).await
    }

    /// Converts an already fetched feed document to an RSS string.
    pub async fn convert(&self, json: &Value) -> Result<String, FeedError> {
        let model = self.build_model(json).await?;
        Ok(render(&model)?)
    }

    /// Validates `json` and resolves every card into a [`PodcastModel`].
    ///
    /// Cards are resolved at most `pool_size` at a time. Items keep the
    /// order of their cards whatever order the resolutions complete in.
    /// The first card to fail aborts the conversion; resolutions still in
    /// flight are dropped.
    ///
    /// # Errors
    ///
    /// - [`FeedError::Schema`] if the document does not validate
    /// - [`FeedError::InvalidReference`] if the podcast image cannot be resolved
    /// - [`FeedError::Card`] naming the first card that failed
    pub async fn build_model(&self, json: &Value) -> Result<PodcastModel, FeedError> {
        let doc = validate_feed(json)?;

        let image = resolve_against(&self.config.rai_base_url, &doc.image).map_err(|source| {
            FeedError::InvalidReference {
                reference: doc.image.clone(),
                source,
            }
        })?;

        let pool_size = self.config.pool_size.max(1);
        let mut slots: Vec<Option<PodcastItem>> = vec![None; doc.cards.len()];
        {
            // Cards move into their futures so the stream borrows nothing per item
            let mut results = stream::iter(doc.cards.into_iter().enumerate())
                .map(move |(index, card)| async move {
                    let result = self.convert_card(&card).await;
                    (index, card, result)
                })
                .buffer_unordered(pool_size);

            while let Some((index, card, result)) = results.next().await {
                match result {
                    Ok(item) => slots[index] = Some(item),
                    Err(source) => {
                        tracing::warn!(card = %card.episode_title, error = %source, "Card conversion failed");
                        return Err(FeedError::Card {
                            title: card.episode_title,
                            source,
                        });
                    }
                }
            }
        }

        let items: Vec<PodcastItem> = slots.into_iter().flatten().collect();
        tracing::debug!(title = %doc.title, items = items.len(), "Assembled podcast");

        Ok(PodcastModel {
            title: doc.title,
            description: doc.description,
            language: PODCAST_LANGUAGE,
            image,
            items,
        })
    }

    async fn convert_card(&self, card: &Card) -> Result<PodcastItem, CardError> {
        let image = resolve_against(&self.config.rai_base_url, &card.image).map_err(|source| {
            CardError::InvalidImageUrl {
                reference: card.image.clone(),
                source,
            }
        })?;
        let pub_date = parse_publish_date(&card.date)
            .ok_or_else(|| CardError::InvalidPublishDate(card.date.clone()))?;

        let media = self.resolver.resolve(&card.audio_url).await?;

        Ok(PodcastItem {
            title: card.episode_title.clone(),
            description: card.description.clone(),
            guid: self
                .config
                .guid_strategy
                .derive(&card.episode_title, &pub_date, &media.url),
            pub_date,
            media_url: media.url,
            media_size: media.size,
            media_content_type: media.content_type,
            image,
        })
    }
}
