//! The genre listing page, rendered from the provider's `generi.json`.

use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};
use quick_xml::escape::escape;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use super::router::AppState;
use crate::feed::schema::{field, Checker};
use crate::feed::{FeedError, FeedFetcher, SchemaError};
use crate::util::resolve_against;

pub const GENRES_PATH: &str = "generi.json";

#[derive(Debug, Error)]
pub enum GenresError {
    #[error(transparent)]
    Fetch(#[from] FeedError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("Invalid genre link {path_id}: {source}")]
    InvalidLink {
        path_id: String,
        #[source]
        source: url::ParseError,
    },
}

impl GenresError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GenresError::Fetch(FeedError::NotFound { .. }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genre {
    pub title: String,
    pub weblink: String,
    pub path_id: String,
}

/// Validates `{ block: { cards: [{ title, weblink, path_id }] } }`.
pub fn validate_genres(json: &Value) -> Result<Vec<Genre>, SchemaError> {
    let mut checker = Checker::new("genres");

    let root = checker.object(Some(json), "");
    let block = checker.object(field(root, "block"), "block");
    let cards = checker.array(field(block, "cards"), "block.cards");

    let genres = cards.map(|cards| {
        cards
            .iter()
            .enumerate()
            .filter_map(|(i, card)| {
                let path = format!("block.cards[{i}]");
                let obj = checker.object(Some(card), &path);
                let title = checker.string(field(obj, "title"), &format!("{path}.title"));
                let weblink = checker.string(field(obj, "weblink"), &format!("{path}.weblink"));
                let path_id = checker.string(field(obj, "path_id"), &format!("{path}.path_id"));
                Some(Genre {
                    title: title?,
                    weblink: weblink?,
                    path_id: path_id?,
                })
            })
            .collect::<Vec<_>>()
    });

    checker.finish(genres)
}

/// Renders one link per genre, each pointing at `path_id` under `base_url`.
pub fn render_genres(base_url: &Url, genres: &[Genre]) -> Result<String, GenresError> {
    let mut html = String::from(r#"<div class="genre"><h1>Genres</h1><div class="genre-list">"#);
    for genre in genres {
        let href = resolve_against(base_url, &genre.path_id).map_err(|source| {
            GenresError::InvalidLink {
                path_id: genre.path_id.clone(),
                source,
            }
        })?;
        html.push_str(&format!(
            r#"<div class="genre-card"><a href="{}"><h2>{}</h2></a></div>"#,
            escape(href.as_str()),
            escape(genre.title.as_str()),
        ));
    }
    html.push_str("</div></div>");
    Ok(html)
}

/// Fetches, validates and renders the genre listing.
pub async fn genres_html(fetcher: &FeedFetcher, base_url: &Url) -> Result<String, GenresError> {
    let json = fetcher.fetch(GENRES_PATH).await?;
    let genres = validate_genres(&json)?;
    tracing::debug!(count = genres.len(), "Rendering genres");
    render_genres(base_url, &genres)
}

pub(super) async fn genres_page(State(state): State<AppState>) -> Response {
    let convertor = &state.convertor;
    match genres_html(convertor.fetcher(), &convertor.config().base_url).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => e.into_response(),
    }
}
