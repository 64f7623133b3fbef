//! A wiremock stand-in for the provider: feed documents plus a relinker
//! that redirects to media files.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::Arc;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use raiplayrss::feed::ConvertConfig;
use raiplayrss::transport::{ReqwestTransport, Transport, DEFAULT_TIMEOUT};

pub const RELINKER_PATH: &str = "/relinker/relinkerServlet.htm";

pub fn transport() -> Arc<dyn Transport> {
    Arc::new(ReqwestTransport::new(DEFAULT_TIMEOUT).unwrap())
}

pub fn convert_config(server: &MockServer, pool_size: usize) -> ConvertConfig {
    let mut config = ConvertConfig::new(
        Url::parse(&format!("{}/", server.uri())).unwrap(),
        Url::parse("https://test.dev/").unwrap(),
    );
    config.pool_size = pool_size;
    config
}

pub fn card(server: &MockServer, title: &str, cont: &str, date: &str) -> Value {
    json!({
        "episode_title": title,
        "description": format!("About {title}"),
        "image": format!("/img/{cont}.jpg"),
        "downloadable_audio": { "url": format!("{}{RELINKER_PATH}?cont={cont}", server.uri()) },
        "track_info": { "date": date }
    })
}

pub fn feed(title: &str, cards: Vec<Value>) -> Value {
    json!({
        "title": title,
        "podcast_info": {
            "description": "Gialli alla radio",
            "image": "/img/podcast.jpg"
        },
        "block": { "cards": cards }
    })
}

pub async fn mount_feed(server: &MockServer, feed_path: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(feed_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Relinker redirect for `cont`, and a `size`-byte MP3 behind it.
pub async fn mount_media(server: &MockServer, cont: &str, size: usize) {
    let media_path = format!("/media/{cont}.mp3");
    Mock::given(method("HEAD"))
        .and(path(RELINKER_PATH))
        .and(query_param("cont", cont))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}{media_path}", server.uri()).as_str()),
        )
        .mount(server)
        .await;
    Mock::given(method("HEAD"))
        .and(path(media_path.as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "audio/mpeg")
                .insert_header("Content-Length", size.to_string().as_str())
                .set_body_bytes(vec![0u8; size]),
        )
        .mount(server)
        .await;
}

pub fn media_url(server: &MockServer, cont: &str) -> String {
    format!("{}/media/{cont}.mp3", server.uri())
}
