use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse, Response};

const ENGLISH_INDEX: &str = include_str!("../../static/index.en.html");
const ITALIAN_INDEX: &str = include_str!("../../static/index.it.html");

/// Serves the Italian page to clients whose `Accept-Language` starts with
/// `it`, the English page to everyone else.
pub(super) async fn index(headers: HeaderMap) -> Response {
    let (language, page) = if wants_italian(&headers) {
        ("it", ITALIAN_INDEX)
    } else {
        ("en", ENGLISH_INDEX)
    };
    ([(header::CONTENT_LANGUAGE, language)], Html(page)).into_response()
}

fn wants_italian(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("it"))
}
