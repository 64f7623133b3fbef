use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use quick_xml::escape::escape;

use super::genres::GenresError;
use crate::feed::FeedError;

/// Body of every unmatched route.
pub const NOT_FOUND_TEXT: &str = "Not found.";

pub(super) fn not_found() -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND_TEXT).into_response()
}

/// `<error><code>..</code><message>..</message></error>` with `message` escaped.
pub fn xml_error_body(code: u16, message: &str) -> String {
    format!(
        "<error><code>{code}</code><message>{}</message></error>",
        escape(message)
    )
}

/// A failed feed conversion, answered with an XML error envelope.
#[derive(Debug)]
pub struct FeedFailure(pub FeedError);

impl IntoResponse for FeedFailure {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if status == StatusCode::NOT_FOUND {
            tracing::warn!(error = %self.0, "Feed not found");
            "Not Found".to_string()
        } else {
            tracing::error!(error = %self.0, "Error converting feed");
            self.0.to_string()
        };

        (
            status,
            [(header::CONTENT_TYPE, "application/xml")],
            xml_error_body(status.as_u16(), &message),
        )
            .into_response()
    }
}

impl IntoResponse for GenresError {
    fn into_response(self) -> Response {
        if self.is_not_found() {
            tracing::warn!(error = %self, "Genres not found");
            return not_found();
        }

        tracing::error!(error = %self, "Error rendering genres");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to process request",
        )
            .into_response()
    }
}
