//! Structural validation of provider JSON.
//!
//! Validation walks the untyped document and records *every* mismatch
//! (path, expected type, received type) instead of stopping at the first,
//! so a single error response tells the whole story of a provider change.

use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use url::Url;

/// One field that did not match the expected shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Dotted path, e.g. `block.cards[2].episode_title`.
    pub path: String,
    pub expected: &'static str,
    pub received: &'static str,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, received {}",
            self.path, self.expected, self.received
        )
    }
}

/// A JSON document that does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to parse {document} JSON: {}", join_violations(.violations))]
pub struct SchemaError {
    /// Which document kind was being validated ("feed", "genres").
    pub document: &'static str,
    pub violations: Vec<SchemaViolation>,
}

fn join_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A validated feed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedDocument {
    pub title: String,
    pub description: String,
    /// Podcast artwork, possibly relative to the provider base URL.
    pub image: String,
    /// In provider order.
    pub cards: Vec<Card>,
}

/// One episode entry of a [`FeedDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub episode_title: String,
    /// Empty when the provider omits it.
    pub description: String,
    pub image: String,
    /// Absolute URL (checked structurally only).
    pub audio_url: String,
    pub date: String,
}

/// Validates a provider feed document.
///
/// Expected shape:
///
/// ```text
/// { title, podcast_info: { description, image },
///   block: { cards: [ { episode_title, description?, image,
///                       downloadable_audio: { url }, track_info: { date } } ] } }
/// ```
///
/// # Errors
///
/// Returns a [`SchemaError`] listing every violation found.
pub fn validate_feed(json: &Value) -> Result<FeedDocument, SchemaError> {
    let mut checker = Checker::new("feed");

    let root = checker.object(Some(json), "");
    let title = checker.string(field(root, "title"), "title");

    let info = checker.object(field(root, "podcast_info"), "podcast_info");
    let description = checker.string(field(info, "description"), "podcast_info.description");
    let image = checker.string(field(info, "image"), "podcast_info.image");

    let block = checker.object(field(root, "block"), "block");
    let cards = checker.array(field(block, "cards"), "block.cards");

    let cards: Vec<Option<Card>> = cards
        .map(|cards| {
            cards
                .iter()
                .enumerate()
                .map(|(i, card)| validate_card(&mut checker, card, &format!("block.cards[{i}]")))
                .collect()
        })
        .unwrap_or_default();

    let doc = match (title, description, image) {
        (Some(title), Some(description), Some(image)) => Some(FeedDocument {
            title,
            description,
            image,
            cards: cards.into_iter().flatten().collect(),
        }),
        _ => None,
    };
    checker.finish(doc)
}

fn validate_card(checker: &mut Checker, card: &Value, path: &str) -> Option<Card> {
    let obj = checker.object(Some(card), path);
    let episode_title = checker.string(field(obj, "episode_title"), &format!("{path}.episode_title"));
    let description = checker.optional_string(field(obj, "description"), &format!("{path}.description"));
    let image = checker.string(field(obj, "image"), &format!("{path}.image"));

    let audio = checker.object(field(obj, "downloadable_audio"), &format!("{path}.downloadable_audio"));
    let audio_url = checker.absolute_url(field(audio, "url"), &format!("{path}.downloadable_audio.url"));

    let track = checker.object(field(obj, "track_info"), &format!("{path}.track_info"));
    let date = checker.string(field(track, "date"), &format!("{path}.track_info.date"));

    Some(Card {
        episode_title: episode_title?,
        description: description?.unwrap_or_default(),
        image: image?,
        audio_url: audio_url?,
        date: date?,
    })
}

/// Looks up `key` in an optional parent object.
///
/// A missing parent yields `None` without a violation of its own: the
/// parent has already been reported, and its children would only add noise.
pub(crate) fn field<'a>(parent: Option<&'a Map<String, Value>>, key: &str) -> Lookup<'a> {
    match parent {
        Some(map) => Lookup::Present(map.get(key)),
        None => Lookup::ParentInvalid,
    }
}

#[derive(Clone, Copy)]
pub(crate) enum Lookup<'a> {
    Present(Option<&'a Value>),
    ParentInvalid,
}

impl<'a> From<Option<&'a Value>> for Lookup<'a> {
    fn from(value: Option<&'a Value>) -> Self {
        Lookup::Present(value)
    }
}

/// Accumulates violations while extracting typed values.
pub(crate) struct Checker {
    document: &'static str,
    violations: Vec<SchemaViolation>,
}

impl Checker {
    pub(crate) fn new(document: &'static str) -> Self {
        Self {
            document,
            violations: Vec::new(),
        }
    }

    /// Returns `value` if nothing was reported along the way.
    pub(crate) fn finish<T>(self, value: Option<T>) -> Result<T, SchemaError> {
        match value {
            Some(value) if self.violations.is_empty() => Ok(value),
            _ => Err(SchemaError {
                document: self.document,
                violations: self.violations,
            }),
        }
    }

    fn violation(&mut self, path: &str, expected: &'static str, received: Option<&Value>) {
        self.violations.push(SchemaViolation {
            path: if path.is_empty() { "<root>".to_string() } else { path.to_string() },
            expected,
            received: type_name(received),
        });
    }

    pub(crate) fn object<'a>(
        &mut self,
        value: impl Into<Lookup<'a>>,
        path: &str,
    ) -> Option<&'a Map<String, Value>> {
        match value.into() {
            Lookup::ParentInvalid => None,
            Lookup::Present(Some(Value::Object(map))) => Some(map),
            Lookup::Present(other) => {
                self.violation(path, "object", other);
                None
            }
        }
    }

    pub(crate) fn array<'a>(
        &mut self,
        value: impl Into<Lookup<'a>>,
        path: &str,
    ) -> Option<&'a Vec<Value>> {
        match value.into() {
            Lookup::ParentInvalid => None,
            Lookup::Present(Some(Value::Array(items))) => Some(items),
            Lookup::Present(other) => {
                self.violation(path, "array", other);
                None
            }
        }
    }

    pub(crate) fn string<'a>(&mut self, value: impl Into<Lookup<'a>>, path: &str) -> Option<String> {
        match value.into() {
            Lookup::ParentInvalid => None,
            Lookup::Present(Some(Value::String(s))) => Some(s.clone()),
            Lookup::Present(other) => {
                self.violation(path, "string", other);
                None
            }
        }
    }

    /// `Some(None)` when absent, `None` when present with the wrong type.
    pub(crate) fn optional_string<'a>(
        &mut self,
        value: impl Into<Lookup<'a>>,
        path: &str,
    ) -> Option<Option<String>> {
        match value.into() {
            Lookup::ParentInvalid => None,
            Lookup::Present(None) => Some(None),
            Lookup::Present(Some(Value::String(s))) => Some(Some(s.clone())),
            Lookup::Present(other) => {
                self.violation(path, "string", other);
                None
            }
        }
    }

    pub(crate) fn absolute_url<'a>(
        &mut self,
        value: impl Into<Lookup<'a>>,
        path: &str,
    ) -> Option<String> {
        let lookup = value.into();
        if let Lookup::Present(Some(v)) = lookup {
            if let Value::String(s) = v {
                if Url::parse(s).is_err() {
                    self.violation(path, "absolute URL", Some(v));
                    return None;
                }
            }
        }
        self.string(lookup, path)
    }
}

fn type_name(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}
