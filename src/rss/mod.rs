//! Podcast model and its RSS 2.0 / iTunes serialization.

mod model;
mod render;

pub use model::{PodcastItem, PodcastModel, PODCAST_LANGUAGE};
pub use render::{render, render_at, RenderError};
