//! Serves RaiPlay Sound programmes as podcast RSS feeds.
//!
//! The provider publishes each programme as a JSON document of episode
//! "cards" whose audio sits behind a relinker redirect. This crate fetches
//! that document, validates it, resolves every card's media with bounded
//! concurrency, and renders RSS 2.0 with iTunes extensions.

pub mod config;
pub mod feed;
pub mod media;
pub mod rss;
pub mod server;
pub mod transport;
pub mod util;
