//! Media resolution for episode audio.
//!
//! - [`relinker`] - validates the shape of provider indirection URLs
//! - [`resolver`] - probes those URLs for the playable media location

mod relinker;
mod resolver;

pub use relinker::{RelinkerUrl, RelinkerUrlError, RELINKER_PATH};
pub use resolver::{
    MediaError, MediaInfo, MediaResolver, ResolveStrategy, CHROME_USER_AGENT, EXPECTED_CONTENT_TYPE,
};
