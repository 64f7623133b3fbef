//! Provider feed retrieval and conversion to podcast RSS.
//!
//! The pipeline runs one direction:
//!
//! - [`fetcher`] - GETs provider JSON and classifies HTTP failures
//! - [`schema`] - validates the untyped JSON, collecting every violation
//! - [`convertor`] - resolves each card's media with bounded concurrency
//!   and hands the assembled model to [`crate::rss`]
//!
//! # Example
//!
//! ```ignore
//! use raiplayrss::feed::{ConvertConfig, Convertor};
//!
//! let convertor = Convertor::new(config, transport);
//! let rss = convertor.convert_path("programmi/lastoriaingiallo.json").await?;
//! ```

mod convertor;
mod error;
mod fetcher;
pub(crate) mod schema;

pub use convertor::{ConvertConfig, Convertor, GuidStrategy, DEFAULT_POOL_SIZE};
pub use error::{CardError, FeedError};
pub use fetcher::FeedFetcher;
pub use schema::{validate_feed, Card, FeedDocument, SchemaError, SchemaViolation};
