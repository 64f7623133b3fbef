//! Small helpers shared by the feed, media and rendering modules.
//!
//! - **Text**: removal of characters that XML 1.0 cannot carry
//! - **Dates**: lenient parsing of provider dates, RFC 1123 formatting
//! - **Links**: resolution of provider-relative references

mod date;
mod text;
mod links;

pub use date::{format_rfc1123, parse_publish_date};
pub use text::strip_xml_invalid_chars;
pub use links::resolve_against;
