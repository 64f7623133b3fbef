use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use thiserror::Error;

use super::model::{PodcastItem, PodcastModel};
use crate::util::{format_rfc1123, strip_xml_invalid_chars};

const NAMESPACES: &[(&str, &str)] = &[
    ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
    ("xmlns:content", "http://purl.org/rss/1.0/modules/content/"),
    ("xmlns:atom", "http://www.w3.org/2005/Atom"),
    ("xmlns:itunes", "http://www.itunes.com/dtds/podcast-1.0.dtd"),
    ("xmlns:psc", "http://podlove.org/simple-chapters"),
    ("xmlns:podcast", "https://podcastindex.org/namespace/1.0"),
];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to write XML: {0}")]
    Io(#[from] std::io::Error),
    #[error("Generated RSS contains invalid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Renders `model` as a compact RSS 2.0 document, stamped with the current time.
pub fn render(model: &PodcastModel) -> Result<String, RenderError> {
    render_at(model, Utc::now())
}

/// Renders `model` with an explicit `lastBuildDate`.
///
/// The output is a single line. Every text node and attribute value is
/// escaped by the writer, and characters XML 1.0 cannot represent are
/// dropped beforehand.
pub fn render_at(model: &PodcastModel, built_at: DateTime<Utc>) -> Result<String, RenderError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    for &(name, uri) in NAMESPACES {
        rss.push_attribute((name, uri));
    }
    rss.push_attribute(("version", "2.0"));
    writer.write_event(Event::Start(rss))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    write_text(&mut writer, "title", &model.title)?;
    write_text(&mut writer, "description", &model.description)?;
    write_text(&mut writer, "language", model.language)?;
    write_text(&mut writer, "lastBuildDate", &format_rfc1123(&built_at))?;
    write_text(&mut writer, "itunes:summary", &model.description)?;
    write_text(&mut writer, "itunes:explicit", "false")?;
    write_image(&mut writer, model.image.as_str())?;

    for item in &model.items {
        write_item(&mut writer, item)?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}

fn write_item(writer: &mut Writer<Cursor<Vec<u8>>>, item: &PodcastItem) -> std::io::Result<()> {
    writer.write_event(Event::Start(BytesStart::new("item")))?;

    write_text(writer, "title", &item.title)?;
    write_text(writer, "description", &item.description)?;

    let mut guid = BytesStart::new("guid");
    guid.push_attribute(("isPermaLink", "false"));
    writer.write_event(Event::Start(guid))?;
    writer.write_event(Event::Text(BytesText::new(&strip_xml_invalid_chars(&item.guid))))?;
    writer.write_event(Event::End(BytesEnd::new("guid")))?;

    write_text(writer, "pubDate", &format_rfc1123(&item.pub_date))?;

    let length = item.media_size.to_string();
    let content_type = strip_xml_invalid_chars(&item.media_content_type);
    let mut enclosure = BytesStart::new("enclosure");
    enclosure.push_attribute(("url", item.media_url.as_str()));
    enclosure.push_attribute(("length", length.as_str()));
    enclosure.push_attribute(("type", &*content_type));
    writer.write_event(Event::Empty(enclosure))?;

    write_text(writer, "itunes:summary", &item.description)?;
    write_text(writer, "itunes:explicit", "false")?;
    write_image(writer, item.image.as_str())?;

    writer.write_event(Event::End(BytesEnd::new("item")))
}

fn write_text(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    text: &str,
) -> std::io::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(&strip_xml_invalid_chars(text))))?;
    writer.write_event(Event::End(BytesEnd::new(name)))
}

fn write_image(writer: &mut Writer<Cursor<Vec<u8>>>, href: &str) -> std::io::Result<()> {
    let mut image = BytesStart::new("itunes:image");
    image.push_attribute(("href", href));
    writer.write_event(Event::Empty(image))
}
