//! RSS item extraction and HTML stripping.

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use newsgraph_core::RawArticle;

use crate::error::FetchError;

#[derive(Default)]
struct ItemFields {
    title: String,
    link: String,
    description: String,
    pub_date: String,
    source: String,
}

impl ItemFields {
    fn set(&mut self, tag: &str, text: String) {
        match tag {
            "title" => self.title = text,
            "link" => self.link = text,
            "description" => self.description = strip_html(&text),
            "pubDate" => self.pub_date = text,
            "source" => self.source = text,
            _ => {}
        }
    }

    fn into_raw(self) -> RawArticle {
        RawArticle {
            title: self.title.trim().to_string(),
            description: self.description,
            published_at: parse_pub_date(&self.pub_date),
            url: self.link.trim().to_string(),
            publisher: self.source.trim().to_string(),
        }
    }
}

/// Parse an RSS XML feed into [`RawArticle`]s.
///
/// Extracts `<item>` elements, pulling `<title>`, `<link>`, `<description>`
/// (HTML stripped), `<pubDate>` (RFC 2822) and `<source>` (publisher name).
/// Items without a link are skipped. Stops after `max_items` items.
///
/// # Errors
///
/// Returns [`FetchError::Xml`] if the XML is malformed.
pub(crate) fn parse_rss_feed(xml: &str, max_items: usize) -> Result<Vec<RawArticle>, FetchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut articles = Vec::new();
    let mut in_item = false;
    let mut current_tag = String::new();
    let mut item = ItemFields::default();

    if max_items == 0 {
        return Ok(articles);
    }

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = std::str::from_utf8(e.name().as_ref())
                    .unwrap_or("")
                    .to_string();
                if name == "item" {
                    in_item = true;
                    item = ItemFields::default();
                }
                current_tag = name;
            }
            Ok(Event::End(e)) => {
                let raw = e.name();
                let name = std::str::from_utf8(raw.as_ref()).unwrap_or("");
                if name == "item" && in_item {
                    in_item = false;
                    let fields = std::mem::take(&mut item);
                    if !fields.link.trim().is_empty() {
                        articles.push(fields.into_raw());
                        if articles.len() >= max_items {
                            break;
                        }
                    }
                }
                current_tag.clear();
            }
            Ok(Event::Text(e)) => {
                if in_item {
                    let text = e.unescape().unwrap_or_default().into_owned();
                    item.set(&current_tag, text);
                }
            }
            Ok(Event::CData(e)) => {
                if in_item {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    item.set(&current_tag, text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FetchError::Xml(e)),
            _ => {}
        }
    }

    Ok(articles)
}

/// RFC 2822 `pubDate`, or `None` when absent or unparseable.
fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match DateTime::parse_from_rfc2822(raw) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            tracing::debug!(pub_date = raw, error = %e, "unparseable pubDate");
            None
        }
    }
}

/// Strip HTML tags from a string and normalize whitespace.
pub(crate) fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
