//! Streaming RSS 2.0 / Atom parser built on `quick_xml`.
//!
//! Only the fields the ingestion pipeline consumes are captured; unknown
//! elements are skipped. Field values are taken from the first occurrence.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

use crate::feeds::{Feed, FeedErrorKind, FeedItem};

lazy_static! {
    static ref MARKUP_TAG: Regex = Regex::new(r"(?s)<[^>]*>").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Title,
    Link,
    Description,
    Encoded,
    Content,
    Summary,
    PubDate,
    Published,
    Updated,
}

fn item_field(name: &[u8]) -> Option<Field> {
    match name {
        b"title" => Some(Field::Title),
        b"link" => Some(Field::Link),
        b"description" => Some(Field::Description),
        b"content:encoded" => Some(Field::Encoded),
        b"content" => Some(Field::Content),
        b"summary" => Some(Field::Summary),
        b"pubDate" => Some(Field::PubDate),
        b"published" | b"dc:date" => Some(Field::Published),
        b"updated" => Some(Field::Updated),
        _ => None,
    }
}

#[derive(Default)]
struct ItemBuilder {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    encoded: Option<String>,
    content: Option<String>,
    summary: Option<String>,
    pub_date: Option<String>,
    published: Option<String>,
    updated: Option<String>,
}

impl ItemBuilder {
    fn set(&mut self, field: Field, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Description => &mut self.description,
            Field::Encoded => &mut self.encoded,
            Field::Content => &mut self.content,
            Field::Summary => &mut self.summary,
            Field::PubDate => &mut self.pub_date,
            Field::Published => &mut self.published,
            Field::Updated => &mut self.updated,
        };
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }

    fn finish(self) -> FeedItem {
        let content = self
            .encoded
            .or(self.content)
            .or(self.description)
            .or(self.summary);
        let content_snippet = content
            .as_deref()
            .map(html_to_text)
            .filter(|s| !s.is_empty());
        let published = [self.pub_date, self.published, self.updated]
            .iter()
            .flatten()
            .find_map(|raw| parse_date(raw));

        FeedItem {
            link: self.link,
            title: self.title,
            content,
            content_snippet,
            published,
        }
    }
}

/// Text being collected for an open element.
struct Capture {
    field: Field,
    name: Vec<u8>,
    text: String,
}

#[derive(Default)]
struct ParseState {
    saw_root: bool,
    feed_title: Option<String>,
    item: Option<ItemBuilder>,
    current: Option<Capture>,
    items: Vec<FeedItem>,
}

impl ParseState {
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) {
        let qname = e.name();
        let name = qname.as_ref();

        if matches!(name, b"rss" | b"feed" | b"rdf:RDF") {
            self.saw_root = true;
            return;
        }
        if matches!(name, b"item" | b"entry") {
            self.item = Some(ItemBuilder::default());
            self.current = None;
            return;
        }
        if self.current.is_some() {
            return;
        }

        // Atom links carry the URL in `href`; RSS links carry it as text.
        if name == b"link" {
            if let Some(href) = attribute(e, "href") {
                let rel = attribute(e, "rel");
                if let Some(item) = self.item.as_mut() {
                    if rel.as_deref().map_or(true, |r| r == "alternate") {
                        item.set(Field::Link, &href);
                    }
                }
                return;
            }
        }
        if empty {
            return;
        }

        let field = match &self.item {
            Some(_) => item_field(name),
            None if name == b"title" && self.feed_title.is_none() => Some(Field::Title),
            None => None,
        };
        if let Some(field) = field {
            self.current = Some(Capture {
                field,
                name: name.to_vec(),
                text: String::new(),
            });
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(capture) = self.current.as_mut() {
            capture.text.push_str(text);
        }
    }

    fn close(&mut self, name: &[u8]) {
        if matches!(name, b"item" | b"entry") {
            if let Some(item) = self.item.take() {
                self.items.push(item.finish());
            }
            self.current = None;
            return;
        }

        if !self.current.as_ref().is_some_and(|c| c.name == name) {
            return;
        }
        if let Some(capture) = self.current.take() {
            match self.item.as_mut() {
                Some(item) => item.set(capture.field, &capture.text),
                None => {
                    let title = capture.text.trim();
                    if !title.is_empty() {
                        self.feed_title = Some(title.to_string());
                    }
                }
            }
        }
    }
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.try_get_attribute(key)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Parses an RSS 2.0, RSS 1.0 (RDF), or Atom document.
pub fn parse_feed(xml: &str) -> Result<Feed, FeedErrorKind> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut state = ParseState::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => state.open(&e, false),
            Ok(Event::Empty(e)) => state.open(&e, true),
            Ok(Event::Text(t)) => {
                let text = match t.unescape() {
                    Ok(s) => s.into_owned(),
                    Err(_) => String::from_utf8_lossy(&t).into_owned(),
                };
                state.text(&text);
            }
            Ok(Event::CData(c)) => {
                let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                state.text(&text);
            }
            Ok(Event::End(e)) => state.close(e.name().as_ref()),
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FeedErrorKind::Parse(format!(
                    "malformed XML at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    if !state.saw_root {
        return Err(FeedErrorKind::Parse(
            "document is not an RSS or Atom feed".to_string(),
        ));
    }

    Ok(Feed {
        title: state.feed_title,
        items: state.items,
    })
}

/// Strips markup, decodes entities, and collapses whitespace.
pub fn html_to_text(html: &str) -> String {
    let stripped = MARKUP_TAG.replace_all(html, " ").replace("&nbsp;", " ");
    let decoded = match quick_xml::escape::unescape(&stripped) {
        Ok(s) => s.into_owned(),
        Err(_) => stripped.clone(),
    };
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Accepts RFC 2822 (`pubDate`) and RFC 3339 (Atom) timestamps.
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|d| d.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const RSS_FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>We Work Remotely</title>
    <link>https://weworkremotely.com</link>
    <item>
      <title>Acme: Senior Rust Engineer</title>
      <link>https://weworkremotely.com/jobs/1</link>
      <pubDate>Tue, 03 Jun 2025 09:30:00 +0000</pubDate>
      <description>&lt;p&gt;Build &amp;amp; ship&lt;/p&gt;</description>
      <content:encoded><![CDATA[<p>Build <b>distributed</b> systems.</p><p>Location: Berlin, Germany</p>]]></content:encoded>
    </item>
    <item>
      <title>Posting without a link</title>
      <description>Nothing to see</description>
    </item>
    <item>
      <title>Python Developer</title>
      <link>https://weworkremotely.com/jobs/3</link>
      <description>&lt;p&gt;Django and &lt;em&gt;Postgres&lt;/em&gt;&lt;/p&gt;</description>
      <pubDate>not a date</pubDate>
    </item>
  </channel>
</rss>"#;

    const ATOM_FIXTURE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>GitHub Jobs</title>
  <entry>
    <title>Frontend Developer at Design Studio</title>
    <link rel="alternate" href="https://jobs.example/42"/>
    <link rel="self" href="https://jobs.example/42.atom"/>
    <published>2025-05-01T12:00:00Z</published>
    <summary type="html">&lt;p&gt;HTML, CSS and React&lt;/p&gt;</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_rss_feed_title_and_items() {
        let feed = parse_feed(RSS_FIXTURE).unwrap();
        assert_eq!(feed.title.as_deref(), Some("We Work Remotely"));
        assert_eq!(feed.items.len(), 3);
    }

    #[test]
    fn test_rss_prefers_encoded_content() {
        let feed = parse_feed(RSS_FIXTURE).unwrap();
        let first = &feed.items[0];
        assert_eq!(first.link.as_deref(), Some("https://weworkremotely.com/jobs/1"));
        assert_eq!(first.title.as_deref(), Some("Acme: Senior Rust Engineer"));
        assert!(first.content.as_deref().unwrap().contains("<b>distributed</b>"));
        assert_eq!(
            first.content_snippet.as_deref(),
            Some("Build distributed systems. Location: Berlin, Germany")
        );
        assert_eq!(
            first.published,
            Some(Utc.with_ymd_and_hms(2025, 6, 3, 9, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_rss_item_without_link_is_kept_with_none() {
        let feed = parse_feed(RSS_FIXTURE).unwrap();
        assert_eq!(feed.items[1].link, None);
        assert_eq!(feed.items[1].title.as_deref(), Some("Posting without a link"));
    }

    #[test]
    fn test_rss_escaped_description_becomes_snippet() {
        let feed = parse_feed(RSS_FIXTURE).unwrap();
        let third = &feed.items[2];
        assert_eq!(third.content_snippet.as_deref(), Some("Django and Postgres"));
        assert_eq!(third.published, None);
    }

    #[test]
    fn test_atom_alternate_link_and_summary() {
        let feed = parse_feed(ATOM_FIXTURE).unwrap();
        assert_eq!(feed.title.as_deref(), Some("GitHub Jobs"));
        assert_eq!(feed.items.len(), 1);
        let entry = &feed.items[0];
        assert_eq!(entry.link.as_deref(), Some("https://jobs.example/42"));
        assert_eq!(entry.content_snippet.as_deref(), Some("HTML, CSS and React"));
        assert_eq!(
            entry.published,
            Some(Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_non_feed_document_is_rejected() {
        let err = parse_feed("<html><body>Not a feed</body></html>").unwrap_err();
        assert!(matches!(err, FeedErrorKind::Parse(_)));
    }

    #[test]
    fn test_malformed_xml_is_rejected() {
        let err = parse_feed("<rss><channel><title>Broken</channel></rss>").unwrap_err();
        assert!(matches!(err, FeedErrorKind::Parse(_)));
    }

    #[test]
    fn test_html_to_text_decodes_entities() {
        assert_eq!(
            html_to_text("<p>Fish &amp; chips&nbsp;&#8212; <i>daily</i></p>\n\n"),
            "Fish & chips \u{2014} daily"
        );
    }

    #[test]
    fn test_parse_date_formats() {
        assert!(parse_date("Mon, 02 Jun 2025 08:00:00 GMT").is_some());
        assert!(parse_date("2025-06-02T08:00:00+02:00").is_some());
        assert!(parse_date("yesterday").is_none());
    }
}
