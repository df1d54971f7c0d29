//! RSS 2.0 / Atom item extraction on top of a streaming XML reader.
//!
//! Only the handful of item fields the news list needs are kept. A malformed
//! document yields whatever items were complete before the error.

use crate::text::{collapse_whitespace, decode_entities, strip_html};
use market_core::NewsItem;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    PubDate,
    Published,
    Description,
    Content,
}

impl Field {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "title" => Some(Field::Title),
            "link" => Some(Field::Link),
            "pubdate" => Some(Field::PubDate),
            "published" | "updated" | "dc:date" => Some(Field::Published),
            "description" | "summary" => Some(Field::Description),
            "content:encoded" | "content" => Some(Field::Content),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct ItemBuilder {
    title: String,
    link: String,
    pub_date: String,
    published: String,
    description: String,
    content: String,
}

impl ItemBuilder {
    fn buffer(&mut self, field: Field) -> &mut String {
        match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::PubDate => &mut self.pub_date,
            Field::Published => &mut self.published,
            Field::Description => &mut self.description,
            Field::Content => &mut self.content,
        }
    }

    fn build(self, source: &str) -> Option<NewsItem> {
        let title = collapse_whitespace(&decode_entities(&self.title));
        let link = self.link.trim().to_string();
        if title.is_empty() || link.is_empty() {
            return None;
        }

        let published = [self.pub_date, self.published]
            .into_iter()
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty());

        let raw_description = if self.description.trim().is_empty() {
            self.content
        } else {
            self.description
        };
        let description = Some(strip_html(&decode_entities(&raw_description))).filter(|d| !d.is_empty());

        Some(NewsItem {
            id: url_id(&link),
            title,
            url: link,
            source: source.to_string(),
            published_at: published,
            description,
        })
    }
}

fn tag_name(start: &BytesStart) -> String {
    String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase()
}

/// Atom links carry the URL in `href`; prefer `rel="alternate"` or no rel.
fn atom_href(start: &BytesStart) -> Option<String> {
    let mut href = None;
    let mut rel = None;
    for attr in start.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        match attr.key.as_ref() {
            b"href" => href = Some(value),
            b"rel" => rel = Some(value),
            _ => {}
        }
    }
    match rel.as_deref() {
        None | Some("alternate") => href.map(|h| decode_entities(&h)),
        _ => None,
    }
}

/// Parse every `<item>` (RSS) or `<entry>` (Atom) into a [`NewsItem`].
/// Items without a title or link are dropped.
pub fn parse_feed(xml: &str, source: &str) -> Vec<NewsItem> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = false;

    let mut items = Vec::new();
    let mut current: Option<ItemBuilder> = None;
    // (field, tag that opened it) while inside a recognized child element
    let mut open_field: Option<(Field, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let name = tag_name(&start);
                if name == "item" || name == "entry" {
                    current = Some(ItemBuilder::default());
                    open_field = None;
                } else if let Some(item) = current.as_mut() {
                    if open_field.is_none() {
                        if let Some(field) = Field::from_tag(&name) {
                            if field == Field::Link {
                                if let Some(href) = atom_href(&start) {
                                    item.link = href;
                                }
                            }
                            open_field = Some((field, name));
                        }
                    }
                }
            }
            Ok(Event::Empty(start)) => {
                if let Some(item) = current.as_mut() {
                    if tag_name(&start) == "link" && item.link.is_empty() {
                        if let Some(href) = atom_href(&start) {
                            item.link = href;
                        }
                    }
                }
            }
            Ok(Event::Text(text)) => {
                if let (Some(item), Some((field, _))) = (current.as_mut(), open_field.as_ref()) {
                    let value = text
                        .unescape()
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&text).into_owned());
                    append(item.buffer(*field), &value);
                }
            }
            Ok(Event::CData(data)) => {
                if let (Some(item), Some((field, _))) = (current.as_mut(), open_field.as_ref()) {
                    let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    append(item.buffer(*field), &value);
                }
            }
            Ok(Event::End(end)) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).to_ascii_lowercase();
                if name == "item" || name == "entry" {
                    if let Some(built) = current.take().and_then(|b| b.build(source)) {
                        items.push(built);
                    }
                    open_field = None;
                } else if open_field.as_ref().is_some_and(|(_, tag)| *tag == name) {
                    open_field = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(
                    "{} feed parse stopped at byte {}: {}",
                    source,
                    reader.buffer_position(),
                    e
                );
                break;
            }
            _ => {}
        }
    }

    items
}

fn append(buffer: &mut String, value: &str) {
    if !buffer.is_empty() {
        buffer.push(' ');
    }
    buffer.push_str(value);
}

/// Non-cryptographic id for a URL: the 32-bit `h = 31*h + unit` string hash over
/// UTF-16 code units, wrapping on overflow.
pub fn url_id(url: &str) -> String {
    let hash = url
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32));
    format!("id_{}", hash)
}
