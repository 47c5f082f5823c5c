// ABOUTME: FeedBuilder turns feed metadata plus episodes into an RSS 2.0 podcast document.
// ABOUTME: Options and fluent setters control indentation, generator, and date strictness.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rss::extension::atom::{AtomExtension, Link};
use rss::validation::Validate;
use rss::{Channel, ChannelBuilder, EnclosureBuilder, GuidBuilder, Item, ItemBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, Violation};
use crate::is_absolute_url;
use crate::itunes_ext::{channel_ext, item_ext};
use crate::models::{Episode, FeedMetadata};
use crate::time_parse::{format_rfc2822, parse_flexible_time};
use crate::validate::{check_text, validate_episodes, validate_metadata};

/// Serialization options for the feed builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Spaces per nesting level in the output document.
    pub indent: usize,
    /// Text for the channel `<generator>` element; omitted when `None`.
    pub generator: Option<String>,
    /// Treat unparseable `published` values as validation violations.
    pub strict_dates: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            indent: 2,
            generator: None,
            strict_dates: false,
        }
    }
}

/// Builds podcast RSS documents.
///
/// The builder holds only options; `build` is a pure function of its inputs,
/// so the same metadata and episodes always produce byte-identical output.
#[derive(Debug, Clone, Default)]
pub struct FeedBuilder {
    opts: Options,
}

impl FeedBuilder {
    /// Create a FeedBuilder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a FeedBuilder from pre-assembled options (e.g. a config file).
    pub fn with_options(opts: Options) -> Self {
        Self { opts }
    }

    /// Set the number of spaces per nesting level.
    pub fn indent(mut self, indent: usize) -> Self {
        self.opts.indent = indent;
        self
    }

    /// Set the channel generator string.
    pub fn generator(mut self, generator: impl Into<String>) -> Self {
        self.opts.generator = Some(generator.into());
        self
    }

    /// Reject episodes whose publication date cannot be parsed.
    pub fn strict_dates(mut self, strict: bool) -> Self {
        self.opts.strict_dates = strict;
        self
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Validates the inputs and serializes the feed.
    ///
    /// Items are ordered newest first; episodes without a usable date go last
    /// in their original relative order.
    pub fn build(
        &self,
        metadata: &FeedMetadata,
        episodes: &[Episode],
    ) -> Result<String, ValidationError> {
        let mut violations = validate_metadata(metadata);
        if let Some(generator) = self.opts.generator.as_deref() {
            check_text(&mut violations, "options.generator", generator);
        }
        violations.extend(validate_episodes(episodes, self.opts.strict_dates));
        if let Some(err) = ValidationError::from_violations(violations) {
            return Err(err);
        }

        let ordered = sort_newest_first(episodes);
        let last_build = ordered.iter().find_map(|(_, date)| *date);
        let feed_author = metadata.author.as_deref();
        let items: Vec<Item> = ordered
            .iter()
            .map(|(episode, date)| episode_item(episode, date.as_ref(), feed_author))
            .collect();

        let channel = self.channel(metadata, last_build.as_ref(), items);
        channel
            .validate()
            .map_err(|e| rejected("feed", format!("RSS validation failed: {e}")))?;

        let buf = channel
            .pretty_write_to(Vec::new(), b' ', self.opts.indent)
            .map_err(|e| rejected("feed", format!("failed to serialize: {e}")))?;
        let mut xml =
            String::from_utf8(buf).map_err(|e| rejected("feed", format!("invalid UTF-8: {e}")))?;
        xml.push('\n');

        log::debug!(
            "built feed {:?} with {} episode(s)",
            metadata.title,
            ordered.len()
        );
        Ok(xml)
    }

    fn channel(
        &self,
        metadata: &FeedMetadata,
        last_build: Option<&DateTime<Utc>>,
        items: Vec<Item>,
    ) -> Channel {
        ChannelBuilder::default()
            .title(metadata.title.clone())
            .link(metadata.link.clone())
            .description(metadata.description.clone())
            .language(non_empty(metadata.language.as_deref()))
            .copyright(non_empty(metadata.copyright.as_deref()))
            .generator(non_empty(self.opts.generator.as_deref()))
            .last_build_date(last_build.map(format_rfc2822))
            .atom_ext(metadata.feed_url.as_deref().and_then(self_link))
            .itunes_ext(channel_ext(metadata))
            .items(items)
            .build()
    }
}

/// Builds a feed with default options.
pub fn build_feed(metadata: &FeedMetadata, episodes: &[Episode]) -> Result<String, ValidationError> {
    FeedBuilder::default().build(metadata, episodes)
}

fn episode_item(episode: &Episode, date: Option<&DateTime<Utc>>, feed_author: Option<&str>) -> Item {
    // A guid that is itself a URL is a permalink; anything else is opaque.
    let guid = GuidBuilder::default()
        .value(episode.guid.clone())
        .permalink(is_absolute_url(&episode.guid))
        .build();

    let enclosure = EnclosureBuilder::default()
        .url(episode.audio_url.clone())
        .length(episode.length.to_string())
        .mime_type(episode.mime_type.clone())
        .build();

    ItemBuilder::default()
        .title(episode.title.clone())
        .description(non_empty(Some(episode.description.as_str())))
        .guid(guid)
        .pub_date(date.map(format_rfc2822))
        .enclosure(enclosure)
        .itunes_ext(item_ext(episode, feed_author))
        .build()
}

/// `<atom:link rel="self">` pointing at where the feed itself is served.
fn self_link(feed_url: &str) -> Option<AtomExtension> {
    if feed_url.trim().is_empty() {
        return None;
    }
    let mut link = Link::default();
    link.set_href(feed_url);
    link.set_rel("self");
    link.set_mime_type(Some("application/rss+xml".to_string()));

    let mut ext = AtomExtension::default();
    ext.set_links(vec![link]);
    Some(ext)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(String::from)
}

fn rejected(field: &str, reason: String) -> ValidationError {
    ValidationError {
        violations: vec![Violation::new(field, reason)],
    }
}

/// Stable sort by publication date, newest first, undated last.
fn sort_newest_first(episodes: &[Episode]) -> Vec<(&Episode, Option<DateTime<Utc>>)> {
    let mut ordered: Vec<_> = episodes
        .iter()
        .map(|episode| {
            let date = episode.published.as_deref().and_then(|raw| {
                let parsed = parse_flexible_time(raw);
                if parsed.is_none() {
                    log::warn!(
                        "episode {:?} has unparseable date {:?}; placing it last",
                        episode.guid,
                        raw
                    );
                }
                parsed
            });
            (episode, date)
        })
        .collect();

    ordered.sort_by(|(_, a), (_, b)| match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(guid: &str, published: Option<&str>) -> Episode {
        Episode {
            guid: guid.into(),
            title: guid.into(),
            audio_url: format!("https://cdn.example.com/{}.mp3", guid),
            length: 1000,
            published: published.map(String::from),
            ..Default::default()
        }
    }

    fn guids(ordered: &[(&Episode, Option<DateTime<Utc>>)]) -> Vec<String> {
        ordered.iter().map(|(e, _)| e.guid.clone()).collect()
    }

    #[test]
    fn sort_puts_newest_first() {
        let episodes = vec![
            episode("old", Some("2024-01-01T00:00:00Z")),
            episode("new", Some("2024-03-01T00:00:00Z")),
            episode("mid", Some("Thu, 01 Feb 2024 00:00:00 +0000")),
        ];
        assert_eq!(guids(&sort_newest_first(&episodes)), vec!["new", "mid", "old"]);
    }

    #[test]
    fn sort_keeps_undated_last_in_input_order() {
        let episodes = vec![
            episode("undated-a", None),
            episode("dated", Some("2024-01-01")),
            episode("garbled", Some("not a date")),
            episode("undated-b", None),
        ];
        assert_eq!(
            guids(&sort_newest_first(&episodes)),
            vec!["dated", "undated-a", "garbled", "undated-b"]
        );
    }

    #[test]
    fn sort_ties_keep_input_order() {
        let episodes = vec![
            episode("first", Some("2024-01-01T00:00:00Z")),
            episode("second", Some("2024-01-01T00:00:00+00:00")),
        ];
        assert_eq!(guids(&sort_newest_first(&episodes)), vec!["first", "second"]);
    }

    #[test]
    fn builder_setters_update_options() {
        let builder = FeedBuilder::new().indent(4).generator("podcast-feed").strict_dates(true);
        assert_eq!(
            builder.options(),
            &Options {
                indent: 4,
                generator: Some("podcast-feed".into()),
                strict_dates: true,
            }
        );
    }

    #[test]
    fn url_guid_is_permalink() {
        let metadata = FeedMetadata {
            title: "Show".into(),
            link: "https://example.org".into(),
            ..Default::default()
        };
        let mut ep = episode("ep1", None);
        ep.guid = "https://example.org/episodes/1".into();

        let item = episode_item(&ep, None, None);
        let guid = item.guid().unwrap();
        assert_eq!(guid.value(), "https://example.org/episodes/1");
        assert!(guid.is_permalink());

        let xml = build_feed(&metadata, &[ep]).unwrap();
        assert!(!xml.contains("isPermaLink=\"false\""));
    }

    #[test]
    fn opaque_guid_is_not_permalink() {
        let item = episode_item(&episode("ep1", None), None, None);
        assert!(!item.guid().unwrap().is_permalink());
    }

    #[test]
    fn self_link_skipped_for_blank_url() {
        assert!(self_link("  ").is_none());
        let ext = self_link("https://example.org/feed.rss").unwrap();
        assert_eq!(ext.links()[0].href(), "https://example.org/feed.rss");
        assert_eq!(ext.links()[0].rel(), "self");
    }

    #[test]
    fn control_characters_in_generator_rejected() {
        let metadata = FeedMetadata {
            title: "Show".into(),
            link: "https://example.org".into(),
            ..Default::default()
        };
        let err = FeedBuilder::new()
            .generator("podcast\u{1}feed")
            .build(&metadata, &[])
            .unwrap_err();
        assert!(err.mentions("options.generator"));
    }
}
