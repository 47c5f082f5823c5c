// ABOUTME: Reads a previously published feed with feed-rs to protect guid immutability.
// ABOUTME: Flags audio files that reappear under a different guid than the one already published.

use std::collections::{HashMap, HashSet};

use feed_rs::model::{Entry, FeedType};
use url::Url;

use crate::error::{FeedError, Violation};
use crate::models::Episode;

/// One item from the live feed: its guid and enclosure URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedEpisode {
    pub guid: String,
    pub audio_url: Option<String>,
}

/// Parses the bytes of a published RSS feed.
///
/// Only RSS 2.0 is accepted, since that is what the builder writes.
pub fn read_published_episodes(data: &[u8]) -> Result<Vec<PublishedEpisode>, FeedError> {
    let parsed = feed_rs::parser::parse(data).map_err(FeedError::parse)?;
    if parsed.feed_type != FeedType::RSS2 {
        return Err(FeedError::invalid(format!(
            "expected an RSS 2.0 feed, found {:?}",
            parsed.feed_type
        )));
    }

    Ok(parsed
        .entries
        .iter()
        .map(|entry| PublishedEpisode {
            guid: entry.id.clone(),
            audio_url: enclosure_url(entry),
        })
        .collect())
}

/// feed-rs exposes RSS enclosures as media content; older paths use links.
fn enclosure_url(entry: &Entry) -> Option<String> {
    let from_media = entry
        .media
        .iter()
        .flat_map(|media| media.content.iter())
        .find_map(|content| content.url.as_ref().map(|u| u.to_string()));

    from_media.or_else(|| {
        entry
            .links
            .iter()
            .find(|link| link.rel.as_deref() == Some("enclosure"))
            .map(|link| link.href.clone())
    })
}

/// Compares the manifest against what is already live.
///
/// An audio URL that was published under one guid and now carries another is a
/// violation: podcast clients would treat it as a new episode. Guids that
/// vanished from the manifest are only logged, since removing an episode is
/// allowed.
pub fn check_guid_stability(previous: &[PublishedEpisode], episodes: &[Episode]) -> Vec<Violation> {
    let published_guid_by_url: HashMap<String, &str> = previous
        .iter()
        .filter_map(|p| {
            p.audio_url
                .as_deref()
                .map(|url| (comparable_url(url), p.guid.as_str()))
        })
        .collect();

    let mut violations = Vec::new();
    for (idx, episode) in episodes.iter().enumerate() {
        if let Some(old_guid) = published_guid_by_url.get(&comparable_url(&episode.audio_url)) {
            if *old_guid != episode.guid {
                violations.push(Violation::new(
                    format!("episodes[{}].guid", idx),
                    format!(
                        "audio {} was published with guid {:?}; changing it to {:?} republishes the episode",
                        episode.audio_url, old_guid, episode.guid
                    ),
                ));
            }
        }
    }

    let current: HashSet<&str> = episodes.iter().map(|e| e.guid.as_str()).collect();
    for gone in previous.iter().filter(|p| !current.contains(p.guid.as_str())) {
        log::warn!("published episode {:?} is no longer in the manifest", gone.guid);
    }

    violations
}

/// feed-rs hands back normalized URLs (lowercased host, percent-encoded path),
/// so both sides go through the same normalization before comparing.
fn comparable_url(raw: &str) -> String {
    let raw = raw.trim();
    Url::parse(raw).map_or_else(|_| raw.to_string(), String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIVE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
  <channel>
    <title>Jaxon Strategy Feed</title>
    <link>https://example.org/feed</link>
    <description>Strategy documents</description>
    <item>
      <title>Platform Vision</title>
      <guid isPermaLink="false">ep1</guid>
      <enclosure url="https://drive.example.com/a.mp3" length="1234000" type="audio/mpeg"/>
    </item>
    <item>
      <title>AI Agent Catalog</title>
      <guid isPermaLink="false">ep2</guid>
      <enclosure url="https://drive.example.com/b.mp3" length="2345000" type="audio/mpeg"/>
    </item>
  </channel>
</rss>"#;

    fn episode(guid: &str, audio_url: &str) -> Episode {
        Episode {
            guid: guid.into(),
            audio_url: audio_url.into(),
            length: 1,
            ..Default::default()
        }
    }

    #[test]
    fn reads_guids_and_enclosures() {
        let published = read_published_episodes(LIVE.as_bytes()).unwrap();
        assert_eq!(
            published,
            vec![
                PublishedEpisode {
                    guid: "ep1".into(),
                    audio_url: Some("https://drive.example.com/a.mp3".into()),
                },
                PublishedEpisode {
                    guid: "ep2".into(),
                    audio_url: Some("https://drive.example.com/b.mp3".into()),
                },
            ]
        );
    }

    #[test]
    fn rejects_non_xml() {
        assert!(matches!(
            read_published_episodes(b"this is not a feed"),
            Err(FeedError::Parse(_))
        ));
    }

    #[test]
    fn changed_guid_for_same_audio_is_reported() {
        let published = read_published_episodes(LIVE.as_bytes()).unwrap();
        let episodes = vec![
            episode("ep1", "https://drive.example.com/a.mp3"),
            episode("ep2-renamed", "https://drive.example.com/b.mp3"),
        ];

        let violations = check_guid_stability(&published, &episodes);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "episodes[1].guid");
        assert!(violations[0].reason.contains("\"ep2\""));
    }

    #[test]
    fn renamed_guid_detected_when_urls_differ_only_in_spelling() {
        let live = LIVE.replace(
            "https://drive.example.com/b.mp3",
            "https://Drive.Example.com:443/My Episode.mp3",
        );
        let published = read_published_episodes(live.as_bytes()).unwrap();
        let episodes = vec![
            episode("ep1", "https://drive.example.com/a.mp3"),
            episode("renamed", "https://Drive.Example.com/My Episode.mp3"),
        ];

        let violations = check_guid_stability(&published, &episodes);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "episodes[1].guid");
    }

    #[test]
    fn unparseable_urls_still_compare_verbatim() {
        assert_eq!(comparable_url(" not a url "), "not a url");
        assert_eq!(
            comparable_url("https://Drive.Example.com/My Episode.mp3"),
            "https://drive.example.com/My%20Episode.mp3"
        );
    }

    #[test]
    fn new_and_removed_episodes_are_fine() {
        let published = read_published_episodes(LIVE.as_bytes()).unwrap();
        let episodes = vec![
            episode("ep1", "https://drive.example.com/a.mp3"),
            episode("ep3", "https://drive.example.com/c.mp3"),
        ];
        assert!(check_guid_stability(&published, &episodes).is_empty());
    }
}
