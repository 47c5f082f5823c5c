// ABOUTME: Exhaustive validation of feed metadata and episodes before serialization.
// ABOUTME: Collects every violation instead of stopping at the first.

use std::collections::HashMap;

use crate::error::Violation;
use crate::is_absolute_url;
use crate::models::{Episode, FeedMetadata};
use crate::time_parse::parse_flexible_time;

/// Checks channel-level invariants.
pub fn validate_metadata(metadata: &FeedMetadata) -> Vec<Violation> {
    let mut violations = Vec::new();

    if metadata.title.trim().is_empty() {
        violations.push(Violation::new("metadata.title", "must not be empty"));
    }

    if metadata.link.trim().is_empty() {
        violations.push(Violation::new("metadata.link", "must not be empty"));
    } else if !is_absolute_url(&metadata.link) {
        violations.push(Violation::new(
            "metadata.link",
            format!("{:?} is not an absolute http(s) URL", metadata.link),
        ));
    }

    check_optional_url(&mut violations, "metadata.image", metadata.image.as_deref());
    check_optional_url(&mut violations, "metadata.feed_url", metadata.feed_url.as_deref());

    let owner = metadata.owner.as_ref();
    for (field, value) in [
        ("metadata.title", Some(metadata.title.as_str())),
        ("metadata.description", Some(metadata.description.as_str())),
        ("metadata.link", Some(metadata.link.as_str())),
        ("metadata.language", metadata.language.as_deref()),
        ("metadata.author", metadata.author.as_deref()),
        ("metadata.owner.name", owner.and_then(|o| o.name.as_deref())),
        ("metadata.owner.email", owner.and_then(|o| o.email.as_deref())),
        ("metadata.image", metadata.image.as_deref()),
        ("metadata.category", metadata.category.as_deref()),
        ("metadata.subcategory", metadata.subcategory.as_deref()),
        ("metadata.copyright", metadata.copyright.as_deref()),
        ("metadata.feed_url", metadata.feed_url.as_deref()),
    ] {
        if let Some(value) = value {
            check_text(&mut violations, field, value);
        }
    }

    violations
}

/// Checks per-episode invariants and guid uniqueness across the collection.
///
/// With `strict_dates`, a `published` value that cannot be parsed is a violation;
/// otherwise it is tolerated and the episode sorts last.
pub fn validate_episodes(episodes: &[Episode], strict_dates: bool) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut first_seen: HashMap<&str, usize> = HashMap::with_capacity(episodes.len());

    for (idx, episode) in episodes.iter().enumerate() {
        let field = |name: &str| format!("episodes[{}].{}", idx, name);

        let guid = episode.guid.as_str();
        if guid.trim().is_empty() {
            violations.push(Violation::new(field("guid"), "must not be empty"));
        } else if guid.trim() != guid {
            violations.push(Violation::new(
                field("guid"),
                format!("{:?} has leading or trailing whitespace", guid),
            ));
        } else if let Some(first) = first_seen.get(guid) {
            violations.push(Violation::new(
                field("guid"),
                format!("duplicate guid {:?} (also used by episodes[{}])", guid, first),
            ));
        } else {
            first_seen.insert(guid, idx);
        }

        if episode.title.trim().is_empty() {
            violations.push(Violation::new(field("title"), "must not be empty"));
        }

        if episode.audio_url.trim().is_empty() {
            violations.push(Violation::new(field("audio_url"), "must not be empty"));
        } else if !is_absolute_url(&episode.audio_url) {
            violations.push(Violation::new(
                field("audio_url"),
                format!("{:?} is not an absolute http(s) URL", episode.audio_url),
            ));
        }

        if episode.length == 0 {
            violations.push(Violation::new(
                field("length"),
                "audio size is unknown; wait for the upload to finish",
            ));
        }

        if episode.mime_type.trim().is_empty() {
            violations.push(Violation::new(field("mime_type"), "must not be empty"));
        }

        check_optional_url(&mut violations, &field("image_url"), episode.image_url.as_deref());

        for (name, value) in [
            ("guid", Some(episode.guid.as_str())),
            ("title", Some(episode.title.as_str())),
            ("description", Some(episode.description.as_str())),
            ("audio_url", Some(episode.audio_url.as_str())),
            ("mime_type", Some(episode.mime_type.as_str())),
            ("author", episode.author.as_deref()),
            ("image_url", episode.image_url.as_deref()),
        ] {
            if let Some(value) = value {
                check_text(&mut violations, &field(name), value);
            }
        }

        if strict_dates {
            if let Some(raw) = episode.published.as_deref() {
                if parse_flexible_time(raw).is_none() {
                    violations.push(Violation::new(
                        field("published"),
                        format!("{:?} is not a valid date-time", raw),
                    ));
                }
            }
        }
    }

    violations
}

/// True for characters an XML 1.0 document may contain.
pub fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Flags text that cannot be written into an XML document at all.
pub fn check_text(violations: &mut Vec<Violation>, field: &str, value: &str) {
    if let Some(bad) = value.chars().find(|c| !is_xml_char(*c)) {
        violations.push(Violation::new(
            field,
            format!("contains U+{:04X}, which XML does not allow", bad as u32),
        ));
    }
}

fn check_optional_url(violations: &mut Vec<Violation>, field: &str, value: Option<&str>) {
    if let Some(url) = value {
        if !is_absolute_url(url) {
            violations.push(Violation::new(
                field,
                format!("{:?} is not an absolute http(s) URL", url),
            ));
        }
    }
}
