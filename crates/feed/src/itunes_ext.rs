// ABOUTME: iTunes podcast namespace extensions attached to the channel and each item.
// ABOUTME: Covers author, owner, image, category, explicit, duration, and summary.

use rss::extension::itunes::{
    ITunesCategory, ITunesCategoryBuilder, ITunesChannelExtension, ITunesChannelExtensionBuilder,
    ITunesItemExtension, ITunesItemExtensionBuilder, ITunesOwner, ITunesOwnerBuilder,
};

use crate::duration_parse::format_itunes_duration;
use crate::html_utils::{has_markup, strip_html};
use crate::models::{Episode, FeedMetadata, Owner};

/// Namespace URI bound to the `itunes` prefix.
pub const ITUNES_NS: &str = "http://www.itunes.com/dtds/podcast-1.0.dtd";

/// Checks if explicit flag is set based on a free-form manifest value.
/// Returns true for case-insensitive: "yes", "true", "explicit".
pub fn is_explicit(value: Option<&str>) -> bool {
    value
        .map(|v| {
            let lower = v.trim().to_lowercase();
            lower == "yes" || lower == "true" || lower == "explicit"
        })
        .unwrap_or(false)
}

/// Renders an explicit flag as `true`/`false`, the values Apple Podcasts accepts.
pub fn explicit_value(flag: bool) -> &'static str {
    if flag {
        "true"
    } else {
        "false"
    }
}

/// Channel-level `itunes:*` elements. `itunes:explicit` is always present.
pub fn channel_ext(metadata: &FeedMetadata) -> ITunesChannelExtension {
    ITunesChannelExtensionBuilder::default()
        .author(owned(metadata.author.as_deref()))
        .owner(metadata.owner.as_ref().and_then(owner))
        .image(owned(metadata.image.as_deref()))
        .categories(category(metadata).into_iter().collect::<Vec<_>>())
        .explicit(Some(explicit_value(metadata.explicit).to_string()))
        .build()
}

/// Item-level `itunes:*` elements. `feed_author` fills in when the episode has none.
pub fn item_ext(episode: &Episode, feed_author: Option<&str>) -> ITunesItemExtension {
    let author = non_empty(episode.author.as_deref()).or(non_empty(feed_author));

    ITunesItemExtensionBuilder::default()
        .summary(summary(&episode.description))
        .duration(episode.duration_seconds.map(format_itunes_duration))
        .author(author.map(String::from))
        .explicit(episode.explicit.map(|flag| explicit_value(flag).to_string()))
        .image(owned(episode.image_url.as_deref()))
        .build()
}

/// Plain-text version of a description that carries tags; `None` for plain text.
fn summary(description: &str) -> Option<String> {
    if !has_markup(description) {
        return None;
    }
    let text = strip_html(description);
    (!text.is_empty() && text != description).then_some(text)
}

fn owner(owner: &Owner) -> Option<ITunesOwner> {
    if owner.is_empty() {
        return None;
    }
    Some(
        ITunesOwnerBuilder::default()
            .name(owned(owner.name.as_deref()))
            .email(owned(owner.email.as_deref()))
            .build(),
    )
}

fn category(metadata: &FeedMetadata) -> Option<ITunesCategory> {
    let text = non_empty(metadata.category.as_deref())?;
    let subcategory = non_empty(metadata.subcategory.as_deref())
        .map(|sub| Box::new(ITunesCategoryBuilder::default().text(sub).build()));

    Some(
        ITunesCategoryBuilder::default()
            .text(text)
            .subcategory(subcategory)
            .build(),
    )
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn owned(value: Option<&str>) -> Option<String> {
    non_empty(value).map(String::from)
}
