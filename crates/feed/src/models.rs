// ABOUTME: Rust models for podcast feed input: channel metadata and episodes.
// ABOUTME: FeedMetadata deserializes straight from the [feed] table of the TOML config.

use serde::{Deserialize, Serialize};

/// Default enclosure MIME type for episodes that do not name one.
pub const DEFAULT_MIME_TYPE: &str = "audio/mpeg";

/// Podcast owner contact, rendered as `itunes:owner`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Owner {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Owner {
    pub fn is_empty(&self) -> bool {
        self.name.as_deref().map_or(true, str::is_empty)
            && self.email.as_deref().map_or(true, str::is_empty)
    }
}

/// Feed-level (channel) metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedMetadata {
    pub title: String,
    pub description: String,
    /// Channel homepage.
    pub link: String,
    pub language: Option<String>,
    pub author: Option<String>,
    pub owner: Option<Owner>,
    /// Artwork URL.
    pub image: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub explicit: bool,
    pub copyright: Option<String>,
    /// Public URL of the feed itself, rendered as `atom:link rel="self"`.
    pub feed_url: Option<String>,
}

/// A single podcast episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub guid: String,
    pub title: String,
    pub description: String,
    pub audio_url: String,
    /// Audio file size in bytes.
    pub length: u64,
    pub mime_type: String,
    /// Raw publication date-time; parsed leniently when the feed is built.
    pub published: Option<String>,
    pub duration_seconds: Option<u32>,
    pub author: Option<String>,
    pub explicit: Option<bool>,
    pub image_url: Option<String>,
}

impl Default for Episode {
    fn default() -> Self {
        Self {
            guid: String::new(),
            title: String::new(),
            description: String::new(),
            audio_url: String::new(),
            length: 0,
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            published: None,
            duration_seconds: None,
            author: None,
            explicit: None,
            image_url: None,
        }
    }
}
