// ABOUTME: Podcast RSS feed building library.
// ABOUTME: Validates episode manifests and feed metadata, then serializes RSS 2.0 with iTunes tags.

pub mod builder;
pub mod config;
pub mod duration_parse;
pub mod error;
pub mod html_utils;
pub mod itunes_ext;
pub mod manifest;
pub mod models;
pub mod published;
pub mod time_parse;
pub mod validate;

pub use builder::{build_feed, FeedBuilder, Options};
pub use config::FeedConfig;
pub use duration_parse::{format_itunes_duration, parse_duration_seconds};
pub use error::{FeedError, LoadError, ValidationError, Violation};
pub use html_utils::{decode_entities, strip_html};
pub use manifest::{load_manifest, load_url_map, parse_manifest, AudioSettings};
pub use models::{Episode, FeedMetadata, Owner, DEFAULT_MIME_TYPE};
pub use published::{check_guid_stability, read_published_episodes, PublishedEpisode};
pub use time_parse::{format_rfc2822, parse_flexible_time};

// ----------------------------------------------------------------------------
// URL utilities
// ----------------------------------------------------------------------------

use url::Url;

/// True if `s` parses as an absolute http or https URL with a host.
pub fn is_absolute_url(s: &str) -> bool {
    match Url::parse(s.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Joins a filename onto a base URL, treating the base as a directory.
pub fn join_url(base: &str, file: &str) -> Option<String> {
    let base = base.trim();
    let mut parsed = if base.ends_with('/') {
        Url::parse(base).ok()?
    } else {
        Url::parse(&format!("{}/", base)).ok()?
    };
    parsed = parsed.join(file.trim_start_matches('/')).ok()?;
    Some(parsed.to_string())
}
