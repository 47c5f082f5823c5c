// ABOUTME: Loads the JSON episode manifest into Episode values.
// ABOUTME: Resolves audio URLs for file-only entries through the upload URL map or a base URL.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::duration_parse::parse_duration_seconds;
use crate::error::LoadError;
use crate::itunes_ext::is_explicit;
use crate::join_url;
use crate::models::{Episode, DEFAULT_MIME_TYPE};

/// How manifest entries that only name an audio file get their hosted URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSettings {
    /// Prefix for files with no entry in `url_map`.
    pub base_url: Option<String>,
    /// Filename to hosted URL, as recorded by the upload step.
    pub url_map: BTreeMap<String, String>,
    pub default_mime_type: String,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            url_map: BTreeMap::new(),
            default_mime_type: DEFAULT_MIME_TYPE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestEntry {
    #[serde(default)]
    guid: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    audio_url: Option<String>,
    file: Option<String>,
    length: Option<u64>,
    mime_type: Option<String>,
    published: Option<String>,
    duration: Option<DurationValue>,
    author: Option<String>,
    explicit: Option<ExplicitValue>,
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DurationValue {
    Seconds(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExplicitValue {
    Flag(bool),
    Text(String),
}

/// Reads and parses a manifest file.
pub fn load_manifest(path: &Path, settings: &AudioSettings) -> Result<Vec<Episode>, LoadError> {
    let text = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    let episodes = parse_manifest(&text, settings).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("loaded {} episode(s) from {}", episodes.len(), path.display());
    Ok(episodes)
}

/// Parses manifest JSON: either `{"episodes": [...]}` or a bare array.
///
/// Entries keep their manifest order. Missing guids and titles load as empty
/// strings so validation can report them together with everything else.
pub fn parse_manifest(text: &str, settings: &AudioSettings) -> Result<Vec<Episode>, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;
    let list = match value {
        Value::Object(mut map) if map.contains_key("episodes") => {
            map.remove("episodes").unwrap_or(Value::Array(Vec::new()))
        }
        other => other,
    };

    let entries: Vec<ManifestEntry> = serde_json::from_value(list)?;
    Ok(entries
        .into_iter()
        .map(|entry| into_episode(entry, settings))
        .collect())
}

/// Reads the filename to URL map written by the upload step.
pub fn load_url_map(path: &Path) -> Result<BTreeMap<String, String>, LoadError> {
    let text = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn into_episode(entry: ManifestEntry, settings: &AudioSettings) -> Episode {
    let audio_url = resolve_audio_url(&entry, settings);

    let duration_seconds = match entry.duration {
        Some(DurationValue::Seconds(secs)) => u32::try_from(secs).ok(),
        Some(DurationValue::Text(text)) => {
            let parsed = parse_duration_seconds(&text);
            if parsed.is_none() {
                log::warn!("episode {:?}: ignoring unreadable duration {:?}", entry.guid, text);
            }
            parsed
        }
        None => None,
    };

    let explicit = entry.explicit.map(|value| match value {
        ExplicitValue::Flag(flag) => flag,
        ExplicitValue::Text(text) => is_explicit(Some(&text)),
    });

    Episode {
        guid: entry.guid,
        title: entry.title,
        description: entry.description,
        audio_url,
        length: entry.length.unwrap_or(0),
        mime_type: entry
            .mime_type
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| settings.default_mime_type.clone()),
        published: entry.published.filter(|p| !p.trim().is_empty()),
        duration_seconds,
        author: entry.author,
        explicit,
        image_url: entry.image,
    }
}

/// Explicit `audio_url` wins; otherwise `file` goes through the URL map, then the base URL.
fn resolve_audio_url(entry: &ManifestEntry, settings: &AudioSettings) -> String {
    if let Some(url) = entry.audio_url.as_deref().filter(|u| !u.trim().is_empty()) {
        return url.to_string();
    }

    let Some(file) = entry.file.as_deref().filter(|f| !f.trim().is_empty()) else {
        return String::new();
    };

    let file_name = Path::new(file)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file);

    if let Some(url) = settings
        .url_map
        .get(file)
        .or_else(|| settings.url_map.get(file_name))
    {
        return url.clone();
    }

    if let Some(url) = settings
        .base_url
        .as_deref()
        .and_then(|base| join_url(base, file_name))
    {
        return url;
    }

    log::warn!(
        "episode {:?}: no hosted URL known for {:?}",
        entry.guid,
        file
    );
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> AudioSettings {
        let mut url_map = BTreeMap::new();
        url_map.insert(
            "platform-vision.mp3".to_string(),
            "https://drive.example.com/uc?export=download&id=abc".to_string(),
        );
        AudioSettings {
            base_url: Some("https://example.github.io/feed/audio".into()),
            url_map,
            ..Default::default()
        }
    }

    #[test]
    fn parses_wrapped_and_bare_forms() {
        let wrapped = r#"{"episodes": [{"guid": "ep1", "title": "One", "audio_url": "https://a/1.mp3", "length": 10}]}"#;
        let bare = r#"[{"guid": "ep1", "title": "One", "audio_url": "https://a/1.mp3", "length": 10}]"#;

        let a = parse_manifest(wrapped, &AudioSettings::default()).unwrap();
        let b = parse_manifest(bare, &AudioSettings::default()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].mime_type, "audio/mpeg");
    }

    #[test]
    fn file_resolves_through_map_then_base_url() {
        let text = r#"[
            {"guid": "ep1", "title": "Platform Vision", "file": "audio/platform-vision.mp3", "length": 1},
            {"guid": "ep2", "title": "Agent Catalog", "file": "agent-catalog.mp3", "length": 1},
            {"guid": "ep3", "title": "Override", "file": "platform-vision.mp3", "audio_url": "https://cdn/x.mp3", "length": 1}
        ]"#;

        let episodes = parse_manifest(text, &settings()).unwrap();
        assert_eq!(
            episodes[0].audio_url,
            "https://drive.example.com/uc?export=download&id=abc"
        );
        assert_eq!(
            episodes[1].audio_url,
            "https://example.github.io/feed/audio/agent-catalog.mp3"
        );
        assert_eq!(episodes[2].audio_url, "https://cdn/x.mp3");
    }

    #[test]
    fn unresolvable_file_leaves_url_empty() {
        let text = r#"[{"guid": "ep1", "title": "Lost", "file": "lost.mp3", "length": 1}]"#;
        let episodes = parse_manifest(text, &AudioSettings::default()).unwrap();
        assert!(episodes[0].audio_url.is_empty());
    }

    #[test]
    fn duration_and_explicit_accept_numbers_and_text() {
        let text = r#"[
            {"guid": "a", "duration": 1234, "explicit": true},
            {"guid": "b", "duration": "01:02:03", "explicit": "yes"},
            {"guid": "c", "duration": "soon", "explicit": "clean"}
        ]"#;

        let episodes = parse_manifest(text, &AudioSettings::default()).unwrap();
        assert_eq!(episodes[0].duration_seconds, Some(1234));
        assert_eq!(episodes[0].explicit, Some(true));
        assert_eq!(episodes[1].duration_seconds, Some(3723));
        assert_eq!(episodes[1].explicit, Some(true));
        assert_eq!(episodes[2].duration_seconds, None);
        assert_eq!(episodes[2].explicit, Some(false));
    }

    #[test]
    fn missing_length_loads_as_zero() {
        let text = r#"[{"guid": "ep1", "title": "Uploading", "audio_url": "https://a/1.mp3"}]"#;
        let episodes = parse_manifest(text, &AudioSettings::default()).unwrap();
        assert_eq!(episodes[0].length, 0);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let text = r#"[{"guid": "ep1", "titel": "Typo"}]"#;
        assert!(parse_manifest(text, &AudioSettings::default()).is_err());
    }
}
