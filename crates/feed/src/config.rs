// ABOUTME: TOML configuration for feed regeneration: channel metadata, build options, and paths.
// ABOUTME: Relative paths in the file resolve against the directory holding the config.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::builder::{FeedBuilder, Options};
use crate::error::LoadError;
use crate::manifest::{load_url_map, AudioSettings};
use crate::models::{FeedMetadata, DEFAULT_MIME_TYPE};

/// Audio URL resolution settings (`[audio]`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AudioConfig {
    pub base_url: Option<String>,
    /// JSON file mapping audio filenames to hosted URLs.
    pub url_map: Option<PathBuf>,
    pub default_mime_type: Option<String>,
}

/// Input and output locations (`[paths]`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub manifest: PathBuf,
    pub output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("episodes.json"),
            output: PathBuf::from("feed.rss"),
        }
    }
}

/// Everything needed to regenerate a feed.
///
/// ```toml
/// [feed]
/// title = "Jaxon Strategy Feed"
/// link = "https://example.org/feed"
/// language = "en-us"
///
/// [build]
/// indent = 2
///
/// [audio]
/// base_url = "https://example.org/feed/audio"
/// url_map = "drive-urls.json"
///
/// [paths]
/// manifest = "episodes.json"
/// output = "feed.rss"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    pub feed: FeedMetadata,
    pub build: Options,
    pub audio: AudioConfig,
    pub paths: PathsConfig,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl FeedConfig {
    /// Reads a config file; relative paths inside it resolve against its directory.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_toml_str(&text, base_dir).map_err(|source| LoadError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(text: &str, base_dir: impl Into<PathBuf>) -> Result<Self, toml::de::Error> {
        let mut config: FeedConfig = toml::from_str(text)?;
        config.base_dir = base_dir.into();
        Ok(config)
    }

    /// Resolves `path` against the config directory unless it is absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.resolve(&self.paths.manifest)
    }

    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.paths.output)
    }

    /// Assembles audio settings, reading the URL map file when one is configured.
    pub fn audio_settings(&self) -> Result<AudioSettings, LoadError> {
        let url_map = match &self.audio.url_map {
            Some(path) => load_url_map(&self.resolve(path))?,
            None => Default::default(),
        };

        Ok(AudioSettings {
            base_url: self.audio.base_url.clone(),
            url_map,
            default_mime_type: self
                .audio
                .default_mime_type
                .clone()
                .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
        })
    }

    pub fn builder(&self) -> FeedBuilder {
        FeedBuilder::with_options(self.build.clone())
    }
}
