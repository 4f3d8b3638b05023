//! Core types shared by every video client.

use crate::error::{Result, VideoGenError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Known vendor identifiers.
///
/// Only some of these are wired for video generation; see
/// [`supported_providers`](crate::supported_providers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Replicate hosted models.
    Replicate,
    /// Google (Gemini API / Veo).
    Google,
    /// OpenAI.
    OpenAi,
    /// Anthropic.
    Anthropic,
    /// Mistral AI.
    Mistral,
    /// Hugging Face.
    HuggingFace,
    /// Stability AI.
    Stability,
}

impl Provider {
    /// Every known provider, wired or not.
    pub const ALL: [Provider; 7] = [
        Self::Replicate,
        Self::Google,
        Self::OpenAi,
        Self::Anthropic,
        Self::Mistral,
        Self::HuggingFace,
        Self::Stability,
    ];

    /// Returns the lowercase identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replicate => "replicate",
            Self::Google => "google",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Mistral => "mistral",
            Self::HuggingFace => "huggingface",
            Self::Stability => "stability",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = VideoGenError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == needle)
            .ok_or_else(|| VideoGenError::UnsupportedProvider {
                provider: s.to_string(),
                supported: crate::registry::supported_provider_names(),
            })
    }
}

/// A generated video: a remote URL, inline bytes, or both.
///
/// Vendors sometimes return nothing usable, so both fields may be `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoArtifact {
    /// Remote location of the video.
    pub url: Option<String>,
    /// Inline video bytes.
    #[serde(skip)]
    pub data: Option<Vec<u8>>,
    /// Vendor-specific extras (MIME type, etc.).
    pub metadata: Option<Map<String, Value>>,
}

impl VideoArtifact {
    /// Creates an artifact pointing at a remote URL.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Creates an artifact carrying inline bytes.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    /// Returns true if the vendor gave us a URL or bytes.
    pub fn has_content(&self) -> bool {
        self.url.is_some() || self.data.is_some()
    }

    /// Writes the inline bytes to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = self.data.as_ref().ok_or_else(|| {
            VideoGenError::InvalidInput("artifact has no inline data to save".into())
        })?;
        std::fs::write(path, data)?;
        Ok(())
    }
}

/// An image used to condition image-to-video generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageArtifact {
    /// Inline image bytes.
    pub data: Option<Vec<u8>>,
    /// Path to an image on disk.
    pub path: Option<PathBuf>,
}

impl ImageArtifact {
    /// Creates an image artifact from inline bytes.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data: Some(data),
            path: None,
        }
    }

    /// Creates an image artifact referencing a file on disk.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            data: None,
            path: Some(path.into()),
        }
    }
}

/// Uniform response envelope returned by every client.
///
/// Built once per call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiResponse<T> {
    content: T,
    provider: Provider,
    metadata: Map<String, Value>,
}

impl<T> AiResponse<T> {
    /// Creates a new response envelope.
    pub fn new(content: T, provider: Provider, metadata: Map<String, Value>) -> Self {
        Self {
            content,
            provider,
            metadata,
        }
    }

    /// Generated content.
    pub fn content(&self) -> &T {
        &self.content
    }

    /// Provider that produced the content.
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Response metadata (always carries `model`).
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Consumes the envelope, returning the content.
    pub fn into_content(self) -> T {
        self.content
    }
}

/// Per-call generation options.
///
/// Free-form entries are passed to the vendor without local validation;
/// the vendor rejects combinations it doesn't support.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    params: Map<String, Value>,
    image: Option<ImageArtifact>,
}

impl GenerationOptions {
    /// Creates an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an arbitrary vendor option.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Sets the desired video duration in seconds.
    pub fn with_duration(self, secs: u32) -> Self {
        self.with("duration", secs)
    }

    /// Sets the resolution (e.g. "480p", "720p").
    pub fn with_resolution(self, resolution: impl Into<String>) -> Self {
        self.with("resolution", resolution.into())
    }

    /// Sets the aspect ratio (e.g. "16:9").
    pub fn with_aspect_ratio(self, ratio: impl Into<String>) -> Self {
        self.with("aspect_ratio", ratio.into())
    }

    /// Sets a conditioning image.
    pub fn with_image(mut self, image: ImageArtifact) -> Self {
        self.image = Some(image);
        self
    }

    /// Free-form vendor options.
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Conditioning image, if any.
    pub fn image(&self) -> Option<&ImageArtifact> {
        self.image.as_ref()
    }

    pub(crate) fn into_parts(self) -> (Map<String, Value>, Option<ImageArtifact>) {
        (self.params, self.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_round_trips_through_str() {
        for p in Provider::ALL {
            assert_eq!(p.as_str().parse::<Provider>().unwrap(), p);
        }
        assert_eq!("  Google ".parse::<Provider>().unwrap(), Provider::Google);
    }

    #[test]
    fn test_unknown_provider_is_unsupported() {
        let err = "runway".parse::<Provider>().unwrap_err();
        assert!(matches!(err, VideoGenError::UnsupportedProvider { ref provider, .. } if provider == "runway"));
    }

    #[test]
    fn test_artifact_has_content() {
        assert!(VideoArtifact::from_url("http://a/b.mp4").has_content());
        assert!(VideoArtifact::from_bytes(vec![1, 2]).has_content());
        assert!(!VideoArtifact::default().has_content());
    }

    #[test]
    fn test_artifact_save_requires_data() {
        let dir = tempfile::tempdir().unwrap();
        let err = VideoArtifact::from_url("http://a/b.mp4")
            .save(dir.path().join("x.mp4"))
            .unwrap_err();
        assert!(matches!(err, VideoGenError::InvalidInput(_)));

        let path = dir.path().join("y.mp4");
        VideoArtifact::from_bytes(vec![0, 0, 0, 24]).save(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![0, 0, 0, 24]);
    }

    #[test]
    fn test_generation_options_builders() {
        let opts = GenerationOptions::new()
            .with_duration(5)
            .with_resolution("480p")
            .with_aspect_ratio("16:9")
            .with("seed", 42);
        assert_eq!(opts.params()["duration"], 5);
        assert_eq!(opts.params()["resolution"], "480p");
        assert_eq!(opts.params()["aspect_ratio"], "16:9");
        assert_eq!(opts.params()["seed"], 42);
        assert!(opts.image().is_none());
    }

    #[test]
    fn test_response_accessors() {
        let mut meta = Map::new();
        meta.insert("model".into(), "m".into());
        let resp = AiResponse::new(vec![VideoArtifact::from_url("http://x")], Provider::Google, meta);
        assert_eq!(resp.provider(), Provider::Google);
        assert_eq!(resp.metadata()["model"], "m");
        assert_eq!(resp.into_content().len(), 1);
    }
}
