//! Veo (Google) video generation provider.
//!
//! Generation is a long-running operation: submission returns a handle that
//! is polled on a fixed interval until the vendor marks it done.

use crate::client::{ClientOptions, VideoClient};
use crate::config::{Settings, GEMINI_API_KEY_ENV, GOOGLE_API_KEY_ENV};
use crate::error::{truncate_body, Result, VendorError, VideoGenError};
use crate::types::{AiResponse, GenerationOptions, ImageArtifact, Provider, VideoArtifact};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default base URL for the Gemini Developer API.
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used when none is given.
pub const DEFAULT_MODEL: &str = "veo-3.0-generate-preview";

/// Delay between operation status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Builder for [`GoogleVideoClient`].
#[derive(Debug, Clone)]
pub struct GoogleVideoClientBuilder {
    api_key: Option<String>,
    model: String,
    base_url: String,
    poll_interval: Duration,
    timeout: Option<Duration>,
    include_raw_response: bool,
}

impl Default for GoogleVideoClientBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_API_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            include_raw_response: false,
        }
    }
}

impl GoogleVideoClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GOOGLE_API_KEY`, then `GEMINI_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Veo model identifier.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the polling interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Bounds the total polling time. Unbounded by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Includes the completed operation JSON as `raw_response` in response metadata.
    pub fn include_raw_response(mut self, include: bool) -> Self {
        self.include_raw_response = include;
        self
    }

    /// Builds the client, resolving the API key.
    pub fn build(self) -> Result<GoogleVideoClient> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var(GOOGLE_API_KEY_ENV).ok())
            .or_else(|| std::env::var(GEMINI_API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                VideoGenError::Credential(format!(
                    "{GOOGLE_API_KEY_ENV} not set and no API key provided"
                ))
            })?;

        Ok(GoogleVideoClient {
            client: reqwest::Client::new(),
            api_key,
            model: self.model,
            base_url: self.base_url,
            poll_interval: self.poll_interval,
            timeout: self.timeout,
            include_raw_response: self.include_raw_response,
        })
    }
}

/// Veo video generation client.
pub struct GoogleVideoClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    poll_interval: Duration,
    timeout: Option<Duration>,
    include_raw_response: bool,
}

impl std::fmt::Debug for GoogleVideoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleVideoClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("poll_interval", &self.poll_interval)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl GoogleVideoClient {
    /// Creates a new [`GoogleVideoClientBuilder`].
    pub fn builder() -> GoogleVideoClientBuilder {
        GoogleVideoClientBuilder::new()
    }

    /// Polling interval in use.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Polling bound in use, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn submit(&self, request: &VeoRequest) -> Result<Operation> {
        let url = format!(
            "{}/v1beta/models/{}:predictLongRunning",
            self.base_url, self.model
        );
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;
        read_operation(response).await
    }

    async fn fetch_operation(&self, name: &str) -> Result<Operation> {
        let url = format!("{}/v1beta/{}", self.base_url, name);
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        read_operation(response).await
    }
}

async fn read_operation(response: reqwest::Response) -> Result<Operation> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(parse_error(status.as_u16(), &text).into());
    }
    let value: Value = response.json().await?;
    Operation::from_value(value)
}

fn parse_error(status: u16, text: &str) -> VendorError {
    let message = serde_json::from_str::<GoogleErrorBody>(text)
        .ok()
        .and_then(|b| b.error.message)
        .unwrap_or_else(|| truncate_body(text));
    VendorError::Api { status, message }
}

/// Polls `operation` every `interval` until it is done or reports an error.
///
/// `fetch` is handed the operation name and returns its refreshed state.
/// With no `timeout` this waits as long as the vendor takes.
pub(crate) async fn poll_until_done<F, Fut>(
    mut operation: Operation,
    interval: Duration,
    timeout: Option<Duration>,
    mut fetch: F,
) -> Result<Operation>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Operation>>,
{
    let start = tokio::time::Instant::now();
    while !operation.is_settled() {
        tracing::debug!(
            operation = %operation.name,
            elapsed_secs = start.elapsed().as_secs(),
            "polling Veo operation"
        );
        tokio::time::sleep(interval).await;
        operation = fetch(operation.name.clone()).await?;

        if let Some(limit) = timeout {
            if !operation.is_settled() && start.elapsed() >= limit {
                return Err(VideoGenError::Timeout(limit));
            }
        }
    }
    Ok(operation)
}

#[async_trait]
impl VideoClient for GoogleVideoClient {
    async fn generate_content(
        &self,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<AiResponse<Vec<VideoArtifact>>> {
        let (params, image) = options.into_parts();

        // Keeps any temporary file alive until the request has been sent.
        let prepared = image.as_ref().map(prepare_image).transpose()?;
        let media = prepared.as_ref().map(PreparedImage::to_media).transpose()?;
        let request = VeoRequest::new(prompt, media, params);

        let operation = self.submit(&request).await?;
        drop(prepared);
        tracing::debug!(operation = %operation.name, model = %self.model, "submitted Veo generation");

        let operation = poll_until_done(operation, self.poll_interval, self.timeout, move |name| async move {
            self.fetch_operation(&name).await
        })
        .await?;

        let raw = self.include_raw_response.then(|| operation.raw.clone());
        let artifacts = operation.into_artifacts()?;

        let mut metadata = Map::new();
        metadata.insert("model".into(), Value::String(self.model.clone()));
        if let Some(raw) = raw {
            metadata.insert("raw_response".into(), raw);
        }
        Ok(AiResponse::new(artifacts, Provider::Google, metadata))
    }

    fn provider(&self) -> Provider {
        Provider::Google
    }

    fn model(&self) -> &str {
        &self.model
    }
}

pub(crate) fn construct(settings: &Settings, options: ClientOptions) -> Result<Box<dyn VideoClient>> {
    let mut builder = GoogleVideoClient::builder();
    if let Some(model) = options.model {
        builder = builder.model(model);
    }
    if let Some(key) = &settings.google_api_key {
        builder = builder.api_key(key.clone());
    }
    Ok(Box::new(builder.build()?))
}

// ── Image conditioning ──────────────────────────────────────────────────────

/// Picks a file extension for raw image bytes by magic number.
///
/// PNG and WebP are recognized; anything else is assumed to be JPEG.
pub fn sniff_extension(data: &[u8]) -> &'static str {
    if data.starts_with(b"\x89PNG") {
        "png"
    } else if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        "webp"
    } else {
        "jpg"
    }
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// A conditioning image resolved to a file on disk.
#[derive(Debug)]
pub struct PreparedImage {
    path: PathBuf,
    _temp: Option<tempfile::NamedTempFile>,
}

impl PreparedImage {
    /// Path of the image file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the file was written by [`prepare_image`] and is
    /// removed when this value drops.
    pub fn is_temporary(&self) -> bool {
        self._temp.is_some()
    }

    fn to_media(&self) -> Result<VeoMediaData> {
        let bytes = std::fs::read(&self.path)?;
        let mime = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(mime_for_extension)
            .unwrap_or_else(|| {
                mime_for_extension(sniff_extension(&bytes)).unwrap_or("image/jpeg")
            });
        Ok(VeoMediaData {
            inline_data: VeoInlineData {
                mime_type: mime.to_string(),
                data: base64::engine::general_purpose::STANDARD.encode(&bytes),
            },
        })
    }
}

/// Resolves an [`ImageArtifact`] to a file the request can reference.
///
/// A path is used as-is. Inline bytes are written to a temporary file whose
/// extension comes from [`sniff_extension`].
pub fn prepare_image(image: &ImageArtifact) -> Result<PreparedImage> {
    if let Some(path) = &image.path {
        return Ok(PreparedImage {
            path: path.clone(),
            _temp: None,
        });
    }

    let data = image.data.as_ref().ok_or_else(|| {
        VideoGenError::InvalidInput("image artifact has neither a path nor data".into())
    })?;

    let suffix = format!(".{}", sniff_extension(data));
    let mut temp = tempfile::Builder::new()
        .prefix("vidforge-image-")
        .suffix(&suffix)
        .tempfile()?;
    std::io::Write::write_all(&mut temp, data)?;
    std::io::Write::flush(&mut temp)?;

    Ok(PreparedImage {
        path: temp.path().to_path_buf(),
        _temp: Some(temp),
    })
}

// ── Request wire format ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct VeoRequest {
    instances: Vec<VeoInstance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Map<String, Value>>,
}

impl VeoRequest {
    fn new(prompt: &str, image: Option<VeoMediaData>, params: Map<String, Value>) -> Self {
        let parameters: Map<String, Value> = params
            .into_iter()
            .map(|(k, v)| (parameter_key(&k), v))
            .collect();
        Self {
            instances: vec![VeoInstance {
                prompt: prompt.to_string(),
                image,
            }],
            parameters: (!parameters.is_empty()).then_some(parameters),
        }
    }
}

/// Maps caller option names onto the API's parameter names.
fn parameter_key(key: &str) -> String {
    match key {
        "duration" | "duration_seconds" => "durationSeconds",
        "aspect_ratio" => "aspectRatio",
        "negative_prompt" => "negativePrompt",
        "person_generation" => "personGeneration",
        "number_of_videos" => "numberOfVideos",
        "enhance_prompt" => "enhancePrompt",
        "generate_audio" => "generateAudio",
        other => other,
    }
    .to_string()
}

#[derive(Debug, Serialize)]
struct VeoInstance {
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<VeoMediaData>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoMediaData {
    inline_data: VeoInlineData,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoInlineData {
    mime_type: String,
    data: String,
}

// ── Operation ───────────────────────────────────────────────────────────────

/// A long-running operation handle plus the raw JSON it was parsed from.
#[derive(Debug, Clone)]
pub(crate) struct Operation {
    name: String,
    done: bool,
    error: Option<OperationError>,
    response: Option<OperationResult>,
    raw: Value,
}

impl Operation {
    fn from_value(raw: Value) -> Result<Self> {
        let wire = OperationWire::deserialize(&raw).map_err(|e| {
            VendorError::UnexpectedResponse(format!("invalid operation body: {e}"))
        })?;
        Ok(Self {
            name: wire.name,
            done: wire.done.unwrap_or(false),
            error: wire.error,
            response: wire.response,
            raw,
        })
    }

    fn is_settled(&self) -> bool {
        self.done || self.error.is_some()
    }

    /// Extracts the first generated video.
    fn into_artifacts(self) -> Result<Vec<VideoArtifact>> {
        if let Some(err) = self.error {
            return Err(VendorError::Operation(
                err.message.unwrap_or_else(|| "unknown error".into()),
            )
            .into());
        }

        let Some(result) = self.response else {
            tracing::warn!(operation = %self.name, "Veo operation completed without a response");
            return Ok(Vec::new());
        };

        let mut filtered_reasons = None;
        let mut first = None;
        if let Some(generated) = result.generate_video_response {
            if generated.rai_media_filtered_count.unwrap_or(0) > 0 {
                filtered_reasons = Some(generated.rai_media_filtered_reasons.unwrap_or_default());
            }
            first = generated
                .generated_samples
                .unwrap_or_default()
                .into_iter()
                .find_map(|s| s.video);
        }
        if first.is_none() {
            first = result.videos.unwrap_or_default().into_iter().next();
        }

        match first {
            Some(video) => Ok(vec![video.into_artifact()?]),
            None => {
                if let Some(reasons) = filtered_reasons {
                    let detail = if reasons.is_empty() {
                        "video was filtered by Veo safety filters".to_string()
                    } else {
                        reasons.join("; ")
                    };
                    return Err(VendorError::ContentBlocked(detail).into());
                }
                tracing::warn!(operation = %self.name, "Veo operation completed without generated videos");
                Ok(Vec::new())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct OperationWire {
    name: String,
    #[serde(default)]
    done: Option<bool>,
    #[serde(default)]
    response: Option<OperationResult>,
    #[serde(default)]
    error: Option<OperationError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResult {
    /// Gemini API layout.
    #[serde(default)]
    generate_video_response: Option<GenerateVideoResponse>,
    /// Vertex-style layout.
    #[serde(default)]
    videos: Option<Vec<GeneratedVideo>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Option<Vec<GeneratedSample>>,
    #[serde(default)]
    rai_media_filtered_count: Option<u32>,
    #[serde(default)]
    rai_media_filtered_reasons: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeneratedSample {
    #[serde(default)]
    video: Option<GeneratedVideo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedVideo {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    gcs_uri: Option<String>,
    #[serde(default, alias = "encodedVideo")]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
}

impl GeneratedVideo {
    fn into_artifact(self) -> Result<VideoArtifact> {
        let data = self
            .bytes_base64_encoded
            .map(|b64| {
                base64::engine::general_purpose::STANDARD
                    .decode(b64.as_bytes())
                    .map_err(|e| VendorError::Decode(format!("inline video data: {e}")))
            })
            .transpose()?;
        let metadata = self.mime_type.map(|mime| {
            let mut m = Map::new();
            m.insert("mime_type".into(), Value::String(mime));
            m
        });
        Ok(VideoArtifact {
            url: self.uri.or(self.gcs_uri),
            data,
            metadata,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct OperationError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    #[serde(default)]
    message: Option<String>,
}
