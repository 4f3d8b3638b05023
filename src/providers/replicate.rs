//! Replicate video generation provider.
//!
//! Replicate's run call blocks until the prediction settles, which can take
//! minutes for video models. The call runs on tokio's blocking pool via
//! [`tokio::task::spawn_blocking`]; the awaiting task only suspends until
//! the worker hands the output back.

use crate::client::{ClientOptions, VideoClient};
use crate::config::{Settings, REPLICATE_API_TOKEN_ENV};
use crate::error::{truncate_body, Result, VendorError, VideoGenError};
use crate::types::{AiResponse, GenerationOptions, Provider, VideoArtifact};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Default base URL for the Replicate API.
pub const REPLICATE_API_BASE_URL: &str = "https://api.replicate.com";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A blocking call that runs a model and returns its raw output.
///
/// Implementations are invoked on a blocking worker thread, never on the
/// async executor.
pub trait PredictionRunner: Send + Sync + 'static {
    /// Runs `model` with `input`, blocking until the prediction settles.
    fn run(&self, model: &str, input: Map<String, Value>) -> Result<Value>;
}

/// [`PredictionRunner`] backed by the Replicate HTTP API.
#[derive(Clone)]
pub struct HttpPredictionRunner {
    api_token: String,
    base_url: String,
    poll_interval: Duration,
}

impl std::fmt::Debug for HttpPredictionRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPredictionRunner")
            .field("base_url", &self.base_url)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl HttpPredictionRunner {
    /// Creates a runner against the public Replicate API.
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: REPLICATE_API_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Overrides the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the delay between status checks.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn create_request(&self, model: &str, input: Map<String, Value>) -> (String, CreatePrediction) {
        match ModelRef::parse(model) {
            ModelRef::Model { owner, name } => (
                format!("{}/v1/models/{owner}/{name}/predictions", self.base_url),
                CreatePrediction {
                    version: None,
                    input,
                },
            ),
            ModelRef::Version(version) => (
                format!("{}/v1/predictions", self.base_url),
                CreatePrediction {
                    version: Some(version.to_string()),
                    input,
                },
            ),
        }
    }

    fn poll_url(&self, prediction: &Prediction) -> String {
        prediction
            .urls
            .as_ref()
            .and_then(|u| u.get.clone())
            .unwrap_or_else(|| format!("{}/v1/predictions/{}", self.base_url, prediction.id))
    }
}

impl PredictionRunner for HttpPredictionRunner {
    fn run(&self, model: &str, input: Map<String, Value>) -> Result<Value> {
        // Built on the worker thread: a blocking client must not be created or
        // dropped inside the async executor. No total timeout, since `Prefer: wait`
        // holds the create request open longer than reqwest's 30s default.
        let client = reqwest::blocking::Client::builder().timeout(None).build()?;
        let (url, body) = self.create_request(model, input);

        let response = client
            .post(&url)
            .bearer_auth(&self.api_token)
            .header("Prefer", "wait")
            .json(&body)
            .send()?;
        let mut prediction: Prediction = read_json(response)?;
        tracing::debug!(id = %prediction.id, status = ?prediction.status, "created Replicate prediction");

        loop {
            match prediction.status {
                PredictionStatus::Succeeded => {
                    return Ok(prediction.output.unwrap_or(Value::Null));
                }
                PredictionStatus::Failed | PredictionStatus::Canceled => {
                    let message = match prediction.error {
                        Some(Value::String(s)) => s,
                        Some(other) if !other.is_null() => other.to_string(),
                        _ => format!("prediction {} ended as {:?}", prediction.id, prediction.status),
                    };
                    return Err(VendorError::Prediction(message).into());
                }
                _ => {}
            }

            std::thread::sleep(self.poll_interval);
            let response = client
                .get(self.poll_url(&prediction))
                .bearer_auth(&self.api_token)
                .send()?;
            prediction = read_json(response)?;
            tracing::debug!(id = %prediction.id, status = ?prediction.status, "polling Replicate prediction");
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::blocking::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().unwrap_or_default();
        let message = serde_json::from_str::<ReplicateErrorBody>(&text)
            .ok()
            .and_then(|b| b.detail.or(b.title))
            .unwrap_or_else(|| truncate_body(&text));
        return Err(VendorError::Api {
            status: status.as_u16(),
            message,
        }
        .into());
    }
    let text = response.text()?;
    serde_json::from_str(&text).map_err(|e| {
        VendorError::UnexpectedResponse(format!("invalid prediction body: {e}")).into()
    })
}

/// `owner/name[:version]` or a bare version id.
enum ModelRef<'a> {
    Model { owner: &'a str, name: &'a str },
    Version(&'a str),
}

impl<'a> ModelRef<'a> {
    fn parse(model: &'a str) -> Self {
        match model.split_once(':') {
            Some((_, version)) => Self::Version(version),
            None => match model.split_once('/') {
                Some((owner, name)) => Self::Model { owner, name },
                None => Self::Version(model),
            },
        }
    }
}

/// One item of model output, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputItem {
    /// A plain string (normally a delivery URL).
    Text(String),
    /// A file object carrying its delivery URL.
    File {
        /// Delivery URL of the file.
        url: String,
    },
    /// Anything else (numbers, nulls, objects without a URL).
    Unrecognized(Value),
}

impl From<Value> for OutputItem {
    fn from(value: Value) -> Self {
        if let Value::Object(map) = &value {
            if let Some(Value::String(url)) = map.get("url") {
                return Self::File { url: url.clone() };
            }
        }
        match value {
            Value::String(s) => Self::Text(s),
            other => Self::Unrecognized(other),
        }
    }
}

impl OutputItem {
    /// Returns the HTTP URL this item resolves to, if any.
    pub fn into_url(self) -> Option<String> {
        match self {
            Self::Text(s) | Self::File { url: s } if s.starts_with("http") => Some(s),
            other => {
                tracing::debug!(item = ?other, "dropping Replicate output item without an HTTP URL");
                None
            }
        }
    }
}

/// Model output: a single item or a list.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplicateOutput {
    /// A single item.
    Single(OutputItem),
    /// A list of items.
    Many(Vec<OutputItem>),
}

impl From<Value> for ReplicateOutput {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Many(items.into_iter().map(OutputItem::from).collect()),
            other => Self::Single(OutputItem::from(other)),
        }
    }
}

impl ReplicateOutput {
    /// Keeps every item that resolves to an HTTP URL, as artifacts.
    pub fn into_artifacts(self) -> Vec<VideoArtifact> {
        let items = match self {
            Self::Single(item) => vec![item],
            Self::Many(items) => items,
        };
        items
            .into_iter()
            .filter_map(OutputItem::into_url)
            .map(VideoArtifact::from_url)
            .collect()
    }
}

/// Normalizes raw model output into artifacts.
pub fn normalize_output(output: Value) -> Vec<VideoArtifact> {
    ReplicateOutput::from(output).into_artifacts()
}

/// Builder for [`ReplicateVideoClient`].
#[derive(Clone)]
pub struct ReplicateVideoClientBuilder {
    model: Option<String>,
    api_token: Option<String>,
    base_url: String,
    poll_interval: Duration,
    runner: Option<Arc<dyn PredictionRunner>>,
}

impl Default for ReplicateVideoClientBuilder {
    fn default() -> Self {
        Self {
            model: None,
            api_token: None,
            base_url: REPLICATE_API_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            runner: None,
        }
    }
}

impl ReplicateVideoClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model (`owner/name` or `owner/name:version`). Required.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the API token. Falls back to `REPLICATE_API_TOKEN` env var.
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Overrides the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the delay between prediction status checks.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Replaces the HTTP runner. No token is needed when a runner is supplied.
    pub fn runner(mut self, runner: impl PredictionRunner) -> Self {
        self.runner = Some(Arc::new(runner));
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<ReplicateVideoClient> {
        let model = self
            .model
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| VideoGenError::InvalidInput("model is required for Replicate".into()))?;

        let runner = match self.runner {
            Some(runner) => runner,
            None => {
                let token = self
                    .api_token
                    .or_else(|| std::env::var(REPLICATE_API_TOKEN_ENV).ok())
                    .filter(|t| !t.trim().is_empty())
                    .ok_or_else(|| {
                        VideoGenError::Credential(format!(
                            "{REPLICATE_API_TOKEN_ENV} not set and no API token provided"
                        ))
                    })?;
                Arc::new(
                    HttpPredictionRunner::new(token)
                        .with_base_url(self.base_url)
                        .with_poll_interval(self.poll_interval),
                )
            }
        };

        Ok(ReplicateVideoClient { model, runner })
    }
}

/// Replicate video generation client.
pub struct ReplicateVideoClient {
    model: String,
    runner: Arc<dyn PredictionRunner>,
}

impl std::fmt::Debug for ReplicateVideoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicateVideoClient")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl ReplicateVideoClient {
    /// Creates a new [`ReplicateVideoClientBuilder`].
    pub fn builder() -> ReplicateVideoClientBuilder {
        ReplicateVideoClientBuilder::new()
    }
}

#[async_trait]
impl VideoClient for ReplicateVideoClient {
    async fn generate_content(
        &self,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<AiResponse<Vec<VideoArtifact>>> {
        let (params, image) = options.into_parts();
        if image.is_some() {
            tracing::warn!("Replicate ignores ImageArtifact options; pass an image URL as a named option");
        }

        let mut input = Map::new();
        input.insert("prompt".into(), Value::String(prompt.to_string()));
        input.extend(params);

        let runner = Arc::clone(&self.runner);
        let model = self.model.clone();
        tracing::debug!(model = %self.model, "running Replicate prediction on blocking worker");
        let output = tokio::task::spawn_blocking(move || runner.run(&model, input)).await??;

        let artifacts = normalize_output(output);
        if artifacts.is_empty() {
            tracing::warn!(model = %self.model, "Replicate returned no usable video URLs");
        }

        let mut metadata = Map::new();
        metadata.insert("model".into(), Value::String(self.model.clone()));
        Ok(AiResponse::new(artifacts, Provider::Replicate, metadata))
    }

    fn provider(&self) -> Provider {
        Provider::Replicate
    }

    fn model(&self) -> &str {
        &self.model
    }
}

pub(crate) fn construct(settings: &Settings, options: ClientOptions) -> Result<Box<dyn VideoClient>> {
    let mut builder = ReplicateVideoClient::builder();
    if let Some(model) = options.model {
        builder = builder.model(model);
    }
    if let Some(token) = &settings.replicate_api_token {
        builder = builder.api_token(token.clone());
    }
    Ok(Box::new(builder.build()?))
}

// ── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CreatePrediction {
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    input: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: PredictionStatus,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    #[serde(default)]
    get: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplicateErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    title: Option<String>,
}
