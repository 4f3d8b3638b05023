//! Provider table and client factory.

use crate::client::{ClientOptions, VideoClient};
use crate::config::Settings;
use crate::error::{Result, VideoGenError};
use crate::types::Provider;

/// Constructs a boxed client from settings and constructor options.
pub type ClientConstructor = fn(&Settings, ClientOptions) -> Result<Box<dyn VideoClient>>;

/// Looks up the constructor wired for `provider`.
///
/// Vendor modules are compiled in per cargo feature, so a provider whose
/// feature is off has no entry.
pub fn constructor_for(provider: Provider) -> Option<ClientConstructor> {
    match provider {
        #[cfg(feature = "replicate")]
        Provider::Replicate => Some(crate::providers::replicate::construct as ClientConstructor),
        #[cfg(feature = "google")]
        Provider::Google => Some(crate::providers::google::construct as ClientConstructor),
        _ => None,
    }
}

/// Providers wired for video generation, in table order.
pub fn supported_providers() -> Vec<Provider> {
    Provider::ALL
        .into_iter()
        .filter(|p| constructor_for(*p).is_some())
        .collect()
}

pub(crate) fn supported_provider_names() -> Vec<String> {
    supported_providers()
        .into_iter()
        .map(|p| p.as_str().to_string())
        .collect()
}

/// Anything the factory accepts as a provider identifier.
pub trait IntoProvider {
    /// Resolves to a known provider.
    fn into_provider(self) -> Result<Provider>;
}

impl IntoProvider for Provider {
    fn into_provider(self) -> Result<Provider> {
        Ok(self)
    }
}

impl IntoProvider for &str {
    fn into_provider(self) -> Result<Provider> {
        self.parse()
    }
}

impl IntoProvider for String {
    fn into_provider(self) -> Result<Provider> {
        self.parse()
    }
}

impl IntoProvider for &String {
    fn into_provider(self) -> Result<Provider> {
        self.parse()
    }
}

/// Creates a video client for `provider`, reading credentials from the environment.
///
/// ```no_run
/// use vidforge::{create_video_client, ClientOptions, GenerationOptions};
///
/// #[tokio::main]
/// async fn main() -> vidforge::Result<()> {
///     let client = create_video_client(
///         "replicate",
///         ClientOptions::new().model("bytedance/seedance-1-lite"),
///     )?;
///     let response = client
///         .generate_content("a cat", GenerationOptions::new().with_duration(5))
///         .await?;
///     for video in response.content() {
///         println!("{:?}", video.url);
///     }
///     Ok(())
/// }
/// ```
pub fn create_video_client(
    provider: impl IntoProvider,
    options: ClientOptions,
) -> Result<Box<dyn VideoClient>> {
    create_video_client_with_settings(provider, &Settings::from_env(), options)
}

/// Creates a video client for `provider` using explicit settings.
pub fn create_video_client_with_settings(
    provider: impl IntoProvider,
    settings: &Settings,
    options: ClientOptions,
) -> Result<Box<dyn VideoClient>> {
    let provider = provider.into_provider()?;
    let construct = constructor_for(provider).ok_or_else(|| VideoGenError::UnsupportedProvider {
        provider: provider.as_str().to_string(),
        supported: supported_provider_names(),
    })?;

    settings.validate_for_provider(provider.as_str())?;

    tracing::debug!(%provider, model = ?options.model, "constructing video client");
    construct(settings, options)
}
