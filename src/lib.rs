#![warn(missing_docs)]
//! vidforge - provider-agnostic video generation.
//!
//! One factory resolves a provider identifier to a client; every client
//! returns the same [`AiResponse`] of [`VideoArtifact`]s no matter how the
//! vendor shaped its output.
//!
//! # Quick Start
//!
//! ```no_run
//! use vidforge::{create_video_client, ClientOptions, GenerationOptions};
//!
//! #[tokio::main]
//! async fn main() -> vidforge::Result<()> {
//!     let client = create_video_client(
//!         "replicate",
//!         ClientOptions::new().model("bytedance/seedance-1-lite"),
//!     )?;
//!     let response = client
//!         .generate_content(
//!             "A serene landscape with a waterfall at sunset, cinematic",
//!             GenerationOptions::new().with_duration(5).with_resolution("480p"),
//!         )
//!         .await?;
//!     for video in response.content() {
//!         println!("{:?}", video.url);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `replicate`: Replicate hosted models (blocking HTTP run on a worker thread)
//! - `google`: Veo via the Gemini API (long-running operation polling)
//! - `cli`: Command-line interface
//!
//! `replicate` and `google` are on by default.

mod client;
mod config;
mod error;
mod registry;
mod types;

pub mod providers;

pub use client::{ClientOptions, VideoClient};
pub use config::{Settings, GEMINI_API_KEY_ENV, GOOGLE_API_KEY_ENV, REPLICATE_API_TOKEN_ENV};
pub use error::{Result, VendorError, VideoGenError};
pub use registry::{
    constructor_for, create_video_client, create_video_client_with_settings, supported_providers,
    ClientConstructor, IntoProvider,
};
pub use types::{AiResponse, GenerationOptions, ImageArtifact, Provider, VideoArtifact};

#[cfg(feature = "google")]
pub use providers::{GoogleVideoClient, GoogleVideoClientBuilder};

#[cfg(feature = "replicate")]
pub use providers::{ReplicateVideoClient, ReplicateVideoClientBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::client::{ClientOptions, VideoClient};
    pub use crate::error::{Result, VideoGenError};
    pub use crate::registry::create_video_client;
    pub use crate::types::{AiResponse, GenerationOptions, ImageArtifact, Provider, VideoArtifact};
}
