//! Video generation providers.

#[cfg(feature = "google")]
pub mod google;
#[cfg(feature = "replicate")]
pub mod replicate;

#[cfg(feature = "google")]
pub use google::{GoogleVideoClient, GoogleVideoClientBuilder};

#[cfg(feature = "replicate")]
pub use replicate::{
    HttpPredictionRunner, OutputItem, PredictionRunner, ReplicateOutput, ReplicateVideoClient,
    ReplicateVideoClientBuilder,
};
