//! Image generation module.

mod provider;
pub mod providers;
mod types;

pub use provider::{ImageProvider, ImageProviderExt};
pub use types::{GeneratedImage, GenerationMetadata, GenerationRequest, ImageFormat};
