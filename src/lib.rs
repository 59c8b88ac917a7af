//! PinPro - AI-assisted Pinterest pin generation.
//!
//! Generates a base image with Gemini, then composites a stacked headline
//! overlay on top and exports the pin as PNG.
//!
//! # Quick Start
//!
//! ```no_run
//! use pinpro::{GeminiProvider, ImageQuality, PinStudio};
//!
//! #[tokio::main]
//! async fn main() -> pinpro::Result<()> {
//!     let provider = GeminiProvider::builder().build();
//!     let mut studio = PinStudio::default();
//!     studio.set_prompt("Cozy autumn reading nook with warm lamp light");
//!     studio.set_quality(ImageQuality::Standard);
//!     studio.set_overlay_text("Fall reading list");
//!
//!     studio.generate(&provider).await;
//!     if let Some(error) = studio.error() {
//!         eprintln!("{}", error.message);
//!     }
//!     studio.export(".")?;
//!     Ok(())
//! }
//! ```
//!
//! # Prompt Assistant
//!
//! ```no_run
//! use pinpro::{parse_suggestions, GeminiTextProvider, PromptAssistant};
//!
//! #[tokio::main]
//! async fn main() -> pinpro::Result<()> {
//!     let assistant = PromptAssistant::new(GeminiTextProvider::builder().build());
//!     let text = assistant.suggest_prompts("handmade candles").await?;
//!     for prompt in parse_suggestions(&text) {
//!         println!("{prompt}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `cli` (default): the `pinpro` command-line tool

pub mod assistant;
pub mod catalog;
pub mod compose;
pub mod config;
mod error;
pub mod gate;
mod gemini;
pub mod handoff;
pub mod image;
pub mod workflow;

// Re-export error types at crate root
pub use error::{PinProError, Result};

pub use assistant::{
    parse_suggestions, GeminiTextProvider, GeminiTextProviderBuilder, PinMarketingIdea,
    PromptAssistant, TextProvider,
};
pub use catalog::{AspectRatio, CreativeStyle, ImageQuality, Resolution, ResolutionSpec};
pub use compose::{Color, Compositor, OverlaySpec};
pub use config::{Plan, StudioConfig, UserProfile};
pub use gate::{ApiKeyGate, KeyEnvironment, KeySlot};
pub use handoff::HandoffSlot;
pub use crate::image::providers::{GeminiModel, GeminiProvider, GeminiProviderBuilder};
pub use crate::image::{
    GeneratedImage, GenerationMetadata, GenerationRequest, ImageFormat, ImageProvider,
    ImageProviderExt,
};
pub use workflow::{Completion, FailureKind, GenerationOutcome, Phase, PinStudio, StudioError};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::catalog::{CreativeStyle, ImageQuality, Resolution};
    pub use crate::error::{PinProError, Result};
    pub use crate::image::{GeneratedImage, GenerationRequest, ImageProvider, ImageProviderExt};
    pub use crate::workflow::PinStudio;
}
