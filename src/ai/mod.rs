//! AI service integration for outfit suggestions and outfit images
//!
//! Provides the service traits used by the app plus the Gemini-backed
//! implementations and in-memory mocks.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::{GeminiImageClient, GeminiSuggestionClient};
pub use mock::{MockImageGenerationClient, MockSuggestionClient};

use crate::models::{GeneratedImage, OutfitSuggestion};
use crate::Result;
use async_trait::async_trait;

/// Produces a structured outfit recommendation.
///
/// Failures are reported as [`crate::Error::Generation`].
#[async_trait]
pub trait SuggestionService: Send + Sync {
    async fn get_suggestion(&self, occasion: &str, weather: Option<&str>)
        -> Result<OutfitSuggestion>;
}

/// Renders a picture of a finished suggestion.
///
/// Failures are reported as [`crate::Error::ImageGeneration`].
#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    async fn generate_image(&self, suggestion: &OutfitSuggestion) -> Result<GeneratedImage>;
}
