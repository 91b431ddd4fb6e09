//! Per-user view model for one styling session.
//!
//! All mutation goes through the named transitions below. Each generation is
//! tagged with a [`GenerationToken`]; a transition carrying a token older than
//! the latest trigger is ignored, so a slow response from an earlier request
//! can never overwrite a newer one.

use crate::models::{placeholder_image_url, GeneratedImage, OutfitSuggestion, DEFAULT_WEATHER};

/// Message shown to the user when the suggestion phase fails.
pub const USER_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationPhase {
    Idle,
    SuggestionLoading,
    SuggestionReady,
    SuggestionFailed,
    ImageLoading,
    ImageReady,
    ImageFailed,
}

/// Identifies one trigger. Only the most recent token may mutate the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenerationToken(u64);

impl GenerationToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct StyleSession {
    phase: GenerationPhase,
    occasion: Option<String>,
    weather: String,
    suggestion: Option<OutfitSuggestion>,
    image: Option<GeneratedImage>,
    error: Option<String>,
    latest: u64,
}

impl Default for StyleSession {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleSession {
    pub fn new() -> Self {
        Self::with_weather(DEFAULT_WEATHER)
    }

    pub fn with_weather(weather: impl Into<String>) -> Self {
        Self {
            phase: GenerationPhase::Idle,
            occasion: None,
            weather: weather.into(),
            suggestion: None,
            image: None,
            error: None,
            latest: 0,
        }
    }

    pub fn phase(&self) -> GenerationPhase {
        self.phase
    }

    pub fn occasion(&self) -> Option<&str> {
        self.occasion.as_deref()
    }

    pub fn weather(&self) -> &str {
        &self.weather
    }

    pub fn set_weather(&mut self, weather: impl Into<String>) {
        self.weather = weather.into();
    }

    pub fn suggestion(&self) -> Option<&OutfitSuggestion> {
        self.suggestion.as_ref()
    }

    pub fn image(&self) -> Option<&GeneratedImage> {
        self.image.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.phase == GenerationPhase::SuggestionLoading
    }

    pub fn is_image_loading(&self) -> bool {
        self.phase == GenerationPhase::ImageLoading
    }

    /// Triggers are disabled only while a suggestion is loading.
    pub fn can_trigger(&self) -> bool {
        !self.is_loading()
    }

    pub fn is_current(&self, token: GenerationToken) -> bool {
        token.0 == self.latest
    }

    /// The generated image, or the occasion placeholder once a suggestion is
    /// shown without one.
    pub fn display_image(&self) -> Option<String> {
        if let Some(image) = &self.image {
            return Some(image.data_uri().to_string());
        }
        match (&self.suggestion, &self.occasion) {
            (Some(_), Some(occasion)) if !self.is_image_loading() => {
                Some(placeholder_image_url(occasion))
            }
            _ => None,
        }
    }

    /// Start a generation. Returns `None` while a suggestion is loading.
    ///
    /// The previous suggestion stays visible until the new one arrives.
    pub fn begin(&mut self, occasion: &str) -> Option<GenerationToken> {
        if !self.can_trigger() {
            return None;
        }

        self.latest += 1;
        self.occasion = Some(occasion.to_string());
        self.image = None;
        self.error = None;
        self.phase = GenerationPhase::SuggestionLoading;
        Some(GenerationToken(self.latest))
    }

    pub fn suggestion_succeeded(
        &mut self,
        token: GenerationToken,
        suggestion: OutfitSuggestion,
    ) -> bool {
        if !self.accepts(token, &[GenerationPhase::SuggestionLoading]) {
            return false;
        }
        self.suggestion = Some(suggestion);
        self.phase = GenerationPhase::SuggestionReady;
        true
    }

    pub fn suggestion_failed(&mut self, token: GenerationToken) -> bool {
        if !self.accepts(token, &[GenerationPhase::SuggestionLoading]) {
            return false;
        }
        self.suggestion = None;
        self.image = None;
        self.error = Some(USER_ERROR_MESSAGE.to_string());
        self.phase = GenerationPhase::SuggestionFailed;
        true
    }

    pub fn image_started(&mut self, token: GenerationToken) -> bool {
        if !self.accepts(token, &[GenerationPhase::SuggestionReady]) {
            return false;
        }
        self.phase = GenerationPhase::ImageLoading;
        true
    }

    pub fn image_succeeded(&mut self, token: GenerationToken, image: GeneratedImage) -> bool {
        if !self.accepts(token, &[GenerationPhase::ImageLoading]) {
            return false;
        }
        self.image = Some(image);
        self.phase = GenerationPhase::ImageReady;
        true
    }

    /// The suggestion stays; the caller falls back to the placeholder.
    pub fn image_failed(&mut self, token: GenerationToken) -> bool {
        if !self.accepts(token, &[GenerationPhase::ImageLoading]) {
            return false;
        }
        self.image = None;
        self.phase = GenerationPhase::ImageFailed;
        true
    }

    fn accepts(&self, token: GenerationToken, from: &[GenerationPhase]) -> bool {
        if !self.is_current(token) {
            tracing::debug!(
                "Discarding stale update for generation {} (latest is {})",
                token.0,
                self.latest
            );
            return false;
        }
        if !from.contains(&self.phase) {
            tracing::warn!(
                "Ignoring transition for generation {} from phase {:?}",
                token.0,
                self.phase
            );
            return false;
        }
        true
    }
}
