//! Application orchestration for a styling session.
//!
//! One trigger runs the suggestion call and, once it succeeds, the image call.
//! The two calls have independent outcomes: a failed image leaves the
//! suggestion in place.

use crate::ai::{
    GeminiImageClient, GeminiSuggestionClient, ImageGenerationService, SuggestionService,
};
use crate::models::Config;
use crate::session::{GenerationPhase, GenerationToken, StyleSession};
use crate::weather::{Coordinates, FixedWeather, WeatherService};
use crate::{Error, Result};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{error, info, warn};

/// Coordinates the suggestion and image services for a session.
pub struct App {
    suggestions: Box<dyn SuggestionService>,
    images: Box<dyn ImageGenerationService>,
    weather: Box<dyn WeatherService>,
    generate_images: bool,
}

/// How one call to [`App::generate`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// This generation owns the session and stopped in the given phase.
    Settled(GenerationPhase),
    /// A newer trigger replaced this generation; its results were discarded.
    Superseded,
}

impl GenerationOutcome {
    pub fn phase(&self) -> Option<GenerationPhase> {
        match self {
            GenerationOutcome::Settled(phase) => Some(*phase),
            GenerationOutcome::Superseded => None,
        }
    }
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub suggestions: Box<dyn SuggestionService>,
    pub images: Box<dyn ImageGenerationService>,
    pub weather: Box<dyn WeatherService>,
}

fn lock(session: &Mutex<StyleSession>) -> MutexGuard<'_, StyleSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

impl App {
    /// Build an app from concrete service dependencies.
    ///
    /// This is primarily useful for integration tests and local harnesses that
    /// need to inject mocks.
    pub fn with_services(services: AppServices, generate_images: bool) -> Self {
        Self {
            suggestions: services.suggestions,
            images: services.images,
            weather: services.weather,
            generate_images,
        }
    }

    /// Construct an app backed by Gemini.
    pub fn from_config(config: &Config) -> Self {
        // Reuse one HTTP connection pool across provider clients.
        let http_client = reqwest::Client::new();

        info!("Suggestion model: {}", config.text_model);
        let mut suggestions = GeminiSuggestionClient::new_with_client(
            config.gemini_api_key.clone(),
            config.text_model.clone(),
            http_client.clone(),
        );

        info!("Image model: {}", config.image_model);
        let mut images = GeminiImageClient::new_with_client(
            config.gemini_api_key.clone(),
            config.image_model.clone(),
            http_client,
        );

        if let Some(base_url) = &config.gemini_base_url {
            info!("Using Gemini base URL {}", base_url);
            suggestions = suggestions.with_base_url(base_url.clone());
            images = images.with_base_url(base_url.clone());
        }

        Self::with_services(
            AppServices {
                suggestions: Box::new(suggestions),
                images: Box::new(images),
                weather: Box::new(FixedWeather::default()),
            },
            config.generate_images,
        )
    }

    /// Replace the session weather with the collaborator's reading.
    pub async fn use_location(
        &self,
        session: &Mutex<StyleSession>,
        coords: Coordinates,
    ) -> Result<String> {
        let weather = self.weather.fetch_weather(coords).await?;
        info!("Weather for {}: {}", coords, weather);
        lock(session).set_weather(weather.clone());
        Ok(weather)
    }

    /// Run one generation for `occasion`.
    ///
    /// Remote failures are absorbed into the session state. The only errors
    /// returned are for triggers the session refuses. When a newer trigger
    /// takes over the session before this one finishes, the result is
    /// [`GenerationOutcome::Superseded`] and nothing from this run is applied.
    pub async fn generate(
        &self,
        session: &Mutex<StyleSession>,
        occasion: &str,
    ) -> Result<GenerationOutcome> {
        let (token, weather) = {
            let mut state = lock(session);
            let token = state.begin(occasion).ok_or(Error::GenerationInFlight)?;
            (token, state.weather().to_string())
        };

        info!(
            "[gen {}] Requesting suggestion for '{}' ({})",
            token.value(),
            occasion,
            weather
        );

        let suggestion = match self
            .suggestions
            .get_suggestion(occasion, Some(&weather))
            .await
        {
            Ok(suggestion) => suggestion,
            Err(e) => {
                error!("[gen {}] Suggestion failed: {}", token.value(), e.detail());
                let mut state = lock(session);
                return Ok(settle(state.suggestion_failed(token), &state, token));
            }
        };

        {
            let mut state = lock(session);
            if !state.suggestion_succeeded(token, suggestion.clone()) {
                return Ok(settle(false, &state, token));
            }
            info!("[gen {}] Suggestion ready: {}", token.value(), suggestion.title);

            if !self.generate_images {
                return Ok(settle(true, &state, token));
            }
            if !state.image_started(token) {
                return Ok(settle(false, &state, token));
            }
        }

        let outcome = self.images.generate_image(&suggestion).await;

        let mut state = lock(session);
        let applied = match outcome {
            Ok(image) => {
                let applied = state.image_succeeded(token, image);
                if applied {
                    info!("[gen {}] Image ready", token.value());
                }
                applied
            }
            Err(e) => {
                warn!(
                    "[gen {}] Image generation failed, using placeholder: {}",
                    token.value(),
                    e
                );
                state.image_failed(token)
            }
        };
        Ok(settle(applied, &state, token))
    }

    /// Repeat the last generation with the current weather.
    pub async fn regenerate(&self, session: &Mutex<StyleSession>) -> Result<GenerationOutcome> {
        let occasion = lock(session)
            .occasion()
            .map(str::to_string)
            .ok_or(Error::NoOccasion)?;
        self.generate(session, &occasion).await
    }
}

fn settle(applied: bool, state: &StyleSession, token: GenerationToken) -> GenerationOutcome {
    if applied {
        GenerationOutcome::Settled(state.phase())
    } else {
        info!("[gen {}] Superseded by a newer generation", token.value());
        GenerationOutcome::Superseded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockImageGenerationClient, MockSuggestionClient};
    use crate::models::{GeneratedImage, OutfitItem, OutfitSuggestion};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn app(suggestions: MockSuggestionClient, images: MockImageGenerationClient) -> App {
        App::with_services(
            AppServices {
                suggestions: Box::new(suggestions),
                images: Box::new(images),
                weather: Box::new(FixedWeather::default()),
            },
            true,
        )
    }

    fn boardroom() -> OutfitSuggestion {
        OutfitSuggestion {
            title: "Boardroom Ready".to_string(),
            description: "...".to_string(),
            items: vec![OutfitItem {
                category: "Top".to_string(),
                name: "White Shirt".to_string(),
                reason: "...".to_string(),
            }],
            style_tips: vec!["Tip 1".to_string()],
        }
    }

    #[tokio::test]
    async fn test_generate_reaches_image_ready() {
        let image = GeneratedImage::from_base64("image/png", "AA==");
        let app = app(
            MockSuggestionClient::new().with_suggestion(boardroom()),
            MockImageGenerationClient::new().with_image_response(image.clone()),
        );
        let session = Mutex::new(StyleSession::new());

        let phase = app.generate(&session, "office").await.unwrap();
        assert_eq!(phase, GenerationOutcome::Settled(GenerationPhase::ImageReady));

        let state = session.lock().unwrap();
        assert_eq!(state.suggestion(), Some(&boardroom()));
        assert_eq!(state.image(), Some(&image));
        assert_eq!(state.error(), None);
    }

    #[tokio::test]
    async fn test_image_failure_is_not_fatal() {
        let app = app(
            MockSuggestionClient::new().with_suggestion(boardroom()),
            MockImageGenerationClient::new().failing(),
        );
        let session = Mutex::new(StyleSession::new());

        let phase = app.generate(&session, "office").await.unwrap();
        assert_eq!(phase, GenerationOutcome::Settled(GenerationPhase::ImageFailed));

        let state = session.lock().unwrap();
        assert_eq!(state.suggestion().unwrap().items[0].name, "White Shirt");
        assert_eq!(state.error(), None);
        assert_eq!(
            state.display_image().as_deref(),
            Some("https://picsum.photos/seed/office-style/800/1000")
        );
    }

    #[tokio::test]
    async fn test_suggestion_failure_skips_image() {
        let app = App::with_services(
            AppServices {
                suggestions: Box::new(MockSuggestionClient::new().failing()),
                images: Box::new(MockImageGenerationClient::new()),
                weather: Box::new(FixedWeather::default()),
            },
            true,
        );
        let session = Mutex::new(StyleSession::new());

        let phase = app.generate(&session, "party").await.unwrap();
        assert_eq!(phase, GenerationOutcome::Settled(GenerationPhase::SuggestionFailed));

        let state = session.lock().unwrap();
        assert_eq!(state.suggestion(), None);
        assert_eq!(state.error(), Some("Something went wrong. Please try again."));
    }

    #[tokio::test]
    async fn test_images_disabled_stops_at_suggestion() {
        let app = App::with_services(
            AppServices {
                suggestions: Box::new(MockSuggestionClient::new()),
                images: Box::new(MockImageGenerationClient::new().failing()),
                weather: Box::new(FixedWeather::default()),
            },
            false,
        );
        let session = Mutex::new(StyleSession::new());

        let phase = app.generate(&session, "casual").await.unwrap();
        assert_eq!(phase, GenerationOutcome::Settled(GenerationPhase::SuggestionReady));
    }

    #[tokio::test]
    async fn test_second_trigger_rejected_while_suggestion_loading() {
        let app = app(
            MockSuggestionClient::new().with_delay(Duration::from_millis(100)),
            MockImageGenerationClient::new(),
        );
        let session = Mutex::new(StyleSession::new());

        let (first, second) = tokio::join!(app.generate(&session, "office"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            app.generate(&session, "party").await
        });

        assert_eq!(
            first.unwrap(),
            GenerationOutcome::Settled(GenerationPhase::ImageReady)
        );
        assert!(matches!(second, Err(Error::GenerationInFlight)));
        assert_eq!(session.lock().unwrap().occasion(), Some("office"));
    }

    #[tokio::test]
    async fn test_stale_image_is_discarded_after_retrigger() {
        let slow_images = MockImageGenerationClient::new()
            .with_image_response(GeneratedImage::from_base64("image/png", "AA=="))
            .with_delay(Duration::from_millis(150));
        let app = Arc::new(app(MockSuggestionClient::new(), slow_images));
        let session = Arc::new(Mutex::new(StyleSession::new()));

        let first = {
            let app = Arc::clone(&app);
            let session = Arc::clone(&session);
            tokio::spawn(async move { app.generate(&session, "office").await })
        };

        // Wait until the first generation is in its image phase.
        for _ in 0..50 {
            if session.lock().unwrap().is_image_loading() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(session.lock().unwrap().can_trigger());

        let second = {
            let app = Arc::clone(&app);
            let session = Arc::clone(&session);
            tokio::spawn(async move { app.generate(&session, "date").await })
        };

        let first_phase = first.await.unwrap().unwrap();
        let second_phase = second.await.unwrap().unwrap();

        assert_eq!(first_phase, GenerationOutcome::Superseded);
        assert_eq!(first_phase.phase(), None);
        assert_eq!(
            second_phase,
            GenerationOutcome::Settled(GenerationPhase::ImageReady)
        );

        let state = session.lock().unwrap();
        assert_eq!(state.occasion(), Some("date"));
        assert!(state.suggestion().unwrap().title.contains("date"));
    }

    #[tokio::test]
    async fn test_regenerate_uses_last_occasion() {
        let suggestions = MockSuggestionClient::new();
        let app = app(suggestions, MockImageGenerationClient::new());
        let session = Mutex::new(StyleSession::new());

        assert!(matches!(
            app.regenerate(&session).await,
            Err(Error::NoOccasion)
        ));

        app.generate(&session, "party").await.unwrap();
        let phase = app.regenerate(&session).await.unwrap();
        assert_eq!(phase, GenerationOutcome::Settled(GenerationPhase::ImageReady));
        assert_eq!(session.lock().unwrap().occasion(), Some("party"));
    }

    #[tokio::test]
    async fn test_use_location_updates_weather() {
        let app = app(MockSuggestionClient::new(), MockImageGenerationClient::new());
        let session = Mutex::new(StyleSession::new());

        let coords = Coordinates::new(48.85, 2.35).unwrap();
        let weather = app.use_location(&session, coords).await.unwrap();
        assert_eq!(weather, "Breezy, 18°C (Detected)");

        app.generate(&session, "casual").await.unwrap();
        let state = session.lock().unwrap();
        assert!(state
            .suggestion()
            .unwrap()
            .description
            .contains("Breezy, 18°C (Detected)"));
    }
}
