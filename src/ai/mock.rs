use super::{ImageGenerationService, SuggestionService};
use crate::error::NO_IMAGE_MESSAGE;
use crate::models::{GeneratedImage, OutfitItem, OutfitSuggestion, SuggestionRequest};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 1x1 PNG returned when no image response was queued.
pub const TINY_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAIAAACQd1PeAAAADElEQVR4nGP4z8AAAAMBAQDJ/pLvAAAAAElFTkSuQmCC";

pub struct MockSuggestionClient {
    responses: Arc<Mutex<Vec<OutfitSuggestion>>>,
    requests: Arc<Mutex<Vec<SuggestionRequest>>>,
    call_count: Arc<Mutex<usize>>,
    fail: bool,
    delay: Option<Duration>,
}

impl MockSuggestionClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            fail: false,
            delay: None,
        }
    }

    pub fn with_suggestion(self, suggestion: OutfitSuggestion) -> Self {
        self.responses.lock().unwrap().push(suggestion);
        self
    }

    /// Every call fails as an unparseable response would.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn requests(&self) -> Vec<SuggestionRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn default_suggestion(request: &SuggestionRequest) -> OutfitSuggestion {
        OutfitSuggestion {
            title: format!("Ready for {}", request.occasion),
            description: format!(
                "A dependable look for {} in {}",
                request.occasion,
                request.weather.as_deref().unwrap_or("any weather")
            ),
            items: vec![OutfitItem {
                category: "Top".to_string(),
                name: "White Shirt".to_string(),
                reason: "Goes with everything".to_string(),
            }],
            style_tips: vec!["Keep it simple".to_string()],
        }
    }
}

impl Default for MockSuggestionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SuggestionService for MockSuggestionClient {
    async fn get_suggestion(
        &self,
        occasion: &str,
        weather: Option<&str>,
    ) -> Result<OutfitSuggestion> {
        let request = SuggestionRequest::new(occasion, weather);
        let count = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            self.requests.lock().unwrap().push(request.clone());
            *count
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail {
            return Err(Error::Generation("Mock suggestion failure".to_string()));
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(Self::default_suggestion(&request))
        } else {
            let index = (count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}

pub struct MockImageGenerationClient {
    image_responses: Arc<Mutex<Vec<GeneratedImage>>>,
    call_count: Arc<Mutex<usize>>,
    fail: bool,
    delay: Option<Duration>,
}

impl MockImageGenerationClient {
    pub fn new() -> Self {
        Self {
            image_responses: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            fail: false,
            delay: None,
        }
    }

    pub fn with_image_response(self, response: GeneratedImage) -> Self {
        self.image_responses.lock().unwrap().push(response);
        self
    }

    /// Every call fails as an empty provider response would.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockImageGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerationService for MockImageGenerationClient {
    async fn generate_image(&self, _suggestion: &OutfitSuggestion) -> Result<GeneratedImage> {
        let count = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail {
            return Err(Error::ImageGeneration(NO_IMAGE_MESSAGE.to_string()));
        }

        let responses = self.image_responses.lock().unwrap();
        if responses.is_empty() {
            Ok(GeneratedImage::from_base64("image/png", TINY_PNG_BASE64))
        } else {
            let index = (count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}
