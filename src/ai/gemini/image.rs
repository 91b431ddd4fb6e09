use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse, Part};
use crate::ai::mime::sniff_base64_image_mime;
use crate::ai::ImageGenerationService;
use crate::error::NO_IMAGE_MESSAGE;
use crate::models::{GeneratedImage, OutfitSuggestion};
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Portrait framing for full-length outfit shots.
pub const OUTFIT_ASPECT_RATIO: &str = "3:4";

#[derive(Debug, Serialize)]
struct ImageRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: ImageGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageGenerationConfig {
    response_modalities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
}

pub struct GeminiImageClient {
    http: GeminiHttpClient,
}

impl GeminiImageClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                model,
                Duration::from_secs(120),
                client,
            ),
        }
    }

    /// First inline payload of the first candidate, as a data URI.
    fn extract_image(response: &GenerateContentResponse) -> Option<GeneratedImage> {
        response.first_parts().iter().find_map(|p| match p {
            Part::InlineData { inline_data } => {
                let mime_type = if inline_data.mime_type.is_empty() {
                    sniff_base64_image_mime(&inline_data.data)
                } else {
                    inline_data.mime_type.as_str()
                };
                Some(GeneratedImage::from_base64(mime_type, &inline_data.data))
            }
            _ => None,
        })
    }
}

super::impl_with_gemini_base_url!(GeminiImageClient);

#[async_trait]
impl ImageGenerationService for GeminiImageClient {
    async fn generate_image(&self, suggestion: &OutfitSuggestion) -> Result<GeneratedImage> {
        let request = ImageRequest {
            contents: vec![Content {
                role: None,
                parts: vec![Part::Text {
                    text: prompts::image_prompt(suggestion),
                }],
            }],
            generation_config: ImageGenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
                image_config: Some(ImageConfig {
                    aspect_ratio: OUTFIT_ASPECT_RATIO.to_string(),
                }),
            },
        };

        let response: GenerateContentResponse = self
            .http
            .generate_content(&request)
            .await
            .map_err(|e| Error::ImageGeneration(e.to_string()))?;

        let image = Self::extract_image(&response).ok_or_else(|| {
            tracing::warn!(
                "Gemini returned no inline image (finish reason: {})",
                response.first_finish_reason().unwrap_or("none")
            );
            Error::ImageGeneration(NO_IMAGE_MESSAGE.to_string())
        })?;

        tracing::debug!("Gemini returned image with mime_type: {}", image.mime_type());
        Ok(image)
    }
}
