use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse, Part};
use crate::ai::SuggestionService;
use crate::models::{OutfitSuggestion, SuggestionRequest};
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct SuggestionRequestBody {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: SuggestionGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionGenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

/// Output schema the model is constrained to. Mirrors [`OutfitSuggestion`].
pub fn outfit_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "description": { "type": "STRING" },
            "items": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "category": { "type": "STRING" },
                        "name": { "type": "STRING" },
                        "reason": { "type": "STRING" }
                    },
                    "required": ["category", "name", "reason"]
                }
            },
            "styleTips": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            }
        },
        "required": ["title", "description", "items", "styleTips"]
    })
}

pub struct GeminiSuggestionClient {
    http: GeminiHttpClient,
}

impl GeminiSuggestionClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                model,
                Duration::from_secs(30),
                client,
            ),
        }
    }

    /// Concatenated text parts of the first candidate.
    fn extract_text(response: &GenerateContentResponse) -> Option<String> {
        let text: String = response
            .first_parts()
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn parse_suggestion(text: &str) -> Result<OutfitSuggestion> {
        serde_json::from_str(text).map_err(|e| {
            tracing::error!("Failed to parse AI response: {}\nText: {}", e, text);
            Error::Generation(format!("Failed to parse AI response: {}", e))
        })
    }
}

super::impl_with_gemini_base_url!(GeminiSuggestionClient);

#[async_trait]
impl SuggestionService for GeminiSuggestionClient {
    async fn get_suggestion(
        &self,
        occasion: &str,
        weather: Option<&str>,
    ) -> Result<OutfitSuggestion> {
        let request = SuggestionRequest::new(occasion, weather);

        let body = SuggestionRequestBody {
            contents: vec![Content::user_text(prompts::suggestion_prompt(&request))],
            generation_config: SuggestionGenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: outfit_schema(),
            },
        };

        let response: GenerateContentResponse =
            self.http.generate_content(&body).await.map_err(|e| {
                tracing::error!("Suggestion request failed: {}", e);
                Error::Generation(e.to_string())
            })?;

        let text = Self::extract_text(&response).ok_or_else(|| {
            tracing::error!(
                "Failed to parse AI response: no text in Gemini response (finish reason: {})",
                response.first_finish_reason().unwrap_or("none")
            );
            Error::Generation("No text in Gemini response".to_string())
        })?;

        let suggestion = Self::parse_suggestion(&text)?;
        tracing::info!(
            "Received suggestion '{}' with {} items",
            suggestion.title,
            suggestion.items.len()
        );
        Ok(suggestion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gemini::test_support;
    use crate::error::GENERATION_FAILED_MESSAGE;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

    const BOARDROOM_JSON: &str = r#"{"title":"Boardroom Ready","description":"...","items":[{"category":"Top","name":"White Shirt","reason":"..."}],"styleTips":["Tip 1"]}"#;

    fn make_client(server: &MockServer, api_key: &str, model: &str) -> GeminiSuggestionClient {
        GeminiSuggestionClient::new(api_key.to_string(), model.to_string())
            .with_base_url(server.uri())
    }

    async fn mount_text(server: &MockServer, text: &str) {
        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(test_support::text_response(text)))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_office_scenario_end_to_end() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .and(body_string_contains("Occasion: office"))
            .and(body_string_contains("Weather: Sunny, 22°C"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(test_support::text_response(BOARDROOM_JSON)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key", DEFAULT_MODEL);
        let suggestion = client
            .get_suggestion("office", Some("Sunny, 22°C"))
            .await
            .unwrap();

        assert_eq!(suggestion.title, "Boardroom Ready");
        assert_eq!(suggestion.items[0].name, "White Shirt");
        assert_eq!(suggestion.style_tips, vec!["Tip 1".to_string()]);
    }

    #[tokio::test]
    async fn test_parsed_fields_match_json_exactly() {
        let server = MockServer::start().await;
        mount_text(&server, BOARDROOM_JSON).await;

        let client = make_client(&server, "test-key", DEFAULT_MODEL);
        let suggestion = client.get_suggestion("casual", None).await.unwrap();

        let expected: OutfitSuggestion = serde_json::from_str(BOARDROOM_JSON).unwrap();
        assert_eq!(suggestion, expected);
    }

    #[tokio::test]
    async fn test_request_declares_output_schema() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .and(body_partial_json(json!({
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": outfit_schema()
                }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(test_support::text_response(BOARDROOM_JSON)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key", DEFAULT_MODEL);
        client.get_suggestion("party", None).await.unwrap();
    }

    #[tokio::test]
    async fn test_identical_inputs_yield_equal_suggestions() {
        let server = MockServer::start().await;
        mount_text(&server, BOARDROOM_JSON).await;

        let client = make_client(&server, "test-key", DEFAULT_MODEL);
        let first = client.get_suggestion("office", Some("Rainy")).await.unwrap();
        let second = client.get_suggestion("office", Some("Rainy")).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_text_is_generation_error() {
        let server = MockServer::start().await;
        mount_text(&server, "").await;

        let client = make_client(&server, "test-key", DEFAULT_MODEL);
        let err = client.get_suggestion("office", None).await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
        assert_eq!(err.to_string(), GENERATION_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_truncated_json_is_generation_error() {
        let server = MockServer::start().await;
        mount_text(&server, r#"{"title":"Boardroom Ready","descrip"#).await;

        let client = make_client(&server, "test-key", DEFAULT_MODEL);
        let err = client.get_suggestion("office", None).await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }

    #[tokio::test]
    async fn test_wrong_shape_is_generation_error() {
        let server = MockServer::start().await;
        mount_text(&server, r#"{"title":"Only a title"}"#).await;

        let client = make_client(&server, "test-key", DEFAULT_MODEL);
        let err = client.get_suggestion("date", None).await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }

    #[tokio::test]
    async fn test_empty_candidates_is_generation_error() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key", DEFAULT_MODEL);
        let err = client.get_suggestion("office", None).await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }

    #[tokio::test]
    async fn test_blocked_candidate_is_generation_error() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "finishReason": "SAFETY" }]
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key", DEFAULT_MODEL);
        let err = client.get_suggestion("office", None).await.unwrap_err();
        assert_eq!(err.detail(), "No text in Gemini response");
    }

    #[tokio::test]
    async fn test_api_error_is_generation_error() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let client = make_client(&server, "bad-key", DEFAULT_MODEL);
        let err = client.get_suggestion("office", None).await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
        assert!(err.detail().contains("403"));
    }

    #[tokio::test]
    async fn test_split_text_parts_are_joined() {
        let server = MockServer::start().await;

        let (head, tail) = BOARDROOM_JSON.split_at(20);
        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": head }, { "text": tail }] }
                }]
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key", DEFAULT_MODEL);
        let suggestion = client.get_suggestion("office", None).await.unwrap();
        assert_eq!(suggestion.title, "Boardroom Ready");
    }

    #[tokio::test]
    async fn test_strips_models_prefix_from_model_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-3-flash-preview:generateContent"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(test_support::text_response(BOARDROOM_JSON)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key", "models/gemini-3-flash-preview");
        client.get_suggestion("office", None).await.unwrap();
    }
}
