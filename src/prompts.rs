use crate::models::{OutfitSuggestion, SuggestionRequest};

pub const SUGGESTION: &str = include_str!("../data/prompts/suggestion.txt");
pub const OUTFIT_IMAGE: &str = include_str!("../data/prompts/outfit_image.txt");

/// Replace `{{key}}` placeholders in a template string.
///
/// The template is scanned once, left to right. Substituted values are copied
/// as-is and never scanned again; unknown placeholders are kept literally.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find("}}") else {
            rest = &rest[start..];
            break;
        };

        let key = &after[..end];
        match vars.iter().find(|(k, _)| *k == key) {
            Some((_, value)) => result.push_str(value),
            None => {
                result.push_str("{{");
                result.push_str(key);
                result.push_str("}}");
            }
        }
        rest = &after[end + 2..];
    }

    result.push_str(rest);
    result
}

/// Stylist prompt for the text model. The weather line is omitted when no
/// weather was given.
pub fn suggestion_prompt(request: &SuggestionRequest) -> String {
    let weather_line = request
        .weather
        .as_deref()
        .map(|w| format!("Weather: {}", w))
        .unwrap_or_default();

    render(
        SUGGESTION,
        &[
            ("weather_line", &weather_line),
            ("occasion", &request.occasion),
        ],
    )
}

/// Photography prompt for the image model.
pub fn image_prompt(suggestion: &OutfitSuggestion) -> String {
    render(
        OUTFIT_IMAGE,
        &[
            ("items", &suggestion.items_csv()),
            ("description", &suggestion.description),
        ],
    )
}
