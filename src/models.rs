//! Data models and structures
//!
//! Defines the outfit suggestion record returned by the text model, the
//! generated image payload, request inputs, and environment configuration.

use crate::{Error, Result};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Weather text pre-filled in the input before the user edits it.
pub const DEFAULT_WEATHER: &str = "Sunny, 22°C";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutfitItem {
    pub category: String,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutfitSuggestion {
    pub title: String,
    pub description: String,
    pub items: Vec<OutfitItem>,
    pub style_tips: Vec<String>,
}

impl OutfitSuggestion {
    /// Items flattened as `category: name`, comma separated.
    pub fn items_csv(&self) -> String {
        self.items
            .iter()
            .map(|i| format!("{}: {}", i.category, i.name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A generated picture held as a `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    data_uri: String,
    mime_type: String,
}

impl GeneratedImage {
    pub fn from_base64(mime_type: &str, data: &str) -> Self {
        Self {
            data_uri: format!("data:{};base64,{}", mime_type, data),
            mime_type: mime_type.to_string(),
        }
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The base64 payload after the `;base64,` marker.
    pub fn base64_data(&self) -> &str {
        self.data_uri
            .split_once(";base64,")
            .map(|(_, data)| data)
            .unwrap_or_default()
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        Ok(base64::engine::general_purpose::STANDARD.decode(self.base64_data())?)
    }

    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            _ => "png",
        }
    }
}

impl fmt::Display for GeneratedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data_uri)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRequest {
    pub occasion: String,
    pub weather: Option<String>,
}

impl SuggestionRequest {
    pub fn new(occasion: impl Into<String>, weather: Option<&str>) -> Self {
        Self {
            occasion: occasion.into(),
            weather: weather
                .filter(|w| !w.trim().is_empty())
                .map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occasion {
    Casual,
    Office,
    Party,
    Date,
}

impl Occasion {
    pub const ALL: [Occasion; 4] = [
        Occasion::Casual,
        Occasion::Office,
        Occasion::Party,
        Occasion::Date,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Occasion::Casual => "casual",
            Occasion::Office => "office",
            Occasion::Party => "party",
            Occasion::Date => "date",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Occasion::Casual => "Casual",
            Occasion::Office => "Office",
            Occasion::Party => "Party",
            Occasion::Date => "Date Night",
        }
    }
}

impl fmt::Display for Occasion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Occasion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Occasion::ALL
            .into_iter()
            .find(|o| o.id() == needle)
            .ok_or_else(|| {
                let ids: Vec<&str> = Occasion::ALL.iter().map(|o| o.id()).collect();
                format!("Unknown occasion '{}'. Expected one of: {}", s, ids.join(", "))
            })
    }
}

/// Image shown in place of a generated one.
pub fn placeholder_image_url(occasion: &str) -> String {
    format!("https://picsum.photos/seed/{}-style/800/1000", occasion)
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_base_url: Option<String>,
    pub text_model: String,
    pub image_model: String,
    pub generate_images: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let gemini_api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
        if gemini_api_key.is_empty() {
            tracing::warn!("GEMINI_API_KEY not set; requests will be unauthenticated");
        }

        let generate_images = match std::env::var("STYLEGENIE_GENERATE_IMAGES") {
            Ok(value) => parse_bool(&value).ok_or_else(|| {
                Error::Config(format!(
                    "STYLEGENIE_GENERATE_IMAGES must be a boolean, got '{}'",
                    value
                ))
            })?,
            Err(_) => true,
        };

        Ok(Self {
            gemini_api_key,
            gemini_base_url: std::env::var("GEMINI_BASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            text_model: std::env::var("STYLEGENIE_TEXT_MODEL")
                .unwrap_or_else(|_| DEFAULT_TEXT_MODEL.to_string()),
            image_model: std::env::var("STYLEGENIE_IMAGE_MODEL")
                .unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_string()),
            generate_images,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
