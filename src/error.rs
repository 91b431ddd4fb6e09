//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use thiserror::Error;

/// Message shown to the user when a suggestion cannot be produced.
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate suggestions. Please try again.";

/// Message carried by an image failure when the provider returned no image.
pub const NO_IMAGE_MESSAGE: &str = "No image generated";

#[derive(Error, Debug)]
pub enum Error {
    /// The text model call failed or returned content that is not a suggestion.
    /// The display is always the caller-facing retry message; the detail is kept
    /// for logs.
    #[error("{}", GENERATION_FAILED_MESSAGE)]
    Generation(String),

    #[error("Image generation error: {0}")]
    ImageGeneration(String),

    #[error("Gemini API error (status {status}): {body}")]
    Provider { status: u16, body: String },

    #[error("A suggestion is already being generated")]
    GenerationInFlight,

    #[error("No occasion has been selected yet")]
    NoOccasion,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl Error {
    /// Provider-side detail for logging, without the caller-facing wrapper.
    pub fn detail(&self) -> String {
        match self {
            Error::Generation(detail) => detail.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
