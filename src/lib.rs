//! StyleGenie - outfit suggestions from a generative text model
//!
//! Turns an occasion and a weather description into a structured outfit
//! recommendation, then asks an image model for a picture of the look.

pub mod ai;
pub mod app;
pub mod error;
pub mod models;
pub mod prompts;
pub mod session;
pub mod weather;

pub use error::{Error, Result};
