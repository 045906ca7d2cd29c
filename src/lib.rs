//! Recipe ideas from whatever is in the pantry
//!
//! Collects a free-text ingredient list and/or a photo, sends them to a
//! Gemini model as one multi-part request, and renders the suggested recipes
//! from the returned Markdown.

pub mod ai;
pub mod config;
pub mod controller;
pub mod error;
pub mod image;
pub mod models;
pub mod prompts;
pub mod render;
pub mod request;

pub use error::{Error, Result};
