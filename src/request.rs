//! Request construction
//!
//! A submission becomes an ordered list of content parts: the user's
//! ingredient text, then the attached image, then the fixed recipe
//! instruction. The endpoint relies on that order.

use crate::image::EncodedImage;
use crate::prompts;

/// One unit of a multi-part request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    InlineMedia { mime_type: String, data: String },
}

/// A single model call: which model, and what to send it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub model: String,
    pub parts: Vec<ContentPart>,
}

impl Request {
    pub fn new(model: impl Into<String>, parts: Vec<ContentPart>) -> Self {
        Self {
            model: model.into(),
            parts,
        }
    }
}

/// Build the parts for one submission. Never fails and performs no I/O.
pub fn build_parts(free_text: &str, image: Option<&EncodedImage>) -> Vec<ContentPart> {
    let mut parts = Vec::with_capacity(3);

    let ingredients = free_text.trim();
    if !ingredients.is_empty() {
        parts.push(ContentPart::Text(prompts::render(
            prompts::INGREDIENTS,
            &[("ingredients", ingredients)],
        )));
    }

    if let Some(image) = image {
        parts.push(ContentPart::InlineMedia {
            mime_type: image.mime_type.clone(),
            data: image.payload.clone(),
        });
    }

    parts.push(ContentPart::Text(prompts::recipe_instruction()));
    parts
}
