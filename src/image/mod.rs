//! Image attachment handling
//!
//! Turns a user-selected photo into a base64 payload the model can consume
//! and a `data:` URL that can be previewed before submission.

pub mod encoder;
pub mod mime;

pub use encoder::{EncodedImage, ImageBlob, ImageEncoder};

/// Capability of the surrounding file picker to clear its current selection,
/// so the same file can be chosen again after removal.
pub trait FileSelection: Send + Sync {
    fn reset(&self);
}
