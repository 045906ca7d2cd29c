pub mod client;
pub mod recipe;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::GeminiHttpClient;
pub use recipe::GeminiRecipeClient;
